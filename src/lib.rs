pub mod cache;
pub mod check;
pub mod config;
pub mod error;
pub mod generator;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod ollama;
pub mod prompt;
pub mod sink;
pub mod state;
pub mod worker;

use axum::{Router, routing::{get, post}};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

// all routes, shared by main and the integration tests
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/metrics", get(handlers::metrics_handler))
        .route("/api/models", get(handlers::models_handler))
        .route("/api/generate", post(handlers::generate_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
