mod health;
mod metrics;
mod models;
mod generate;

pub use health::health_handler;
pub use metrics::metrics_handler;
pub use models::{ModelsQuery, ModelsResponse, models_handler};
pub use generate::generate_handler;

use axum::{Json, http::StatusCode, response::{IntoResponse, Response}};

use crate::error::Error;

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match self.kind() {
            "validation" => StatusCode::BAD_REQUEST,
            "connection" | "transport" => StatusCode::BAD_GATEWAY,
            "internal" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(serde_json::json!({
            "error": self.to_string(),
            "kind": self.kind(),
        }));
        (status, body).into_response()
    }
}
