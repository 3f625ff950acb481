use axum::{Json, extract::{Query, State}};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::ollama::server_url;
use crate::state::AppState;

#[derive(Deserialize, Debug, Default)]
pub struct ModelsQuery {
    #[serde(default)]
    pub host: Option<String>,
    // set when the selected host changed
    #[serde(default)]
    pub refresh: bool,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ModelsResponse {
    pub endpoint: String,
    pub available: bool,
    pub models: Vec<String>,
}

// lists models of the requested server, empty when it is down
pub async fn models_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ModelsQuery>,
) -> Json<ModelsResponse> {
    let host = query
        .host
        .as_deref()
        .filter(|h| !h.trim().is_empty())
        .or(state.default_host.as_deref());
    let endpoint = server_url(host);

    if query.refresh {
        state.models.invalidate(&endpoint);
    }

    let listed = state.models.list_if_available(&state.client, &endpoint).await;

    Json(ModelsResponse {
        endpoint,
        available: listed.is_some(),
        models: listed.unwrap_or_default(),
    })
}
