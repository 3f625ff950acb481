use axum::{
    Json,
    body::Body,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};

use crate::error::Error;
use crate::metrics::GENERATIONS_TOTAL;
use crate::models::{GenerationJob, NovelRequest};
use crate::state::AppState;

/// Queues a generation and streams its progress back as NDJSON.
///
/// Requests that are invalid on their face are refused with 400 before
/// queueing. Membership of the model in the server's list is checked by the
/// worker and reported as a `failed` frame.
pub async fn generate_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NovelRequest>,
) -> Result<Response, Error> {
    GENERATIONS_TOTAL.inc();

    if payload.description.trim().is_empty() {
        warn!("rejected generation with an empty description");
        return Err(Error::EmptyDescription);
    }
    if payload.model.is_empty() {
        warn!("rejected generation without a model");
        return Err(Error::ModelNotSelected);
    }

    let (progress_tx, progress_rx) = mpsc::channel(32);
    debug!(model = %payload.model, stream = payload.stream, "queueing generation");

    let job = GenerationJob {
        request: payload,
        progress_tx,
        queued_at: Instant::now(),
    };
    state.job_tx.send(job).await.map_err(|_| Error::QueueClosed)?;

    let lines = ReceiverStream::new(progress_rx).map(|frame| {
        serde_json::to_string(&frame).map(|mut line| {
            line.push('\n');
            line
        })
    });

    Ok((
        [(header::CONTENT_TYPE, "application/x-ndjson")],
        Body::from_stream(lines),
    )
        .into_response())
}
