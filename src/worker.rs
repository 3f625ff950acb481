use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::generator::NovelGenerator;
use crate::metrics::{GENERATION_FAILURES, GENERATION_LATENCY};
use crate::models::{GenerationJob, NovelRequest, Phase, Progress};
use crate::ollama::{OllamaClient, server_url};
use crate::state::AppState;

// Background worker -> runs generations from the queue one by one
pub async fn generation_worker(mut rx: mpsc::Receiver<GenerationJob>, state: Arc<AppState>) {
    info!("Generation worker started - processing requests sequentially");

    while let Some(job) = rx.recv().await {
        let queued_at = job.queued_at;
        let phase = run_job(&state, job).await;

        if phase != Some(Phase::Completed) {
            GENERATION_FAILURES.inc();
        }
        GENERATION_LATENCY.observe(queued_at.elapsed().as_secs_f64());
    }

    info!("Generation queue closed, worker exiting");
}

pub fn resolve_endpoint(state: &AppState, request: &NovelRequest) -> String {
    let host = request
        .host
        .as_deref()
        .filter(|h| !h.trim().is_empty())
        .or(state.default_host.as_deref());
    server_url(host)
}

// returns the phase of the last frame delivered, None if the client left early
async fn run_job(state: &AppState, job: GenerationJob) -> Option<Phase> {
    let GenerationJob {
        request,
        progress_tx,
        ..
    } = job;
    let endpoint = resolve_endpoint(state, &request);
    let model_client = Arc::new(OllamaClient::new(state.client.clone(), endpoint.clone()));

    let generator = match NovelGenerator::connect(
        &state.client,
        &state.models,
        &endpoint,
        model_client,
        state.sink.clone(),
    )
    .await
    {
        Ok(generator) => generator,
        Err(e) => {
            error!(error = ?e, %endpoint, "cannot reach Ollama server");
            return send_final(&progress_tx, Progress::failed(&e)).await;
        }
    };

    if !request.stream {
        let progress = match generator.generate(&request).await {
            Ok(progress) => progress,
            Err(e) => {
                error!(error = ?e, kind = e.kind(), model = %request.model, "generation failed");
                Progress::failed(&e)
            }
        };
        return send_final(&progress_tx, progress).await;
    }

    let mut frames = match generator.generate_stream(&request) {
        Ok(frames) => frames,
        Err(e) => {
            error!(error = ?e, kind = e.kind(), model = %request.model, "generation rejected");
            return send_final(&progress_tx, Progress::failed(&e)).await;
        }
    };

    let mut last = None;
    while let Some(frame) = frames.next().await {
        let phase = frame.phase;
        if progress_tx.send(frame).await.is_err() {
            // dropping `frames` closes the upstream response
            warn!(%endpoint, "client disconnected, cancelling generation");
            return None;
        }
        last = Some(phase);
    }
    last
}

async fn send_final(tx: &mpsc::Sender<Progress>, progress: Progress) -> Option<Phase> {
    let phase = progress.phase;
    tx.send(progress).await.ok().map(|_| phase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::NovelSink;
    use std::time::{Duration, Instant};

    #[tokio::test]
    async fn latency_includes_time_spent_queued() {
        let dir = tempfile::tempdir().unwrap();
        let (unused_tx, _unused_rx) = mpsc::channel(1);
        // nothing listens on this loopback alias, so the job fails fast
        let state = Arc::new(AppState::new(
            Some("127.0.0.9".to_string()),
            NovelSink::new(dir.path().join("novel.txt")),
            Duration::from_secs(30),
            unused_tx,
        ));
        let (job_tx, job_rx) = mpsc::channel(1);
        let worker = tokio::spawn(generation_worker(job_rx, state));

        let before = GENERATION_LATENCY.get_sample_sum();
        let (progress_tx, mut progress_rx) = mpsc::channel(4);
        let queued_at = Instant::now().checked_sub(Duration::from_secs(2)).unwrap();
        let request = NovelRequest {
            description: "plot".to_string(),
            model: "m1".to_string(),
            style: None,
            host: None,
            stream: true,
        };
        job_tx
            .send(GenerationJob {
                request,
                progress_tx,
                queued_at,
            })
            .await
            .unwrap();

        let frame = progress_rx.recv().await.unwrap();
        assert_eq!(frame.phase, Phase::Failed);

        drop(job_tx);
        worker.await.unwrap();
        assert!(GENERATION_LATENCY.get_sample_sum() - before >= 2.0);
    }
}
