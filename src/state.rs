use std::time::Duration;
use tokio::sync::mpsc;
use crate::cache::ModelCache;
use crate::models::GenerationJob;
use crate::sink::NovelSink;
// app's shared state

pub struct AppState {
    pub client: reqwest::Client,
    pub models: ModelCache,             // endpoint -> installed models
    pub default_host: Option<String>,   // used when a request names no host
    pub sink: NovelSink,
    pub job_tx: mpsc::Sender<GenerationJob>,
}

impl AppState {
    pub fn new(
        default_host: Option<String>,
        sink: NovelSink,
        cache_ttl: Duration,
        job_tx: mpsc::Sender<GenerationJob>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            models: ModelCache::new(cache_ttl),
            default_host: default_host.filter(|h| !h.trim().is_empty()),
            sink,
            job_tx,
        }
    }
}
