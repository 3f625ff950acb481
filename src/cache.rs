use dashmap::DashMap;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::metrics::MODEL_CACHE_SIZE;
use crate::ollama::{check_server_availability, get_available_models};

// Cache entry with timestamp
#[derive(Clone, Debug)]
pub struct CachedModels {
    pub models: Vec<String>,
    pub fetched_at: Instant,
}

// model lists per endpoint, dropped when the host changes or the ttl runs out
pub struct ModelCache {
    entries: DashMap<String, CachedModels>,
    ttl: Duration,
}

impl ModelCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn get(&self, endpoint: &str) -> Option<Vec<String>> {
        let entry = self.entries.get(endpoint)?;
        if entry.fetched_at.elapsed() < self.ttl {
            debug!(%endpoint, "model cache hit");
            return Some(entry.models.clone());
        }
        None
    }

    pub fn insert(&self, endpoint: &str, models: Vec<String>) {
        self.entries.insert(
            endpoint.to_string(),
            CachedModels {
                models,
                fetched_at: Instant::now(),
            },
        );
        MODEL_CACHE_SIZE.set(self.entries.len() as f64);
    }

    pub fn invalidate(&self, endpoint: &str) {
        if self.entries.remove(endpoint).is_some() {
            debug!(%endpoint, "model cache invalidated");
        }
        MODEL_CACHE_SIZE.set(self.entries.len() as f64);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // fetch and store, no availability check
    pub async fn refresh(&self, client: &reqwest::Client, endpoint: &str) -> Vec<String> {
        let models = get_available_models(client, endpoint).await;
        self.insert(endpoint, models.clone());
        models
    }

    // cached list, fetched on a miss; callers check the server first
    pub async fn models(&self, client: &reqwest::Client, endpoint: &str) -> Vec<String> {
        match self.get(endpoint) {
            Some(models) => models,
            None => self.refresh(client, endpoint).await,
        }
    }

    /// Checks `endpoint` once, then lists its models through the cache.
    ///
    /// `None` means the server is down; its entry is dropped.
    pub async fn list_if_available(
        &self,
        client: &reqwest::Client,
        endpoint: &str,
    ) -> Option<Vec<String>> {
        if !check_server_availability(client, endpoint).await {
            self.invalidate(endpoint);
            return None;
        }
        Some(self.models(client, endpoint).await)
    }
}
