use async_stream::stream;
use futures::future::BoxFuture;
use futures::{Stream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::cache::ModelCache;
use crate::error::{Error, Result};
use crate::metrics::FRAGMENTS_TOTAL;
use crate::models::{NovelRequest, Progress};
use crate::prompt::{build_prompt, clean_text};
use crate::sink::NovelSink;

pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;
pub type ProgressStream = Pin<Box<dyn Stream<Item = Progress> + Send>>;

/// The model-serving side of a generation.
///
/// `fragments` must not touch the network until the stream is polled.
pub trait ModelClient: Send + Sync {
    fn fragments(&self, model: &str, prompt: &str) -> FragmentStream;

    fn complete(&self, model: &str, prompt: &str) -> BoxFuture<'static, Result<String>>;
}

pub struct NovelGenerator {
    base_url: String,
    models: Vec<String>,
    client: Arc<dyn ModelClient>,
    sink: NovelSink,
}

impl NovelGenerator {
    pub fn new(
        base_url: impl Into<String>,
        models: Vec<String>,
        client: Arc<dyn ModelClient>,
        sink: NovelSink,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            models,
            client,
            sink,
        }
    }

    // fails with Error::Connection when the server does not answer the availability check
    pub async fn connect(
        http: &reqwest::Client,
        cache: &ModelCache,
        base_url: &str,
        client: Arc<dyn ModelClient>,
        sink: NovelSink,
    ) -> Result<Self> {
        let Some(models) = cache.list_if_available(http, base_url).await else {
            return Err(Error::Connection(base_url.to_string()));
        };
        debug!(%base_url, models = ?models, "generator connected");
        Ok(Self::new(base_url, models, client, sink))
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    fn validate(&self, model: &str) -> Result<()> {
        if model.is_empty() {
            return Err(Error::ModelNotSelected);
        }
        if !self.models.iter().any(|m| m == model) {
            return Err(Error::ModelUnavailable(model.to_string()));
        }
        Ok(())
    }

    /// Starts a streamed generation.
    ///
    /// Model validation happens here, before anything is sent upstream. The
    /// returned stream yields the growing text, and its last frame is either
    /// `completed` (after the sink wrote the text) or `failed`.
    pub fn generate_stream(&self, request: &NovelRequest) -> Result<ProgressStream> {
        self.validate(&request.model)?;
        let prompt = build_prompt(&request.description, request.style.as_deref());
        info!(base_url = %self.base_url, model = %request.model, "starting streamed generation");
        let fragments = self.client.fragments(&request.model, &prompt);
        Ok(accumulate(fragments, self.sink.clone()))
    }

    // one-shot generation: whole response, cleaned, then saved
    pub async fn generate(&self, request: &NovelRequest) -> Result<Progress> {
        self.validate(&request.model)?;
        let prompt = build_prompt(&request.description, request.style.as_deref());
        info!(base_url = %self.base_url, model = %request.model, "starting one-shot generation");
        let raw = self.client.complete(&request.model, &prompt).await?;
        let text = clean_text(&raw);
        let path = self.sink.save(&text).await?;
        Ok(Progress::completed(text, &path.display().to_string()))
    }
}

/// Folds fragments into progress frames.
///
/// One frame is held back so the last one can carry the completion status.
/// Dropping the returned stream drops `fragments`, which closes the upstream
/// response.
pub fn accumulate(fragments: FragmentStream, sink: NovelSink) -> ProgressStream {
    Box::pin(stream! {
        let mut fragments = fragments;
        let mut text = String::new();
        let mut pending: Option<Progress> = None;
        let mut failure: Option<Error> = None;

        while let Some(fragment) = fragments.next().await {
            match fragment {
                Ok(fragment) => {
                    FRAGMENTS_TOTAL.inc();
                    text.push_str(&fragment);
                    if let Some(prev) = pending.replace(Progress::generating(text.clone())) {
                        yield prev;
                    }
                }
                Err(e) => {
                    error!(error = ?e, received = text.len(), "generation failed mid-stream");
                    failure = Some(e);
                    break;
                }
            }
        }
        drop(fragments);

        if failure.is_none() {
            match sink.save(&text).await {
                Ok(path) => {
                    yield Progress::completed(text, &path.display().to_string());
                }
                Err(e) => {
                    error!(error = ?e, "failed to save generated novel");
                    failure = Some(e);
                }
            }
        }

        if let Some(e) = failure {
            if let Some(prev) = pending.take() {
                yield prev;
            }
            yield Progress::failed(&e);
        }
    })
}
