use async_stream::stream;
use futures::future::BoxFuture;
use futures::{Stream, StreamExt};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::generator::{FragmentStream, ModelClient};
use crate::models::{GenerateChunk, GenerateRequest, TagsResponse};

pub const DEFAULT_HOST: &str = "localhost";
pub const OLLAMA_PORT: u16 = 11434;
pub const CHECK_TIMEOUT: Duration = Duration::from_secs(5);

// Build the base url of an Ollama server, falling back to localhost
pub fn server_url(host: Option<&str>) -> String {
    let host = host.map(str::trim).filter(|h| !h.is_empty()).unwrap_or(DEFAULT_HOST);
    format!("http://{}:{}", host, OLLAMA_PORT)
}

// true only on a 200 from /api/version, never errors out
pub async fn check_server_availability(client: &reqwest::Client, base_url: &str) -> bool {
    let url = format!("{}/api/version", base_url);
    match client.get(&url).timeout(CHECK_TIMEOUT).send().await {
        Ok(res) => {
            let up = res.status() == reqwest::StatusCode::OK;
            debug!(%base_url, status = %res.status(), up, "availability check");
            up
        }
        Err(e) => {
            debug!(%base_url, error = ?e, "availability check failed");
            false
        }
    }
}

/// Lists installed models of the server at `base_url`.
///
/// Any failure (bad status, transport, bad JSON, unknown shape) is logged
/// and turns into an empty list.
pub async fn get_available_models(client: &reqwest::Client, base_url: &str) -> Vec<String> {
    let url = format!("{}/api/tags", base_url);
    let res = match client.get(&url).timeout(CHECK_TIMEOUT).send().await {
        Ok(res) => res,
        Err(e) => {
            warn!(%base_url, error = ?e, "failed to fetch model list");
            return Vec::new();
        }
    };

    if res.status() != reqwest::StatusCode::OK {
        warn!(%base_url, status = %res.status(), "model list request returned an error status");
        return Vec::new();
    }

    let body = match res.text().await {
        Ok(body) => body,
        Err(e) => {
            warn!(%base_url, error = ?e, "failed to read model list body");
            return Vec::new();
        }
    };

    match parse_model_names(&body) {
        Ok(models) => {
            debug!(%base_url, count = models.len(), "fetched model list");
            models
        }
        Err(e) => {
            warn!(%base_url, error = %e, "could not decode model list");
            Vec::new()
        }
    }
}

// Decode an /api/tags body.
// Invalid JSON -> Error::Json, JSON of the wrong shape -> Error::UnexpectedShape
pub fn parse_model_names(body: &str) -> Result<Vec<String>> {
    let value: serde_json::Value = serde_json::from_str(body)?;
    match serde_json::from_value::<TagsResponse>(value.clone()) {
        Ok(tags) => Ok(tags.into_names()),
        Err(_) => Err(Error::UnexpectedShape(value.to_string())),
    }
}

// one decoded NDJSON line
fn decode_line(line: &[u8]) -> Result<Option<GenerateChunk>> {
    let trimmed = line.trim_ascii();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let chunk: GenerateChunk = serde_json::from_slice(trimmed)?;
    if let Some(err) = chunk.error {
        return Err(Error::Upstream {
            status: 200,
            body: err,
        });
    }
    Ok(Some(chunk))
}

/// Turns a streamed `/api/generate` body into text fragments.
///
/// Lines may be split across chunks, so bytes are buffered until a newline.
/// The stream ends at the first `done: true` line or at the first error.
pub fn decode_ndjson<S, B, E>(body: S) -> FragmentStream
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Into<Error> + Send + 'static,
{
    Box::pin(stream! {
        let mut body = Box::pin(body);
        let mut buffer: Vec<u8> = Vec::new();
        let mut finished = false;

        'read: while let Some(chunk) = body.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    yield Err::<String, Error>(e.into());
                    finished = true;
                    break 'read;
                }
            };
            buffer.extend_from_slice(chunk.as_ref());

            while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = buffer.drain(..=pos).collect();
                match decode_line(&line) {
                    Ok(Some(chunk)) => {
                        if !chunk.response.is_empty() {
                            yield Ok(chunk.response);
                        }
                        if chunk.done {
                            finished = true;
                            break 'read;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => {
                        yield Err(e);
                        finished = true;
                        break 'read;
                    }
                }
            }
        }

        // last line without a trailing newline
        if !finished {
            match decode_line(&buffer) {
                Ok(Some(chunk)) if !chunk.response.is_empty() => {
                    yield Ok(chunk.response);
                }
                Ok(_) => {}
                Err(e) => {
                    yield Err(e);
                }
            }
        }
    })
}

// Model-serving client over the Ollama HTTP API
#[derive(Clone)]
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
}

impl OllamaClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    // no timeout here, generation can take minutes
    async fn post_generate(&self, model: &str, prompt: &str, stream: bool) -> Result<reqwest::Response> {
        let request = GenerateRequest {
            model: model.to_string(),
            prompt: prompt.to_string(),
            stream,
        };
        let res = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            return Err(Error::Upstream {
                status: status.as_u16(),
                body,
            });
        }
        Ok(res)
    }
}

impl ModelClient for OllamaClient {
    fn fragments(&self, model: &str, prompt: &str) -> FragmentStream {
        let this = self.clone();
        let model = model.to_string();
        let prompt = prompt.to_string();

        Box::pin(stream! {
            match this.post_generate(&model, &prompt, true).await {
                Ok(res) => {
                    let mut fragments = decode_ndjson(res.bytes_stream());
                    while let Some(fragment) = fragments.next().await {
                        yield fragment;
                    }
                }
                Err(e) => {
                    yield Err(e);
                }
            }
        })
    }

    fn complete(&self, model: &str, prompt: &str) -> BoxFuture<'static, Result<String>> {
        let this = self.clone();
        let model = model.to_string();
        let prompt = prompt.to_string();

        Box::pin(async move {
            let res = this.post_generate(&model, &prompt, false).await?;
            let chunk: GenerateChunk = res.json().await?;
            if let Some(err) = chunk.error {
                return Err(Error::Upstream {
                    status: 200,
                    body: err,
                });
            }
            Ok(chunk.response)
        })
    }
}
