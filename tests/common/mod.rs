#![allow(dead_code)]

use axum::{
    Json, Router,
    body::Body,
    http::{StatusCode, header},
    routing::{get, post},
};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

// serve `app` on an ephemeral port, returns its base url
pub async fn spawn(app: Router) -> String {
    spawn_at("127.0.0.1:0", app).await
}

// serve `app` on a fixed address, e.g. a loopback alias on the Ollama port
pub async fn spawn_at(addr: &str, app: Router) -> String {
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

// base url of a port nobody listens on
pub fn closed_url() -> String {
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    format!("http://127.0.0.1:{}", port)
}

// request counters of a fake server
#[derive(Clone, Default)]
pub struct Hits {
    pub version: Arc<AtomicUsize>,
    pub tags: Arc<AtomicUsize>,
}

impl Hits {
    pub fn version(&self) -> usize {
        self.version.load(Ordering::SeqCst)
    }

    pub fn tags(&self) -> usize {
        self.tags.load(Ordering::SeqCst)
    }
}

pub fn fake_ollama(tags: &'static str, generate_body: &'static str) -> Router {
    counting_ollama(tags, generate_body, Hits::default())
}

/// Minimal stand-in for an Ollama server.
///
/// Streamed `/api/generate` requests get `generate_body` verbatim, one-shot
/// ones get a single `{response}` object with [`ONE_SHOT_RESPONSE`].
pub fn counting_ollama(tags: &'static str, generate_body: &'static str, hits: Hits) -> Router {
    let version_hits = hits.version.clone();
    let tags_hits = hits.tags.clone();
    Router::new()
        .route(
            "/api/version",
            get(move || async move {
                version_hits.fetch_add(1, Ordering::SeqCst);
                Json(json!({ "version": "0.5.7" }))
            }),
        )
        .route(
            "/api/tags",
            get(move || async move {
                tags_hits.fetch_add(1, Ordering::SeqCst);
                ([(header::CONTENT_TYPE, "application/json")], tags)
            }),
        )
        .route(
            "/api/generate",
            post(move |Json(body): Json<Value>| async move {
                if body["prompt"].as_str().is_none() {
                    return (StatusCode::BAD_REQUEST, "missing prompt".to_string());
                }
                if body["stream"] == json!(true) {
                    (StatusCode::OK, generate_body.to_string())
                } else {
                    let reply = json!({ "model": body["model"], "response": ONE_SHOT_RESPONSE, "done": true });
                    (StatusCode::OK, reply.to_string())
                }
            }),
        )
}

/// Fake server whose streamed generation emits `count` fragments, one every
/// `every`, so a client can hang up halfway.
pub fn slow_ollama(tags: &'static str, count: usize, every: Duration) -> Router {
    Router::new()
        .route(
            "/api/version",
            get(|| async { Json(json!({ "version": "0.5.7" })) }),
        )
        .route(
            "/api/tags",
            get(move || async move { ([(header::CONTENT_TYPE, "application/json")], tags) }),
        )
        .route(
            "/api/generate",
            post(move || async move {
                let lines = futures::stream::unfold(0usize, move |i| async move {
                    if i > count {
                        return None;
                    }
                    tokio::time::sleep(every).await;
                    let line = if i == count {
                        json!({ "response": "", "done": true })
                    } else {
                        json!({ "response": format!("w{} ", i), "done": false })
                    };
                    Some((Ok::<_, std::io::Error>(format!("{}\n", line)), i + 1))
                });
                Body::from_stream(lines)
            }),
        )
}

pub const TAGS: &str = r#"{"models":[{"name":"model1"},{"name":"model2"}]}"#;

pub const ONE_SHOT_RESPONSE: &str = "```text\n  Story  \n\n\n\nend\n```\n";

pub const THREE_PARTS: &str = concat!(
    "{\"model\":\"model1\",\"response\":\"Part 1\",\"done\":false}\n",
    "{\"model\":\"model1\",\"response\":\"Part 2\",\"done\":false}\n",
    "{\"model\":\"model1\",\"response\":\"Part 3\",\"done\":false}\n",
    "{\"model\":\"model1\",\"response\":\"\",\"done\":true}\n",
);

pub const FAILS_AFTER_ONE: &str = concat!(
    "{\"model\":\"model1\",\"response\":\"Part 1\",\"done\":false}\n",
    "{\"error\":\"Test error\"}\n",
);
