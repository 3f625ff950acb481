use serde::{Deserialize, Serialize};
use std::time::Instant;
use tokio::sync::mpsc;

// Ollama API request format
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    #[serde(default)]
    pub stream: bool,
}

// Ollama API response format, one per NDJSON line when streaming
#[derive(Deserialize, Serialize, Clone, Debug, Default)]
pub struct GenerateChunk {
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// one entry of /api/tags
#[derive(Deserialize, Serialize, Clone, Debug, Default)]
pub struct ModelEntry {
    #[serde(default)]
    pub name: Option<String>,
}

// /api/tags comes back either as a bare list or wrapped in {"models": [...]}
#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum TagsResponse {
    Bare(Vec<ModelEntry>),
    Wrapped { models: Vec<ModelEntry> },
}

impl TagsResponse {
    pub fn into_names(self) -> Vec<String> {
        let entries = match self {
            TagsResponse::Bare(entries) => entries,
            TagsResponse::Wrapped { models } => models,
        };
        entries
            .into_iter()
            .filter_map(|e| e.name)
            .filter(|name| !name.is_empty())
            .collect()
    }
}

// body of POST /api/generate on our side
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct NovelRequest {
    // missing is treated like empty and refused with a 400
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default = "default_stream")]
    pub stream: bool,
}

fn default_stream() -> bool {
    true
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Generating,
    Completed,
    Failed,
}

// one progress frame: text so far + status line
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct Progress {
    pub text: String,
    pub status: String,
    pub phase: Phase,
}

impl Progress {
    pub fn generating(text: String) -> Self {
        Self {
            text,
            status: "Generating...".to_string(),
            phase: Phase::Generating,
        }
    }

    pub fn completed(text: String, saved_to: &str) -> Self {
        Self {
            text,
            status: format!("Novel generation completed!\nSaved to: {}", saved_to),
            phase: Phase::Completed,
        }
    }

    // partial text is never surfaced on failure
    pub fn failed(error: &impl std::fmt::Display) -> Self {
        Self {
            text: String::new(),
            status: format!("An error occurred: {}", error),
            phase: Phase::Failed,
        }
    }
}

// queued generation - holds request + progress channel
pub struct GenerationJob {
    pub request: NovelRequest,
    pub progress_tx: mpsc::Sender<Progress>,
    pub queued_at: Instant,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn novel_request_defaults_to_streaming() {
        let req: NovelRequest =
            serde_json::from_str(r#"{"description":"plot","model":"m1"}"#).unwrap();
        assert!(req.stream);
        assert!(req.style.is_none());
        assert!(req.host.is_none());
    }

    #[test]
    fn missing_description_decodes_as_empty() {
        let req: NovelRequest = serde_json::from_str(r#"{"model":"m1"}"#).unwrap();
        assert_eq!(req.description, "");
    }

    #[test]
    fn phase_serializes_snake_case() {
        let p = Progress::completed("done".into(), "out.txt");
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["phase"], "completed");
        assert!(json["status"].as_str().unwrap().contains("out.txt"));
    }

    #[test]
    fn failed_frame_drops_text() {
        let p = Progress::failed(&"boom");
        assert_eq!(p.text, "");
        assert_eq!(p.status, "An error occurred: boom");
        assert_eq!(p.phase, Phase::Failed);
    }
}
