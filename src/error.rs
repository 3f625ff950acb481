use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Cannot connect to Ollama server ({0})")]
    Connection(String),

    #[error("No model selected")]
    ModelNotSelected,

    #[error("Selected model '{0}' is not available")]
    ModelUnavailable(String),

    #[error("Plot description is empty")]
    EmptyDescription,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Ollama returned status {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unexpected response shape: {0}")]
    UnexpectedShape(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Generation queue is closed")]
    QueueClosed,
}

impl Error {
    // stable label for logs and http error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Connection(_) => "connection",
            Error::ModelNotSelected | Error::ModelUnavailable(_) | Error::EmptyDescription => {
                "validation"
            }
            Error::Http(_) | Error::Upstream { .. } => "transport",
            Error::Json(_) | Error::UnexpectedShape(_) => "decode",
            Error::Io(_) => "io",
            Error::QueueClosed => "internal",
        }
    }

    pub fn is_validation(&self) -> bool {
        self.kind() == "validation"
    }
}
