use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::Result;

pub const DEFAULT_OUTPUT: &str = "generated_novel.txt";

// Writes the finished novel to one fixed file, last writer wins
#[derive(Clone, Debug)]
pub struct NovelSink {
    path: PathBuf,
}

impl NovelSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn save(&self, text: &str) -> Result<PathBuf> {
        tokio::fs::write(&self.path, text.as_bytes()).await?;
        info!(path = %self.path.display(), bytes = text.len(), "saved generated novel");
        Ok(self.path.clone())
    }
}

impl Default for NovelSink {
    fn default() -> Self {
        Self::new(DEFAULT_OUTPUT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_overwrites_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let sink = NovelSink::new(dir.path().join("novel.txt"));

        sink.save("a much longer first draft").await.unwrap();
        let path = sink.save("短い物語").await.unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes, "短い物語".as_bytes());
    }

    #[tokio::test]
    async fn save_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let sink = NovelSink::new(dir.path().join("missing").join("novel.txt"));
        let err = sink.save("text").await.unwrap_err();
        assert_eq!(err.kind(), "io");
    }
}
