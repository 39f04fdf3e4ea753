//! File-based transcript store — one pretty-printed JSON array on disk.
//!
//! Each element is `{"role": ..., "content": ...}`. Non-ASCII text is written
//! as-is. Saves go through a temporary sibling file and a rename, so an
//! interrupted save leaves the previous file intact.
//!
//! A file that cannot be read or parsed is renamed to `<name>.corrupt` and
//! the session starts empty.
//!
//! Default location: `chat_history.json` in the working directory.

use async_trait::async_trait;
use rollchat_core::error::StoreError;
use rollchat_core::message::Transcript;
use rollchat_core::store::TranscriptStore;
use std::path::PathBuf;
use tracing::{debug, warn};

/// A transcript store backed by a single JSON file.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn sibling_path(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "chat_history.json".into());
        name.push(suffix);
        self.path.with_file_name(name)
    }

    fn tmp_path(&self) -> PathBuf {
        self.sibling_path(".tmp")
    }

    fn corrupt_path(&self) -> PathBuf {
        self.sibling_path(".corrupt")
    }

    /// Move an unusable history file out of the way so the next save cannot
    /// overwrite it.
    async fn set_aside(&self) {
        let target = self.corrupt_path();
        match tokio::fs::rename(&self.path, &target).await {
            Ok(()) => warn!(
                path = %self.path.display(),
                moved_to = %target.display(),
                "Unusable transcript moved aside, starting fresh"
            ),
            Err(e) => warn!(
                path = %self.path.display(),
                error = %e,
                "Cannot move unusable transcript aside"
            ),
        }
    }

    fn io_error(&self, e: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        }
    }
}

#[async_trait]
impl TranscriptStore for JsonFileStore {
    fn name(&self) -> &str {
        "json-file"
    }

    async fn load(&self) -> Transcript {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No saved transcript, starting fresh");
                return Transcript::new();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Cannot read transcript");
                self.set_aside().await;
                return Transcript::new();
            }
        };

        match serde_json::from_str::<Transcript>(&content) {
            Ok(transcript) => {
                if !transcript.is_well_formed() {
                    warn!(
                        path = %self.path.display(),
                        "Loaded transcript has a summary turn past the head"
                    );
                }
                debug!(path = %self.path.display(), turns = transcript.len(), "Transcript loaded");
                transcript
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Transcript file is corrupt");
                self.set_aside().await;
                Transcript::new()
            }
        }
    }

    async fn save(&self, transcript: &Transcript) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(transcript)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }

        let tmp = self.tmp_path();
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| self.io_error(e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.io_error(e))?;

        debug!(path = %self.path.display(), turns = transcript.len(), "Transcript saved");
        Ok(())
    }
}
