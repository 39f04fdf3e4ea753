//! In-memory store — useful for testing and ephemeral sessions.

use async_trait::async_trait;
use rollchat_core::error::StoreError;
use rollchat_core::message::Transcript;
use rollchat_core::store::TranscriptStore;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// A store that keeps the last saved transcript in memory.
///
/// Counts saves and can be told to fail them, so session tests can check
/// when persistence happens and what a failed save does.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    saved: Arc<RwLock<Option<Transcript>>>,
    saves: Arc<AtomicUsize>,
    fail_saves: Arc<AtomicBool>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with `transcript` already saved.
    pub fn with_transcript(transcript: Transcript) -> Self {
        Self {
            saved: Arc::new(RwLock::new(Some(transcript))),
            ..Self::default()
        }
    }

    /// Make every subsequent save fail (or succeed again).
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// The last successfully saved transcript, if any.
    pub async fn snapshot(&self) -> Option<Transcript> {
        self.saved.read().await.clone()
    }
}

#[async_trait]
impl TranscriptStore for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn load(&self) -> Transcript {
        self.saved.read().await.clone().unwrap_or_default()
    }

    async fn save(&self, transcript: &Transcript) -> Result<(), StoreError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StoreError::Io {
                path: "<memory>".into(),
                reason: "saves disabled".into(),
            });
        }
        *self.saved.write().await = Some(transcript.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
