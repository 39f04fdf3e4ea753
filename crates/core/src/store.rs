//! Transcript store trait — where a session's history lives between runs.

use async_trait::async_trait;
use crate::error::StoreError;
use crate::message::Transcript;

/// Persistence boundary for the conversation transcript.
///
/// `save` overwrites any previous state and may be called any number of
/// times. `load` has no failure path: a store with nothing (or nothing
/// readable) in it yields an empty transcript.
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    /// Backend name, for logs.
    fn name(&self) -> &str;

    /// Restore the last saved transcript, or an empty one.
    async fn load(&self) -> Transcript;

    /// Persist the transcript, replacing whatever was stored before.
    async fn save(&self, transcript: &Transcript) -> Result<(), StoreError>;
}
