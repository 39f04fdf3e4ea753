//! Context compaction — keeps the transcript bounded.
//!
//! When the transcript grows past the trigger, everything but the most
//! recent turns is replaced by a single summary turn at the head. A previous
//! summary is part of the older prefix and gets folded into the new one.

use crate::summarizer::Summarizer;
use rollchat_core::error::Result;
use rollchat_core::message::Transcript;
use tracing::{debug, info};

/// What a compaction pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompactionOutcome {
    /// Transcript is at or under the trigger.
    NotNeeded,
    /// Over the trigger, but every turn is recent; nothing to summarize.
    Skipped,
    /// `summarized` older turns became one summary; `kept` turns follow it.
    Compacted { summarized: usize, kept: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompactionPolicy {
    summary_trigger: usize,
    recent_keep: usize,
}

impl Default for CompactionPolicy {
    fn default() -> Self {
        Self {
            summary_trigger: 10,
            recent_keep: 6,
        }
    }
}

impl CompactionPolicy {
    pub fn new(summary_trigger: usize, recent_keep: usize) -> Self {
        Self {
            summary_trigger,
            recent_keep,
        }
    }

    pub fn needs_compaction(&self, transcript: &Transcript) -> bool {
        transcript.len() > self.summary_trigger
    }

    /// Compact `transcript` in place if it is over the trigger.
    ///
    /// The summary is produced before anything is touched: if the summarizer
    /// fails, the transcript is left exactly as it was.
    pub async fn apply(
        &self,
        transcript: &mut Transcript,
        summarizer: &Summarizer,
    ) -> Result<CompactionOutcome> {
        if !self.needs_compaction(transcript) {
            return Ok(CompactionOutcome::NotNeeded);
        }

        let (prefix, _) = transcript.split_recent(self.recent_keep);
        if prefix.is_empty() {
            debug!(
                len = transcript.len(),
                recent_keep = self.recent_keep,
                "Nothing older than the recent window, skipping compaction"
            );
            return Ok(CompactionOutcome::Skipped);
        }

        let summary = summarizer.summarize(prefix).await?;
        let summarized = transcript.compact(&summary, self.recent_keep);
        let kept = transcript.len() - 1;

        info!(summarized, kept, "Compacted conversation history");
        Ok(CompactionOutcome::Compacted { summarized, kept })
    }
}
