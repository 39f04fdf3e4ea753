//! The chat session loop.
//!
//! One iteration per input line: classify it, run the command or the
//! conversational step, and keep going. A failed turn is saved, reported,
//! and then forgotten.

use crate::command::Input;
use crate::compaction::{CompactionOutcome, CompactionPolicy};
use crate::completion::CompletionClient;
use crate::summarizer::Summarizer;
use rollchat_core::channel::OutputSink;
use rollchat_core::error::{ChannelError, Error, Result};
use rollchat_core::message::{Transcript, Turn};
use rollchat_core::store::TranscriptStore;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

pub const SAVED_NOTICE: &str = "[Chat saved successfully]";
pub const CLEARED_NOTICE: &str = "[Chat history cleared]";
pub const NO_RESPONSE_NOTICE: &str = "[No response generated]";
pub const EMPTY_INPUT_NOTICE: &str = "Please type something.";
pub const EXIT_NOTICE: &str = "Exiting program...";

/// Whether the loop should keep reading input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Exit,
}

/// A single interactive conversation.
pub struct ChatSession {
    transcript: Transcript,
    completion: CompletionClient,
    summarizer: Summarizer,
    policy: CompactionPolicy,
    store: Arc<dyn TranscriptStore>,
    sink: Arc<dyn OutputSink>,
}

impl ChatSession {
    /// Create a session with an empty transcript and the default policy.
    pub fn new(
        completion: CompletionClient,
        summarizer: Summarizer,
        store: Arc<dyn TranscriptStore>,
        sink: Arc<dyn OutputSink>,
    ) -> Self {
        Self {
            transcript: Transcript::new(),
            completion,
            summarizer,
            policy: CompactionPolicy::default(),
            store,
            sink,
        }
    }

    pub fn with_policy(mut self, policy: CompactionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replace the in-memory transcript with whatever the store holds.
    /// Returns the number of restored turns.
    pub async fn restore(&mut self) -> usize {
        self.transcript = self.store.load().await;
        info!(store = self.store.name(), turns = self.transcript.len(), "Session restored");
        self.transcript.len()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Handle one raw input line.
    pub async fn handle_input(&mut self, line: &str) -> Control {
        match Input::parse(line) {
            Input::Quit => {
                self.persist().await;
                self.sink.notice(EXIT_NOTICE).await;
                Control::Exit
            }
            Input::Clear => {
                self.transcript.clear();
                debug!("Transcript cleared");
                self.sink.notice(CLEARED_NOTICE).await;
                Control::Continue
            }
            Input::Save => {
                self.persist().await;
                Control::Continue
            }
            Input::Empty => {
                self.sink.notice(EMPTY_INPUT_NOTICE).await;
                Control::Continue
            }
            Input::Message(text) => {
                if let Err(e) = self.converse(text).await {
                    error!(error = %e, "Turn failed");
                    self.persist().await;
                    self.sink.error(&e.to_string()).await;
                }
                Control::Continue
            }
        }
    }

    /// The conversational step: append, compact, complete, record.
    async fn converse(&mut self, text: String) -> Result<()> {
        self.transcript.push(Turn::user(text));

        if let CompactionOutcome::Compacted { summarized, kept } =
            self.policy.apply(&mut self.transcript, &self.summarizer).await?
        {
            debug!(
                summarized,
                kept,
                len = self.transcript.len(),
                "Transcript compacted before completion"
            );
        }

        self.sink.thinking().await;
        let reply = self.completion.complete(&self.transcript.flatten()).await?;

        if reply.is_empty() {
            warn!("Completion produced no text");
            self.sink.notice(NO_RESPONSE_NOTICE).await;
            return Ok(());
        }

        self.sink.reply(&reply).await;
        self.transcript.push(Turn::assistant(reply));
        Ok(())
    }

    /// Save the transcript, reporting the outcome to the user.
    async fn persist(&self) {
        match self.store.save(&self.transcript).await {
            Ok(()) => self.sink.notice(SAVED_NOTICE).await,
            Err(e) => {
                error!(store = self.store.name(), error = %e, "Failed to save transcript");
                self.sink.error(&Error::Store(e).to_string()).await;
            }
        }
    }

    /// Drive the session until `quit`, end of input, or a broken channel.
    ///
    /// End of input behaves like `quit`.
    pub async fn run(
        &mut self,
        mut input: mpsc::Receiver<std::result::Result<String, ChannelError>>,
    ) {
        loop {
            self.sink.prompt().await;
            match input.recv().await {
                Some(Ok(line)) => {
                    if self.handle_input(&line).await == Control::Exit {
                        break;
                    }
                }
                Some(Err(e)) => {
                    error!(error = %e, "Input channel failed");
                    self.sink.error(&Error::Channel(e).to_string()).await;
                    self.persist().await;
                    break;
                }
                None => {
                    debug!("Input closed, ending session");
                    self.handle_input("quit").await;
                    break;
                }
            }
        }
    }
}
