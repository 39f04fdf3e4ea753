//! Channel traits — how a session talks to the person at the keyboard.
//!
//! An input channel produces raw lines; an output sink renders what the
//! session has to say. The terminal implementations live in
//! `rollchat-channels`; tests use scripted and buffering ones.

use async_trait::async_trait;
use tokio::sync::mpsc;
use crate::error::ChannelError;

/// A source of raw input lines.
#[async_trait]
pub trait InputChannel: Send + Sync {
    /// Channel name, for logs.
    fn name(&self) -> &str;

    /// Start reading. The receiver closes when input ends (EOF).
    async fn start(&self) -> Result<mpsc::Receiver<Result<String, ChannelError>>, ChannelError>;
}

/// Text-output collaborator for the session loop.
///
/// Pacing (typing effect, thinking dots) is an implementation detail of the
/// sink and never affects the session's state.
#[async_trait]
pub trait OutputSink: Send + Sync {
    /// Ask for the next line of input.
    async fn prompt(&self);

    /// A bracketed status line, e.g. "[Chat saved successfully]".
    async fn notice(&self, text: &str);

    /// Shown while a reply is being generated.
    async fn thinking(&self);

    /// The assistant's reply.
    async fn reply(&self, text: &str);

    /// A failed turn.
    async fn error(&self, text: &str);
}
