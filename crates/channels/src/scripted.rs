//! Scripted input and recording output — drive a session without a terminal.
//!
//! Used by the end-to-end tests and handy for replaying a conversation.

use async_trait::async_trait;
use rollchat_core::channel::{InputChannel, OutputSink};
use rollchat_core::error::ChannelError;
use std::sync::Mutex;
use tokio::sync::mpsc;

/// Feeds a fixed list of lines, then closes (EOF).
#[derive(Debug, Clone)]
pub struct ScriptedChannel {
    lines: Vec<String>,
}

impl ScriptedChannel {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl InputChannel for ScriptedChannel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn start(
        &self,
    ) -> Result<mpsc::Receiver<Result<String, ChannelError>>, ChannelError> {
        let (tx, rx) = mpsc::channel(self.lines.len().max(1));
        for line in &self.lines {
            tx.send(Ok(line.clone()))
                .await
                .map_err(|e| ChannelError::ConnectionLost(e.to_string()))?;
        }
        Ok(rx)
    }
}

/// Everything a session showed, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    Prompt,
    Notice(String),
    Thinking,
    Reply(String),
    Error(String),
}

/// An output sink that records instead of printing.
#[derive(Debug, Default)]
pub struct BufferSink {
    events: Mutex<Vec<SinkEvent>>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SinkEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn notices(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SinkEvent::Notice(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn replies(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SinkEvent::Reply(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SinkEvent::Error(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: SinkEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

#[async_trait]
impl OutputSink for BufferSink {
    async fn prompt(&self) {
        self.record(SinkEvent::Prompt);
    }

    async fn notice(&self, text: &str) {
        self.record(SinkEvent::Notice(text.to_string()));
    }

    async fn thinking(&self) {
        self.record(SinkEvent::Thinking);
    }

    async fn reply(&self, text: &str) {
        self.record(SinkEvent::Reply(text.to_string()));
    }

    async fn error(&self, text: &str) {
        self.record(SinkEvent::Error(text.to_string()));
    }
}
