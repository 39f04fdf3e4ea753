//! Terminal output sink — prompt, thinking dots and typed-out replies.
//!
//! Pacing is purely cosmetic. Zero delays print everything at once.

use async_trait::async_trait;
use rollchat_core::channel::OutputSink;
use std::time::Duration;
use tokio::io::{self, AsyncWriteExt};
use tracing::debug;

/// Delays used by [`TerminalSink`].
#[derive(Debug, Clone, Copy)]
pub struct Pacing {
    /// Pause after each character of a reply
    pub typing_delay: Duration,
    /// Pause after each dot of the thinking indicator
    pub thinking_delay: Duration,
    pub thinking_dots: u32,
}

impl Pacing {
    /// No delays at all.
    pub fn instant() -> Self {
        Self {
            typing_delay: Duration::ZERO,
            thinking_delay: Duration::ZERO,
            thinking_dots: 3,
        }
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            typing_delay: Duration::from_millis(20),
            thinking_delay: Duration::from_millis(300),
            thinking_dots: 3,
        }
    }
}

/// Writes the session to stdout.
#[derive(Debug, Default)]
pub struct TerminalSink {
    pacing: Pacing,
}

impl TerminalSink {
    pub fn new(pacing: Pacing) -> Self {
        Self { pacing }
    }

    /// Print the startup banner.
    pub async fn banner(&self) {
        let rule = "-".repeat(50);
        write_out(&format!(
            "{rule}\n\t\tSimple AI Chatbot\n{rule}\nCommands: 'quit' | 'clear' | 'save'\n\n"
        ))
        .await;
    }
}

/// Write and flush; a closed stdout is not worth failing a turn over.
async fn write_out(text: &str) {
    let mut out = io::stdout();
    let result = async {
        out.write_all(text.as_bytes()).await?;
        out.flush().await
    }
    .await;
    if let Err(e) = result {
        debug!(error = %e, "stdout write failed");
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

#[async_trait]
impl OutputSink for TerminalSink {
    async fn prompt(&self) {
        write_out("You: ").await;
    }

    async fn notice(&self, text: &str) {
        write_out(&format!("{text}\n")).await;
    }

    async fn thinking(&self) {
        write_out("AI is thinking").await;
        for _ in 0..self.pacing.thinking_dots {
            pause(self.pacing.thinking_delay).await;
            write_out(".").await;
        }
        write_out("\n\n").await;
    }

    async fn reply(&self, text: &str) {
        write_out("AI: ").await;
        if self.pacing.typing_delay.is_zero() {
            write_out(text).await;
        } else {
            let mut buf = [0u8; 4];
            for ch in text.chars() {
                write_out(ch.encode_utf8(&mut buf)).await;
                pause(self.pacing.typing_delay).await;
            }
        }
        write_out("\n").await;
    }

    async fn error(&self, text: &str) {
        write_out(&format!("\n{text}\n\n")).await;
    }
}
