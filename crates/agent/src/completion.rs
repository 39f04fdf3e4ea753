//! Completion client — one conversational reply, with bounded retry on overload.
//!
//! Each call walks an explicit state machine:
//!
//! ```text
//! Attempting(1) ──ok──────────────────────────▶ Succeeded
//!      │ overload, n < max: notice + sleep
//!      ▼
//! Attempting(n+1) ... overload at max ────────▶ FailedTerminal(Overloaded)
//!      └─ any other failure ──────────────────▶ FailedTerminal(Provider)
//! ```

use rollchat_core::channel::OutputSink;
use rollchat_core::error::{Error, Result};
use rollchat_core::provider::{GenerationRequest, GenerationResponse, Provider, SamplingParams};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

enum RetryState {
    Attempting(u32),
    Succeeded(GenerationResponse),
    FailedTerminal(Error),
}

/// Sends the flattened transcript upstream under the behavioral directive.
pub struct CompletionClient {
    provider: Arc<dyn Provider>,
    model: String,
    directive: String,
    sampling: SamplingParams,
    max_retries: u32,
    retry_delay: Duration,
    notices: Option<Arc<dyn OutputSink>>,
}

impl CompletionClient {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        directive: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            directive: directive.into(),
            sampling: SamplingParams {
                temperature: 0.3,
                max_output_tokens: 150,
            },
            max_retries: 3,
            retry_delay: Duration::from_secs(2),
            notices: None,
        }
    }

    pub fn with_sampling(mut self, sampling: SamplingParams) -> Self {
        self.sampling = sampling;
        self
    }

    /// Total attempts per call (first try included) and the flat delay
    /// between them. Zero attempts is treated as one.
    pub fn with_retry(mut self, max_retries: u32, delay: Duration) -> Self {
        self.max_retries = max_retries.max(1);
        self.retry_delay = delay;
        self
    }

    /// Where to announce retries.
    pub fn with_notices(mut self, sink: Arc<dyn OutputSink>) -> Self {
        self.notices = Some(sink);
        self
    }

    /// Generate a reply to `conversation`. The text may be empty.
    pub async fn complete(&self, conversation: &str) -> Result<String> {
        let request = GenerationRequest {
            model: self.model.clone(),
            contents: conversation.to_string(),
            system_instruction: Some(self.directive.clone()),
            sampling: self.sampling,
        };
        let max = self.max_retries;

        let mut state = RetryState::Attempting(1);
        loop {
            state = match state {
                RetryState::Attempting(attempt) => {
                    debug!(attempt, max, provider = self.provider.name(), "Requesting completion");
                    match self.provider.generate(request.clone()).await {
                        Ok(response) => RetryState::Succeeded(response),
                        Err(e) if e.is_overload() && attempt < max => {
                            warn!(attempt, max, error = %e, "Model overloaded, retrying");
                            if let Some(sink) = &self.notices {
                                sink.notice(&format!(
                                    "[Model overloaded — retrying {attempt}/{max}]"
                                ))
                                .await;
                            }
                            tokio::time::sleep(self.retry_delay).await;
                            RetryState::Attempting(attempt + 1)
                        }
                        Err(e) if e.is_overload() => {
                            warn!(attempts = attempt, error = %e, "Model still overloaded, giving up");
                            RetryState::FailedTerminal(Error::Overloaded { attempts: attempt })
                        }
                        Err(e) => RetryState::FailedTerminal(Error::Provider(e)),
                    }
                }
                RetryState::Succeeded(response) => {
                    if let Some(usage) = response.usage {
                        debug!(
                            prompt_tokens = usage.prompt_tokens,
                            completion_tokens = usage.completion_tokens,
                            "Completion usage"
                        );
                    }
                    return Ok(response.text);
                }
                RetryState::FailedTerminal(e) => return Err(e),
            };
        }
    }
}
