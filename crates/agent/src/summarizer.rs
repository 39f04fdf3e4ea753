//! Summarizer — condenses older turns into one short digest.

use rollchat_core::error::{Error, ProviderError, Result};
use rollchat_core::message::{Turn, flatten};
use rollchat_core::provider::{GenerationRequest, Provider, SamplingParams};
use std::sync::Arc;
use tracing::debug;

/// Instruction placed before the flattened turns.
pub const SUMMARY_INSTRUCTION: &str = "Summarize the following conversation briefly. \
Preserve important facts and user preferences. \
Do not add new information.";

/// Summarizes a run of turns with low-randomness sampling and no directive.
///
/// Failures are not retried.
pub struct Summarizer {
    provider: Arc<dyn Provider>,
    model: String,
    sampling: SamplingParams,
}

impl Summarizer {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            sampling: SamplingParams {
                temperature: 0.1,
                max_output_tokens: 120,
            },
        }
    }

    pub fn with_sampling(mut self, sampling: SamplingParams) -> Self {
        self.sampling = sampling;
        self
    }

    /// Build the summarization prompt for `turns`.
    pub fn prompt(turns: &[Turn]) -> String {
        format!("{SUMMARY_INSTRUCTION}\n\n{}", flatten(turns))
    }

    pub async fn summarize(&self, turns: &[Turn]) -> Result<String> {
        let request = GenerationRequest {
            model: self.model.clone(),
            contents: Self::prompt(turns),
            system_instruction: None,
            sampling: self.sampling,
        };

        debug!(turns = turns.len(), "Summarizing older turns");
        let response = self
            .provider
            .generate(request)
            .await
            .map_err(Error::SummarizationFailed)?;

        let summary = response.text.trim();
        if summary.is_empty() {
            return Err(Error::SummarizationFailed(ProviderError::InvalidResponse(
                "model returned an empty summary".into(),
            )));
        }
        Ok(summary.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{ScriptedProvider, overloaded};

    fn turns() -> Vec<Turn> {
        vec![Turn::user("I like green tea"), Turn::assistant("Noted!")]
    }

    #[test]
    fn prompt_puts_instruction_before_conversation() {
        let prompt = Summarizer::prompt(&turns());
        assert!(prompt.starts_with("Summarize the following conversation briefly."));
        assert!(prompt.contains("Do not add new information."));
        assert!(prompt.ends_with("\n\nUser: I like green tea\nAssistant: Noted!"));
    }

    #[tokio::test]
    async fn uses_summary_sampling_without_directive() {
        let provider = Arc::new(ScriptedProvider::texts(&["User likes green tea."]));
        let summarizer = Summarizer::new(provider.clone(), "gemini-2.5-flash");

        let summary = summarizer.summarize(&turns()).await.unwrap();

        assert_eq!(summary, "User likes green tea.");
        let req = &provider.requests()[0];
        assert!(req.system_instruction.is_none());
        assert_eq!(req.sampling.temperature, 0.1);
        assert_eq!(req.sampling.max_output_tokens, 120);
    }

    #[tokio::test]
    async fn provider_failure_is_summarization_failure() {
        let provider = Arc::new(ScriptedProvider::new(vec![Err(overloaded())]));
        let err = Summarizer::new(provider.clone(), "m")
            .summarize(&turns())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::SummarizationFailed(_)));
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn blank_summary_is_failure() {
        let provider = Arc::new(ScriptedProvider::texts(&["   "]));
        let err = Summarizer::new(provider, "m")
            .summarize(&turns())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SummarizationFailed(_)));
    }
}
