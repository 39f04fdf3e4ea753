//! Shared test helpers for session tests.

use rollchat_core::error::ProviderError;
use rollchat_core::provider::{GenerationRequest, GenerationResponse, Provider, Usage};
use std::sync::Mutex;

/// A mock provider that plays back a sequence of scripted outcomes.
///
/// Each call to `generate` returns the next outcome in the queue and records
/// the request. Panics if more calls are made than outcomes provided.
pub struct ScriptedProvider {
    outcomes: Mutex<Vec<Result<GenerationResponse, ProviderError>>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedProvider {
    pub fn new(outcomes: Vec<Result<GenerationResponse, ProviderError>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A provider that answers every listed call with the given text.
    pub fn texts(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(text_response(t))).collect())
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted_mock"
    }

    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let outcomes = self.outcomes.lock().unwrap();
        let call = requests.len();

        if call >= outcomes.len() {
            panic!(
                "ScriptedProvider: no more outcomes (call #{}, have {})",
                call,
                outcomes.len()
            );
        }

        requests.push(request);
        outcomes[call].clone()
    }
}

/// A successful response carrying `text`.
pub fn text_response(text: &str) -> GenerationResponse {
    GenerationResponse {
        text: text.into(),
        model: "mock-model".into(),
        finish_reason: Some("stop".into()),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
    }
}

/// The upstream "model overloaded" failure.
pub fn overloaded() -> ProviderError {
    ProviderError::Unavailable {
        status_code: 503,
        message: "The model is overloaded. Please try again later.".into(),
    }
}
