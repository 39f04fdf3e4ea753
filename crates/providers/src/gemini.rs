//! Google Gemini provider implementation.
//!
//! Talks to the `generateContent` endpoint of the Generative Language API.
//! One request carries the flattened conversation as a single user part,
//! the directive as `systemInstruction`, and sampling in `generationConfig`.

use async_trait::async_trait;
use rollchat_core::error::ProviderError;
use rollchat_core::provider::*;
use serde_json::{Value, json};
use tracing::{debug, warn};

/// A Gemini-backed provider.
pub struct GeminiProvider {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    /// Create a new Gemini provider against `base_url`.
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ProviderError::NotConfigured(
                "Gemini API key is empty".into(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }

    fn generate_url(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        )
    }

    /// Build the JSON request body.
    fn build_body(request: &GenerationRequest) -> Value {
        let mut body = json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": request.contents }],
            }],
            "generationConfig": {
                "temperature": request.sampling.temperature,
                "maxOutputTokens": request.sampling.max_output_tokens,
            },
        });

        if let Some(instruction) = &request.system_instruction {
            body["systemInstruction"] = json!({ "parts": [{ "text": instruction }] });
        }

        body
    }
}

/// Map a non-success HTTP status (and its body) to a provider error.
///
/// `retry_after` is the raw `Retry-After` header, if the response had one.
fn classify_failure(status: u16, retry_after: Option<&str>, body: &str) -> ProviderError {
    let error = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").cloned());
    let api_status = error
        .as_ref()
        .and_then(|e| e.get("status"))
        .and_then(|s| s.as_str())
        .map(str::to_string);

    if status == 503 || api_status.as_deref() == Some("UNAVAILABLE") {
        return ProviderError::Unavailable {
            status_code: status,
            message: body.to_string(),
        };
    }

    match status {
        429 => ProviderError::RateLimited {
            retry_after_secs: retry_after
                .and_then(|h| h.trim().parse().ok())
                .or_else(|| error.as_ref().and_then(retry_delay_secs)),
        },
        401 | 403 => ProviderError::AuthenticationFailed(
            "Invalid API key or insufficient permissions".into(),
        ),
        _ => ProviderError::ApiError {
            status_code: status,
            message: body.to_string(),
        },
    }
}

/// Seconds from a `google.rpc.RetryInfo` entry in `error.details`, whose
/// `retryDelay` is a duration string such as `"17s"` or `"0.5s"`.
fn retry_delay_secs(error: &Value) -> Option<u64> {
    error
        .get("details")?
        .as_array()?
        .iter()
        .filter_map(|d| d.get("retryDelay")?.as_str())
        .find_map(|delay| delay.strip_suffix('s')?.parse::<f64>().ok())
        .map(|secs| secs.ceil() as u64)
}

/// Extract text, finish reason and usage from a `generateContent` response.
///
/// A response without candidates (e.g. a blocked prompt) yields empty text;
/// whether that is acceptable is the caller's decision.
fn parse_response(body: &Value, model: &str) -> GenerationResponse {
    let candidate = body
        .get("candidates")
        .and_then(|c| c.as_array())
        .and_then(|a| a.first());

    let text = candidate
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
                .collect::<String>()
        })
        .unwrap_or_default();

    let finish_reason = candidate
        .and_then(|c| c.get("finishReason"))
        .and_then(|v| v.as_str())
        .map(|s| match s {
            "STOP" => "stop".to_string(),
            "MAX_TOKENS" => "length".to_string(),
            other => other.to_lowercase(),
        });

    GenerationResponse {
        text,
        model: model.to_string(),
        finish_reason,
        usage: body.get("usageMetadata").and_then(parse_usage),
    }
}

fn parse_usage(v: &Value) -> Option<Usage> {
    let prompt = v.get("promptTokenCount")?.as_u64()? as u32;
    let completion = v
        .get("candidatesTokenCount")
        .and_then(|c| c.as_u64())
        .unwrap_or(0) as u32;
    let total = v
        .get("totalTokenCount")
        .and_then(|t| t.as_u64())
        .map(|t| t as u32)
        .unwrap_or(prompt + completion);
    Some(Usage {
        prompt_tokens: prompt,
        completion_tokens: completion,
        total_tokens: total,
    })
}

/// Mask the API key in a request URL for logging.
fn redact_url_key(url: &str) -> String {
    match url.find("key=") {
        Some(idx) => {
            let (prefix, rest) = url.split_at(idx + 4);
            let end = rest.find('&').unwrap_or(rest.len());
            format!("{prefix}[REDACTED]{}", &rest[end..])
        }
        None => url.to_string(),
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> std::result::Result<GenerationResponse, ProviderError> {
        let url = self.generate_url(&request.model);
        let body = Self::build_body(&request);

        debug!(
            url = %redact_url_key(&url),
            model = %request.model,
            bytes = request.contents.len(),
            "Sending generation request"
        );

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(e.to_string())
                } else {
                    ProviderError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if !(200..300).contains(&status) {
            warn!(status, body = %text, "Provider returned error");
            return Err(classify_failure(status, retry_after.as_deref(), &text));
        }

        let json: Value = serde_json::from_str(&text)
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse response: {e}")))?;

        let parsed = parse_response(&json, &request.model);
        debug!(
            finish_reason = parsed.finish_reason.as_deref().unwrap_or("none"),
            reply_bytes = parsed.text.len(),
            "Generation complete"
        );
        Ok(parsed)
    }
}
