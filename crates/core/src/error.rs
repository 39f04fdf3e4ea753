//! Error types for the rollchat domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Only a handful of failure kinds are distinguished by the session loop:
//! terminal overload, non-retryable upstream errors, summarization failures
//! and persistence failures. Everything else is reported generically.

use thiserror::Error;

/// The top-level error type for all rollchat operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The service stayed overloaded for every allowed attempt.
    #[error(
        "The model is temporarily overloaded (gave up after {attempts} attempts).\n\
         Please wait and try again later, or upgrade your plan."
    )]
    Overloaded { attempts: u32 },

    /// A non-retryable upstream failure, propagated unchanged.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The summarization request behind a compaction failed.
    #[error("Summarization failed: {0}")]
    SummarizationFailed(#[source] ProviderError),

    // --- Persistence ---
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    // --- Input ---
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),
}

impl Error {
    /// Whether this is the terminal "try again later" condition.
    pub fn is_overloaded(&self) -> bool {
        matches!(self, Error::Overloaded { .. })
    }
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// Service-unavailable class of failure (HTTP 503 / `UNAVAILABLE`).
    #[error("Model unavailable (status: {status_code}): {message}")]
    Unavailable { status_code: u16, message: String },

    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider{}", retry_hint(.retry_after_secs))]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response from provider: {0}")]
    InvalidResponse(String),
}

fn retry_hint(secs: &Option<u64>) -> String {
    secs.map(|s| format!(", retry after {s}s")).unwrap_or_default()
}

impl ProviderError {
    /// Whether this failure signals transient overload of the service.
    ///
    /// Besides the dedicated variant, any error carrying a 503 status or an
    /// `UNAVAILABLE` marker in its message counts as overload.
    pub fn is_overload(&self) -> bool {
        match self {
            ProviderError::Unavailable { .. } => true,
            ProviderError::ApiError {
                status_code,
                message,
            } => *status_code == 503 || carries_overload_marker(message),
            ProviderError::Network(message) | ProviderError::InvalidResponse(message) => {
                carries_overload_marker(message)
            }
            _ => false,
        }
    }
}

fn carries_overload_marker(message: &str) -> bool {
    message.contains("503") || message.contains("UNAVAILABLE")
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Failed to serialize transcript: {0}")]
    Serialization(String),
}

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Input stream lost: {0}")]
    ConnectionLost(String),
}
