//! Configuration loading, validation, and management for rollchat.
//!
//! Loads configuration from `~/.rollchat/config.toml` (or an explicit path)
//! with environment variable overrides. Validates all settings at startup.
//! The directive, sampling, retry bound, delays and compaction thresholds
//! all come from here and are handed to the session at construction.

use rollchat_core::SamplingParams;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The fixed behavioral directive sent with every completion request.
pub const DEFAULT_DIRECTIVE: &str = "You are a helpful, polite, and concise AI assistant. \
Explain concepts in simple language. \
For technical questions, respond step-by-step. \
Do not use emojis. Avoid unnecessary verbosity. \
If you do not know something, say so honestly.";

/// The root configuration structure.
///
/// Maps directly to `~/.rollchat/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Gemini API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model used for both completion and summarization
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL of the generation API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Behavioral directive (system instruction) for completions
    #[serde(default = "default_directive")]
    pub directive: String,

    /// Where the transcript is persisted
    #[serde(default = "default_history_file")]
    pub history_file: PathBuf,

    /// Sampling for conversational replies
    #[serde(default)]
    pub completion: CompletionSampling,

    /// Sampling for compaction summaries
    #[serde(default)]
    pub summary: SummarySampling,

    /// Retry policy for transient overload
    #[serde(default)]
    pub retry: RetryConfig,

    /// Context compaction thresholds
    #[serde(default)]
    pub compaction: CompactionConfig,

    /// Terminal pacing
    #[serde(default)]
    pub display: DisplayConfig,
}

fn default_model() -> String {
    "gemini-2.5-flash".into()
}
fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".into()
}
fn default_directive() -> String {
    DEFAULT_DIRECTIVE.into()
}
fn default_history_file() -> PathBuf {
    PathBuf::from("chat_history.json")
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("directive", &self.directive)
            .field("history_file", &self.history_file)
            .field("completion", &self.completion)
            .field("summary", &self.summary)
            .field("retry", &self.retry)
            .field("compaction", &self.compaction)
            .field("display", &self.display)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CompletionSampling {
    #[serde(default = "default_completion_temperature")]
    pub temperature: f64,

    #[serde(default = "default_completion_max_tokens")]
    pub max_output_tokens: u32,
}

fn default_completion_temperature() -> f64 {
    0.3
}
fn default_completion_max_tokens() -> u32 {
    150
}

impl Default for CompletionSampling {
    fn default() -> Self {
        Self {
            temperature: default_completion_temperature(),
            max_output_tokens: default_completion_max_tokens(),
        }
    }
}

/// Summaries run colder and shorter than replies.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SummarySampling {
    #[serde(default = "default_summary_temperature")]
    pub temperature: f64,

    #[serde(default = "default_summary_max_tokens")]
    pub max_output_tokens: u32,
}

fn default_summary_temperature() -> f64 {
    0.1
}
fn default_summary_max_tokens() -> u32 {
    120
}

impl Default for SummarySampling {
    fn default() -> Self {
        Self {
            temperature: default_summary_temperature(),
            max_output_tokens: default_summary_max_tokens(),
        }
    }
}

fn sampling_params(temperature: f64, max_output_tokens: u32) -> SamplingParams {
    SamplingParams {
        temperature: temperature as f32,
        max_output_tokens,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts allowed for one completion (first try included)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Flat delay between attempts, in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub delay_ms: u64,
}

fn default_max_retries() -> u32 {
    3
}
fn default_retry_delay_ms() -> u64 {
    2000
}

impl RetryConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            delay_ms: default_retry_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompactionConfig {
    /// Transcript length above which compaction runs
    #[serde(default = "default_summary_trigger")]
    pub summary_trigger: usize,

    /// Most recent turns always kept verbatim
    #[serde(default = "default_recent_keep")]
    pub recent_keep: usize,
}

fn default_summary_trigger() -> usize {
    10
}
fn default_recent_keep() -> usize {
    6
}

impl Default for CompactionConfig {
    fn default() -> Self {
        Self {
            summary_trigger: default_summary_trigger(),
            recent_keep: default_recent_keep(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Delay between characters of a reply
    #[serde(default = "default_typing_delay_ms")]
    pub typing_delay_ms: u64,

    /// Delay between dots of the thinking indicator
    #[serde(default = "default_thinking_delay_ms")]
    pub thinking_delay_ms: u64,

    #[serde(default = "default_thinking_dots")]
    pub thinking_dots: u32,
}

fn default_typing_delay_ms() -> u64 {
    20
}
fn default_thinking_delay_ms() -> u64 {
    300
}
fn default_thinking_dots() -> u32 {
    3
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            typing_delay_ms: default_typing_delay_ms(),
            thinking_delay_ms: default_thinking_delay_ms(),
            thinking_dots: default_thinking_dots(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.rollchat/config.toml).
    ///
    /// Also checks environment variables:
    /// - `ROLLCHAT_API_KEY` (highest priority), `GEMINI_API_KEY`, `GOOGLE_API_KEY`
    /// - `ROLLCHAT_MODEL`
    /// - `ROLLCHAT_HISTORY_FILE`
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(None)
    }

    /// Load from an explicit path when given, otherwise from the default path.
    pub fn load_with(path: Option<&Path>) -> Result<Self, ConfigError> {
        let default_path = Self::config_path();
        let mut config = Self::load_from(path.unwrap_or(&default_path))?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment-style overrides through `lookup`.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("ROLLCHAT_API_KEY")
            .or_else(|| lookup("GEMINI_API_KEY"))
            .or_else(|| lookup("GOOGLE_API_KEY"))
        {
            self.api_key = Some(key);
        }

        if let Some(model) = lookup("ROLLCHAT_MODEL") {
            self.model = model;
        }

        if let Some(file) = lookup("ROLLCHAT_HISTORY_FILE") {
            self.history_file = PathBuf::from(file);
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".rollchat")
    }

    /// Get the default config file path.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        let sections = [
            ("completion", self.completion.temperature, self.completion.max_output_tokens),
            ("summary", self.summary.temperature, self.summary.max_output_tokens),
        ];
        for (name, temperature, max_output_tokens) in sections {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(ConfigError::ValidationError(format!(
                    "{name}.temperature must be between 0.0 and 2.0"
                )));
            }
            if max_output_tokens == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "{name}.max_output_tokens must be > 0"
                )));
            }
        }

        if self.retry.max_retries == 0 {
            return Err(ConfigError::ValidationError(
                "retry.max_retries must be at least 1".into(),
            ));
        }

        if self.compaction.recent_keep == 0 {
            return Err(ConfigError::ValidationError(
                "compaction.recent_keep must be at least 1".into(),
            ));
        }

        if self.compaction.summary_trigger == 0 {
            return Err(ConfigError::ValidationError(
                "compaction.summary_trigger must be at least 1".into(),
            ));
        }

        if self.compaction.recent_keep >= self.compaction.summary_trigger {
            tracing::warn!(
                recent_keep = self.compaction.recent_keep,
                summary_trigger = self.compaction.summary_trigger,
                "recent_keep >= summary_trigger; compaction will fold very few turns"
            );
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }

    pub fn completion_sampling(&self) -> SamplingParams {
        sampling_params(self.completion.temperature, self.completion.max_output_tokens)
    }

    pub fn summary_sampling(&self) -> SamplingParams {
        sampling_params(self.summary.temperature, self.summary.max_output_tokens)
    }

    /// Generate a default config TOML string (for `config init`).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }

    /// Render this config as TOML with the API key masked.
    pub fn redacted_toml(&self) -> Result<String, ConfigError> {
        let mut shown = self.clone();
        if shown.api_key.is_some() {
            shown.api_key = Some("[REDACTED]".into());
        }
        toml::to_string_pretty(&shown)
            .map_err(|e| ConfigError::ValidationError(format!("cannot render config: {e}")))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            base_url: default_base_url(),
            directive: default_directive(),
            history_file: default_history_file(),
            completion: CompletionSampling::default(),
            summary: SummarySampling::default(),
            retry: RetryConfig::default(),
            compaction: CompactionConfig::default(),
            display: DisplayConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
