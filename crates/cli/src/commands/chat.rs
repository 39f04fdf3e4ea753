//! `rollchat chat` — the interactive session.

use rollchat_agent::{ChatSession, CompactionPolicy, CompletionClient, Summarizer};
use rollchat_channels::{CliChannel, Pacing, TerminalSink};
use rollchat_config::AppConfig;
use rollchat_core::channel::{InputChannel, OutputSink};
use rollchat_memory::JsonFileStore;
use rollchat_providers::GeminiProvider;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub async fn run(
    config_path: Option<&Path>,
    history_file: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load_with(config_path)
        .map_err(|e| format!("Failed to load config: {e}"))?;

    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    export GEMINI_API_KEY='...'      (recommended)");
        eprintln!("    export ROLLCHAT_API_KEY='...'    (takes priority)");
        eprintln!();
        eprintln!("  Or add `api_key = \"...\"` to your config file:");
        let shown = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(AppConfig::config_path);
        eprintln!("    {}", shown.display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let api_key = config.api_key.clone().unwrap_or_default();
    let provider = Arc::new(GeminiProvider::new(api_key, &config.base_url)?);

    let terminal = Arc::new(TerminalSink::new(Pacing {
        typing_delay: Duration::from_millis(config.display.typing_delay_ms),
        thinking_delay: Duration::from_millis(config.display.thinking_delay_ms),
        thinking_dots: config.display.thinking_dots,
    }));
    let sink: Arc<dyn OutputSink> = terminal.clone();

    let completion = CompletionClient::new(provider.clone(), &config.model, &config.directive)
        .with_sampling(config.completion_sampling())
        .with_retry(config.retry.max_retries, config.retry.delay())
        .with_notices(sink.clone());
    let summarizer =
        Summarizer::new(provider, &config.model).with_sampling(config.summary_sampling());

    let history_path = history_file.unwrap_or_else(|| config.history_file.clone());
    let store = Arc::new(JsonFileStore::new(history_path));

    let mut session = ChatSession::new(completion, summarizer, store, sink).with_policy(
        CompactionPolicy::new(
            config.compaction.summary_trigger,
            config.compaction.recent_keep,
        ),
    );
    let restored = session.restore().await;
    tracing::debug!(restored, model = %config.model, "Starting chat session");

    terminal.banner().await;

    let channel = CliChannel::new();
    let input = channel.start().await?;
    session.run(input).await;

    Ok(())
}
