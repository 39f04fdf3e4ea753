//! `rollchat history` — print the saved transcript.

use rollchat_config::AppConfig;
use rollchat_core::store::TranscriptStore;
use rollchat_memory::JsonFileStore;
use std::path::{Path, PathBuf};

pub async fn run(
    config_path: Option<&Path>,
    history_file: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load_with(config_path)
        .map_err(|e| format!("Failed to load config: {e}"))?;
    let path = history_file.unwrap_or(config.history_file);
    let store = JsonFileStore::new(&path);

    let transcript = store.load().await;
    if transcript.is_empty() {
        println!("No saved conversation at {}", path.display());
        return Ok(());
    }

    println!("{} turns in {}", transcript.len(), path.display());
    if transcript.summary().is_some() {
        println!("(older turns have been summarized)");
    }
    println!();
    println!("{}", transcript.flatten());
    Ok(())
}
