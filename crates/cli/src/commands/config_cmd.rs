//! `rollchat config` — Configuration management commands.

use rollchat_config::AppConfig;
use std::path::{Path, PathBuf};

fn target(config_path: Option<&Path>) -> PathBuf {
    config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(AppConfig::config_path)
}

pub async fn show(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load_with(config_path)
        .map_err(|e| format!("Failed to load config: {e}"))?;
    println!("{}", config.redacted_toml()?);
    Ok(())
}

pub async fn path(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", target(config_path).display());
    Ok(())
}

pub async fn init(
    config_path: Option<&Path>,
    force: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let path = target(config_path);

    if path.exists() && !force {
        println!("Config already exists at: {}", path.display());
        println!("Edit it manually or re-run with --force to overwrite.");
        return Ok(());
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, AppConfig::default_toml())?;
    println!("Created config.toml at: {}", path.display());
    println!("Set GEMINI_API_KEY (or add api_key to the file) before chatting.");
    Ok(())
}
