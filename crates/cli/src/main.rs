//! rollchat CLI — the main entry point.
//!
//! Commands:
//! - `chat`     — Interactive session (default when no command is given)
//! - `history`  — Print the saved transcript
//! - `config`   — Show, locate or initialize the config file

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "rollchat",
    about = "rollchat — terminal chat with a rolling conversation summary",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use this config file instead of ~/.rollchat/config.toml
    #[arg(short, long, global = true, env = "ROLLCHAT_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the assistant
    Chat {
        /// Override where the transcript is saved
        #[arg(long)]
        history_file: Option<PathBuf>,
    },

    /// Print the saved conversation
    History {
        #[arg(long)]
        history_file: Option<PathBuf>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration (API key redacted)
    Show,
    /// Print the config file path
    Path,
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing (stderr; stdout is the conversation)
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        None => commands::chat::run(config_path, None).await?,
        Some(Commands::Chat { history_file }) => {
            commands::chat::run(config_path, history_file).await?
        }
        Some(Commands::History { history_file }) => {
            commands::history::run(config_path, history_file).await?
        }
        Some(Commands::Config { action }) => match action {
            ConfigAction::Show => commands::config_cmd::show(config_path).await?,
            ConfigAction::Path => commands::config_cmd::path(config_path).await?,
            ConfigAction::Init { force } => commands::config_cmd::init(config_path, force).await?,
        },
    }

    Ok(())
}
