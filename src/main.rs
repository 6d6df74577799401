//! Chatdesk - multi-chat assistant CLI
//!
#![doc = "Main entry point for the Chatdesk application."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use chatdesk::cli::{Cli, Commands};
use chatdesk::commands;
use chatdesk::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Chat {
            chat,
            show_archived,
        } => {
            if let Some(c) = &chat {
                tracing::debug!("Opening chat: {}", c);
            }
            commands::chat::run_chat(config, chat, show_archived).await?;
            Ok(())
        }
        Commands::Chats { command } => {
            tracing::info!("Starting chats command");
            commands::chats::handle_chats(&config, command).await?;
            Ok(())
        }
        Commands::History { id, json } => {
            tracing::info!("Starting history command");
            commands::history::handle_history(&config, &id, json).await?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
///
/// Logs go to stderr so command output on stdout stays clean.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "chatdesk=debug" } else { "chatdesk=info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
