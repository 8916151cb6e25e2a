//! Taskchat - conversational task-assistant client
//!
//! Main entry point for the taskchat CLI.

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use taskchat::cli::{Cli, Commands};
use taskchat::commands;
use taskchat::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    // If the user supplied a state directory on the CLI, mirror it into
    // TASKCHAT_STATE_DIR so config loading picks it up uniformly with the
    // environment override.
    if let Some(state_dir) = &cli.state_dir {
        std::env::set_var("TASKCHAT_STATE_DIR", state_dir);
        tracing::info!("Using state directory override from CLI: {}", state_dir.display());
    }

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Chat { fresh, panel } => {
            tracing::info!("Starting interactive chat");
            if fresh {
                tracing::debug!("Discarding persisted conversation first");
            }
            commands::chat::run_chat(config, fresh, panel).await?;
            Ok(())
        }
        Commands::Send { message, json } => {
            tracing::info!("Dispatching one-shot command");
            commands::send::run_send(config, message, json).await?;
            Ok(())
        }
        Commands::History { json, limit } => {
            tracing::info!("Printing conversation history");
            commands::history::run_history(config, json, limit)?;
            Ok(())
        }
        Commands::Clear => {
            tracing::info!("Clearing conversation");
            commands::clear::run_clear(config)?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "taskchat=debug"
    } else {
        "taskchat=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
