//! Command-line interface definition for Taskchat
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for interactive chat, one-shot sends, history
//! inspection, and conversation reset.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Taskchat - conversational task-assistant client
///
/// Talk to the todo backend's AI command endpoint from the terminal.
/// Actions the assistant executes (create, update, complete, delete,
/// list) are reflected in the local task view.
#[derive(Parser, Debug, Clone)]
#[command(name = "taskchat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Directory for the persisted conversation (overrides config and
    /// TASKCHAT_STATE_DIR)
    #[arg(long)]
    pub state_dir: Option<PathBuf>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Taskchat
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the interactive chat surface
    Chat {
        /// Discard the persisted conversation before starting
        #[arg(long)]
        fresh: bool,

        /// Initial panel state: open, closed, or minimized
        #[arg(long, default_value = "open")]
        panel: String,
    },

    /// Send a single command and print the reply
    Send {
        /// Natural-language command for the assistant
        message: String,

        /// Print the normalized reply as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the persisted conversation log
    History {
        /// Print turns as JSON instead of formatted text
        #[arg(long)]
        json: bool,

        /// Show only the most recent N turns
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Clear the conversation log and session identifier
    Clear,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
