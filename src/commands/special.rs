//! Special commands parser for the interactive chat surface
//!
//! This module parses and handles special commands entered during a chat
//! session. Special commands control the panel, inspect or reset the
//! conversation, and exit the session, rather than being dispatched to
//! the AI endpoint.
//!
//! Commands are prefixed with `/` and are case-insensitive.

use crate::chat::PanelVisibility;
use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command was given an unsupported argument
    #[error("Unsupported argument for {command}: {arg}\n\nType '/help' to see valid usage")]
    UnsupportedArgument { command: String, arg: String },
}

/// Special commands that can be executed during interactive chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Change the panel visibility (`/show`, `/hide`, `/min`, `/panel <state>`)
    SetPanel(PanelVisibility),

    /// Print the conversation log so far (`/history`)
    ShowHistory,

    /// Clear the conversation log and reset the session (`/clear`)
    ClearConversation,

    /// Display session identifier, panel state, and turn count (`/status`)
    ShowStatus,

    /// Display help information (`/help`)
    Help,

    /// Exit the interactive session (`/exit`, `exit`, `quit`)
    Exit,

    /// Not a special command; dispatch as a regular utterance
    None,
}

/// Parse a user input string into a special command
///
/// Commands are case-insensitive. Input that does not start with `/`
/// (other than the bare `exit`/`quit` aliases) is [`SpecialCommand::None`].
///
/// # Errors
///
/// Returns [`CommandError::UnknownCommand`] for a `/`-prefixed input that
/// matches no command, and [`CommandError::UnsupportedArgument`] for a
/// known command with an invalid argument.
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    if !trimmed.starts_with('/') && lower != "exit" && lower != "quit" {
        return Ok(SpecialCommand::None);
    }

    match lower.as_str() {
        "/show" | "/open" => Ok(SpecialCommand::SetPanel(PanelVisibility::Open)),
        "/hide" | "/close" => Ok(SpecialCommand::SetPanel(PanelVisibility::Closed)),
        "/min" | "/minimize" => Ok(SpecialCommand::SetPanel(PanelVisibility::Minimized)),
        input if input.starts_with("/panel") => {
            let arg = input.trim_start_matches("/panel").trim();
            match PanelVisibility::parse_str(arg) {
                Ok(state) => Ok(SpecialCommand::SetPanel(state)),
                Err(_) => Err(CommandError::UnsupportedArgument {
                    command: "/panel".to_string(),
                    arg: arg.to_string(),
                }),
            }
        }
        "/history" => Ok(SpecialCommand::ShowHistory),
        "/clear" => Ok(SpecialCommand::ClearConversation),
        "/status" => Ok(SpecialCommand::ShowStatus),
        "/help" => Ok(SpecialCommand::Help),
        "/exit" | "/quit" | "exit" | "quit" => Ok(SpecialCommand::Exit),
        other => Err(CommandError::UnknownCommand(other.to_string())),
    }
}

/// Print help for the special commands
pub fn print_help() {
    println!("Available commands:");
    println!("  /show | /open       Open the chat panel");
    println!("  /hide | /close      Close the panel (replies are stored, not shown)");
    println!("  /min                Minimize the panel");
    println!("  /panel <state>      Set panel state: open, closed, minimized");
    println!("  /history            Print the conversation so far");
    println!("  /clear              Clear the conversation and start a new session");
    println!("  /status             Show session and panel status");
    println!("  /help               Show this help");
    println!("  /exit | exit | quit Leave the chat");
    println!();
    println!("Anything else is sent to the assistant, e.g.:");
    println!("  Add a task to buy milk");
    println!("  show my tasks");
    println!("  mark the milk task as done");
}
