/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

It exposes four top-level command modules:

- `chat`    — Interactive chat surface
- `send`    — One-shot command dispatch
- `history` — Print the persisted conversation log
- `clear`   — Clear the conversation and session

These handlers are intentionally small and use the library components:
the message store, the command dispatcher, and the task-list view.
*/

use crate::chat::{ChatTurn, CommandDispatcher, MessageStore, Role};
use crate::config::Config;
use crate::error::{Result, TaskchatError};
use crate::storage::SledPersistence;
use colored::Colorize;
use std::time::Duration;

// Special commands parser for the interactive surface
pub mod special;

// Task-list collaborator (payload render + delayed refetch)
pub mod tasks;

/// Open the persisted message store for this configuration
pub fn open_store(config: &Config) -> Result<MessageStore> {
    let state_dir = config.resolve_state_dir()?;
    std::fs::create_dir_all(&state_dir)?;
    let persistence = SledPersistence::open(state_dir.join("conversation.db"))?;
    Ok(MessageStore::load(Box::new(persistence)))
}

/// Build the production dispatcher for this configuration
pub fn build_dispatcher(config: &Config) -> Result<CommandDispatcher> {
    CommandDispatcher::http(
        &config.backend.api_base,
        Duration::from_secs(config.backend.timeout_seconds),
    )
}

/// Print one turn with a role-colored tag
pub fn print_turn(turn: &ChatTurn) {
    let tag = match turn.role {
        Role::User => "you".cyan().bold(),
        Role::Assistant => "assistant".green().bold(),
        Role::System => "system".red().bold(),
    };
    println!("[{}] {}", tag, turn.content);
}

// Interactive chat handler
pub mod chat {
    //! Interactive chat surface.
    //!
    //! Runs a readline loop that submits user input to the command
    //! dispatcher. Slash commands control the panel and the conversation;
    //! everything else goes to the AI endpoint. Turns that arrive while
    //! the panel is closed or minimized are stored but not echoed, and
    //! `/show` replays them.

    use super::*;
    use crate::chat::{PanelController, PanelVisibility, SessionState};
    use crate::commands::special::{parse_special_command, print_help, SpecialCommand};
    use crate::commands::tasks::TaskListView;
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;

    /// Start the interactive chat surface
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration (consumed)
    /// * `fresh` - Discard the persisted conversation before starting
    /// * `panel` - Initial panel state name ("open", "closed", "minimized")
    pub async fn run_chat(config: Config, fresh: bool, panel: String) -> Result<()> {
        let mut store = open_store(&config)?;
        if fresh {
            store.clear()?;
        }

        let initial_panel = PanelVisibility::parse_str(&panel)
            .map_err(TaskchatError::Config)?;
        let mut panel = PanelController::new(initial_panel);

        let view = TaskListView::new(
            &config.backend.api_base,
            Duration::from_secs(config.backend.timeout_seconds),
            Duration::from_millis(config.chat.refresh_delay_ms),
        )?;
        let mut dispatcher = build_dispatcher(&config)?;
        dispatcher.on_action_executed(move |action, payload| view.handle_action(action, payload));

        let mut rl = DefaultEditor::new()?;

        print_welcome_banner(&store);

        // Replay the recent history so a resumed conversation has context
        // on screen.
        let replay_from = store
            .len()
            .saturating_sub(config.chat.history_limit);
        if panel.is_open() {
            for turn in &store.turns()[replay_from..] {
                print_turn(turn);
            }
        }
        // Index of the first turn not yet echoed to the terminal.
        let mut echoed = store.len();

        loop {
            let prompt = format!("{} >> ", panel.state().colored_tag());
            match rl.readline(&prompt) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }

                    match parse_special_command(trimmed) {
                        Ok(SpecialCommand::SetPanel(state)) => {
                            match state {
                                PanelVisibility::Open => panel.open(),
                                PanelVisibility::Closed => panel.close(),
                                PanelVisibility::Minimized => panel.minimize(),
                            }
                            println!("Panel: {}", panel.state());
                            echoed = flush_echo(&store, &panel, echoed);
                            continue;
                        }
                        Ok(SpecialCommand::ShowHistory) => {
                            for turn in store.turns() {
                                print_turn(turn);
                            }
                            echoed = store.len();
                            continue;
                        }
                        Ok(SpecialCommand::ClearConversation) => {
                            store.clear()?;
                            echoed = 0;
                            println!("Conversation cleared; starting a new session.");
                            continue;
                        }
                        Ok(SpecialCommand::ShowStatus) => {
                            print_status(&store, &panel, dispatcher.is_loading());
                            continue;
                        }
                        Ok(SpecialCommand::Help) => {
                            print_help();
                            continue;
                        }
                        Ok(SpecialCommand::Exit) => break,
                        Ok(SpecialCommand::None) => {}
                        Err(e) => {
                            println!("{}", e.to_string().yellow());
                            continue;
                        }
                    }

                    rl.add_history_entry(trimmed)?;

                    match dispatcher.dispatch(&mut store, trimmed).await {
                        Ok(Some(_)) | Ok(None) => {}
                        Err(e) => {
                            // The system turn already carries the message;
                            // log for --verbose diagnostics and keep going.
                            tracing::debug!("Dispatch failed: {}", e);
                        }
                    }
                    echoed = flush_echo(&store, &panel, echoed);
                    if !panel.is_open() && echoed < store.len() {
                        println!("{}", "(reply stored; /show to view)".dimmed());
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(e) => {
                    return Err(TaskchatError::Io(std::io::Error::new(
                        std::io::ErrorKind::Other,
                        e.to_string(),
                    ))
                    .into())
                }
            }
        }

        println!("Goodbye.");
        Ok(())
    }

    /// Echo turns that arrived since `echoed`, if the panel is open
    ///
    /// Returns the new high-water mark. A closed or minimized panel
    /// leaves the mark untouched so `/show` can replay what was missed.
    fn flush_echo(store: &MessageStore, panel: &PanelController, echoed: usize) -> usize {
        if !panel.is_open() {
            return echoed;
        }
        for turn in &store.turns()[echoed..] {
            print_turn(turn);
        }
        store.len()
    }

    fn print_welcome_banner(store: &MessageStore) {
        println!("{}", "taskchat — talk to your task assistant".bold());
        match store.session_state() {
            SessionState::Active => println!(
                "Resuming conversation {} ({} turns). Type /help for commands.",
                store.session_id(),
                store.len()
            ),
            SessionState::Empty => {
                println!("New conversation. Type /help for commands.")
            }
        }
        println!();
    }

    fn print_status(store: &MessageStore, panel: &PanelController, loading: bool) {
        println!("Session: {} ({:?})", store.session_id(), store.session_state());
        println!("Turns: {}", store.len());
        println!("Panel: {}", panel.state());
        println!("Dispatch in flight: {}", loading);
    }
}

// One-shot send handler
pub mod send {
    //! One-shot command dispatch.
    //!
    //! Sends a single utterance through the persisted conversation and
    //! prints the normalized reply. The conversation state on disk is the
    //! same one the interactive surface uses, so `send` and `chat`
    //! interleave cleanly.

    use super::*;

    /// Dispatch one command and print the reply
    pub async fn run_send(config: Config, message: String, json: bool) -> Result<()> {
        let mut store = open_store(&config)?;
        let dispatcher = build_dispatcher(&config)?;

        let reply = match dispatcher.dispatch(&mut store, &message).await? {
            Some(reply) => reply,
            None => {
                // Empty after trim; nothing was sent.
                return Err(TaskchatError::Dispatch("Nothing to send".to_string()).into());
            }
        };

        if json {
            let rendered = serde_json::json!({
                "content": reply.content,
                "conversation_id": store.session_id(),
                "action": reply.action.map(|a| a.to_string()),
                "data": reply.data,
            });
            println!("{}", serde_json::to_string_pretty(&rendered)?);
        } else {
            println!("{}", reply.content);
            if let Some(action) = reply.action {
                if action.is_notifiable() {
                    println!("{}", format!("(action: {})", action).dimmed());
                }
            }
        }
        Ok(())
    }
}

// History handler
pub mod history {
    //! Print the persisted conversation log.

    use super::*;

    /// Print the stored turns, newest last
    pub fn run_history(config: Config, json: bool, limit: Option<usize>) -> Result<()> {
        let store = open_store(&config)?;
        let turns = store.turns();
        let start = limit.map_or(0, |n| turns.len().saturating_sub(n));
        let shown = &turns[start..];

        if json {
            println!("{}", serde_json::to_string_pretty(shown)?);
        } else if shown.is_empty() {
            println!("No conversation history.");
        } else {
            for turn in shown {
                print_turn(turn);
            }
            println!();
            println!(
                "{}",
                format!("session: {}, {} turns total", store.session_id(), turns.len()).dimmed()
            );
        }
        Ok(())
    }
}

// Clear handler
pub mod clear {
    //! Clear the conversation log and session identifier.

    use super::*;

    /// Erase the persisted conversation and reset the session
    pub fn run_clear(config: Config) -> Result<()> {
        let mut store = open_store(&config)?;
        store.clear()?;
        println!("Conversation cleared.");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChatConfig;
    use tempfile::TempDir;

    fn config_with_state_dir(dir: &TempDir) -> Config {
        Config {
            chat: ChatConfig {
                state_dir: Some(dir.path().to_path_buf()),
                ..ChatConfig::default()
            },
            ..Config::default()
        }
    }

    #[test]
    fn test_open_store_creates_state_dir() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            chat: ChatConfig {
                state_dir: Some(dir.path().join("nested").join("state")),
                ..ChatConfig::default()
            },
            ..Config::default()
        };
        let store = open_store(&config).unwrap();
        assert!(store.is_empty());
        assert!(dir.path().join("nested").join("state").exists());
    }

    #[test]
    fn test_open_store_round_trips_turns() {
        let dir = TempDir::new().unwrap();
        let config = config_with_state_dir(&dir);
        {
            let mut store = open_store(&config).unwrap();
            store.append(ChatTurn::user("hello")).unwrap();
        }
        let store = open_store(&config).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.turns()[0].content, "hello");
    }

    #[test]
    fn test_build_dispatcher_from_default_config() {
        let config = Config::default();
        assert!(build_dispatcher(&config).is_ok());
    }

    #[test]
    fn test_run_clear_empties_persisted_store() {
        let dir = TempDir::new().unwrap();
        let config = config_with_state_dir(&dir);
        {
            let mut store = open_store(&config).unwrap();
            store.append(ChatTurn::user("hello")).unwrap();
            store.adopt_session("abc123").unwrap();
        }
        clear::run_clear(config.clone()).unwrap();
        let store = open_store(&config).unwrap();
        assert!(store.is_empty());
        assert_eq!(store.session_id(), crate::chat::NEW_SESSION);
    }

    #[test]
    fn test_run_history_on_empty_store_is_ok() {
        let dir = TempDir::new().unwrap();
        let config = config_with_state_dir(&dir);
        assert!(history::run_history(config, false, None).is_ok());
    }
}
