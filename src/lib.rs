//! Taskchat - conversational task-assistant client library
//!
//! This library implements the client side of a conversational
//! task-action protocol: the contract between a chat surface and a
//! remote AI command endpoint that executes todo mutations from natural
//! language.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `chat`: turn log, conversation session, command dispatcher, action
//!   notifier, and panel controller
//! - `storage`: string-keyed blob persistence (embedded `sled` database
//!   plus an in-memory store for tests)
//! - `commands`: CLI command handlers (interactive chat, one-shot send,
//!   history, clear)
//! - `config`: configuration management and validation
//! - `error`: error types and result aliases
//! - `cli`: command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use taskchat::chat::{CommandDispatcher, MessageStore};
//! use taskchat::storage::MemoryPersistence;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut store = MessageStore::load(Box::new(MemoryPersistence::new()));
//!     let dispatcher =
//!         CommandDispatcher::http("http://localhost:8000/api", Duration::from_secs(30))?;
//!
//!     if let Some(reply) = dispatcher
//!         .dispatch(&mut store, "Add a task to buy milk")
//!         .await?
//!     {
//!         println!("{}", reply.content);
//!     }
//!     Ok(())
//! }
//! ```

pub mod chat;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod storage;

// Re-export commonly used types
pub use chat::{
    ActionKind, ChatTurn, CommandDispatcher, CommandReply, MessageStore, PanelController,
    PanelVisibility, Role,
};
pub use config::Config;
pub use error::{Result, TaskchatError};
