//! Chat turn types
//!
//! A turn is one message in the conversation log, attributed to the user,
//! the assistant, or the system (error reporting). Turns are append-only:
//! once created they are never mutated, and corrections happen by
//! appending new turns.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Attribution of a chat turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Text typed by the user
    User,
    /// Reply produced by the AI command endpoint
    Assistant,
    /// Locally generated turn, e.g. a dispatch error message
    System,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
            Self::System => write!(f, "system"),
        }
    }
}

/// Structured signal from an assistant reply that a task mutation
/// occurred or was requested
///
/// `Clarify` means the assistant needs more input and no task state
/// changed; collaborators are never notified for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// A new task was created
    CreateTask,
    /// The task list was read
    ListTasks,
    /// An existing task was modified
    UpdateTask,
    /// A task was removed
    DeleteTask,
    /// A task was marked complete
    CompleteTask,
    /// The assistant asked a follow-up question; no task mutation
    Clarify,
}

impl ActionKind {
    /// Whether this action represents a concrete task mutation or read
    /// that external collaborators should be told about
    pub fn is_notifiable(&self) -> bool {
        !matches!(self, Self::Clarify)
    }

    /// Parse an action from its wire name; unknown names yield `None`
    ///
    /// The backend occasionally grows new action names. A reply carrying
    /// one must not fail the whole exchange, so unrecognized names are
    /// treated as "no action".
    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "create_task" => Some(Self::CreateTask),
            "list_tasks" => Some(Self::ListTasks),
            "update_task" => Some(Self::UpdateTask),
            "delete_task" => Some(Self::DeleteTask),
            "complete_task" => Some(Self::CompleteTask),
            "clarify" => Some(Self::Clarify),
            _ => None,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::CreateTask => "create_task",
            Self::ListTasks => "list_tasks",
            Self::UpdateTask => "update_task",
            Self::DeleteTask => "delete_task",
            Self::CompleteTask => "complete_task",
            Self::Clarify => "clarify",
        };
        write!(f, "{}", s)
    }
}

/// One message in the conversation log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    /// Unique turn identifier, assigned client-side at creation (ULID)
    pub id: String,

    /// Attribution of the turn
    pub role: Role,

    /// Text body; natural language, no validation on script
    pub content: String,

    /// Creation time (client clock, RFC-3339 UTC)
    pub timestamp: String,

    /// Action carried by an assistant turn, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<ActionKind>,

    /// Structured data accompanying the action (task record, task list)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_payload: Option<serde_json::Value>,
}

impl ChatTurn {
    /// Create a user turn from the (already trimmed) utterance
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content, None, None)
    }

    /// Create an assistant turn, optionally carrying an action and payload
    pub fn assistant(
        content: impl Into<String>,
        action: Option<ActionKind>,
        action_payload: Option<serde_json::Value>,
    ) -> Self {
        Self::new(Role::Assistant, content, action, action_payload)
    }

    /// Create a system turn; used to surface dispatch failures in the log
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content, None, None)
    }

    fn new(
        role: Role,
        content: impl Into<String>,
        action: Option<ActionKind>,
        action_payload: Option<serde_json::Value>,
    ) -> Self {
        Self {
            id: new_turn_id(),
            role,
            content: content.into(),
            timestamp: now_rfc3339(),
            action,
            action_payload,
        }
    }
}

/// Generate a new ULID for a turn
///
/// ULIDs are sortable by creation time, which matches the append-only
/// ordering of the log.
pub fn new_turn_id() -> String {
    Ulid::new().to_string()
}

/// Current UTC time in RFC-3339 format
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}
