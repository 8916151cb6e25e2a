//! Conversation session lifecycle
//!
//! The session identifier is an opaque token correlating turns with the
//! backend's dialogue memory. It begins as the `"new"` sentinel, becomes
//! concrete when the backend returns one in its first reply, and resets
//! only when the user explicitly clears the conversation.

/// Sentinel identifier meaning "no session yet established"
pub const NEW_SESSION: &str = "new";

/// Lifecycle state of a conversation session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No backend-assigned identifier yet
    Empty,
    /// A concrete identifier was adopted from a backend reply
    Active,
}

/// Owned session identifier with the sentinel transition rules
///
/// The message store and dispatcher both reference the session but the
/// only transitions are [`ConversationSession::adopt`] (once, out of the
/// sentinel) and [`ConversationSession::reset`] (explicit clear).
#[derive(Debug, Clone)]
pub struct ConversationSession {
    id: String,
}

impl Default for ConversationSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationSession {
    /// Create a session holding the `"new"` sentinel
    pub fn new() -> Self {
        Self {
            id: NEW_SESSION.to_string(),
        }
    }

    /// Restore a session from a previously persisted identifier
    pub fn restore(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// The current identifier, which may be the `"new"` sentinel
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether the session still holds the sentinel
    pub fn is_new(&self) -> bool {
        self.id == NEW_SESSION
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        if self.is_new() {
            SessionState::Empty
        } else {
            SessionState::Active
        }
    }

    /// Adopt a backend-returned identifier
    ///
    /// Only succeeds while the sentinel is held; an already-active
    /// session's identifier is never overwritten by a later reply.
    /// Returns `true` if the identifier was adopted.
    pub fn adopt(&mut self, id: &str) -> bool {
        if self.is_new() && id != NEW_SESSION && !id.is_empty() {
            self.id = id.to_string();
            true
        } else {
            false
        }
    }

    /// Reset back to the `"new"` sentinel (explicit clear only)
    pub fn reset(&mut self) {
        self.id = NEW_SESSION.to_string();
    }
}
