//! Message store: the ordered, persisted turn log
//!
//! Every successful append writes the entire log back to persistent
//! storage (last-write-wins, no incremental persistence). A corrupt
//! persisted log must never prevent the chat surface from functioning,
//! so load failures are swallowed and the store starts empty.

use crate::chat::session::{ConversationSession, SessionState};
use crate::chat::turn::ChatTurn;
use crate::error::{Result, TaskchatError};
use crate::storage::Persistence;

/// Persisted key holding the serialized turn log
pub const KEY_MESSAGES: &str = "ai_chat_messages";

/// Persisted key holding the session identifier string
pub const KEY_CONVERSATION_ID: &str = "ai_chat_conversation_id";

/// Ordered log of chat turns plus the owned conversation session,
/// persisted across runs
pub struct MessageStore {
    persistence: Box<dyn Persistence>,
    turns: Vec<ChatTurn>,
    session: ConversationSession,
}

impl MessageStore {
    /// Create a store over `persistence`, reconstructing any previously
    /// saved log and session identifier
    ///
    /// Unparsable saved state is discarded with a warning; absence and
    /// corruption both degrade to an empty working session.
    pub fn load(persistence: Box<dyn Persistence>) -> Self {
        let turns = match persistence.get(KEY_MESSAGES) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<ChatTurn>>(&raw) {
                Ok(turns) => turns,
                Err(e) => {
                    tracing::warn!("Discarding unparsable saved conversation: {}", e);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!("Failed to read saved conversation: {}", e);
                Vec::new()
            }
        };

        let session = match persistence.get(KEY_CONVERSATION_ID) {
            Ok(Some(id)) if !id.is_empty() => ConversationSession::restore(id),
            Ok(_) => ConversationSession::new(),
            Err(e) => {
                tracing::warn!("Failed to read saved session identifier: {}", e);
                ConversationSession::new()
            }
        };

        tracing::debug!(
            "Loaded conversation: {} turns, session={}",
            turns.len(),
            session.id()
        );

        Self {
            persistence,
            turns,
            session,
        }
    }

    /// Append a turn to the end of the log and persist the full log
    ///
    /// Turns are append-only and strictly ordered by creation; nothing is
    /// ever mutated or reordered after this call.
    pub fn append(&mut self, turn: ChatTurn) -> Result<()> {
        self.turns.push(turn);
        let serialized =
            serde_json::to_string(&self.turns).map_err(TaskchatError::Serialization)?;
        self.persistence.set(KEY_MESSAGES, &serialized)?;
        Ok(())
    }

    /// Empty the log, reset the session to the sentinel, and erase the
    /// persisted copies
    ///
    /// Idempotent: clearing an already-empty store leaves the same
    /// `Empty` state.
    pub fn clear(&mut self) -> Result<()> {
        self.turns.clear();
        self.session.reset();
        self.persistence.delete(KEY_MESSAGES)?;
        self.persistence.delete(KEY_CONVERSATION_ID)?;
        Ok(())
    }

    /// The turn log, in exact append order
    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    /// Number of turns in the log
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether the log holds no turns
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Current session identifier (possibly the `"new"` sentinel)
    pub fn session_id(&self) -> &str {
        self.session.id()
    }

    /// Session lifecycle state
    pub fn session_state(&self) -> SessionState {
        self.session.state()
    }

    /// Adopt a backend-returned session identifier and persist it
    ///
    /// No-op (returning `false`) unless the session still holds the
    /// sentinel; the persisted identifier is written before any further
    /// dispatch can observe it.
    pub fn adopt_session(&mut self, id: &str) -> Result<bool> {
        if self.session.adopt(id) {
            self.persistence.set(KEY_CONVERSATION_ID, id)?;
            tracing::debug!("Adopted session identifier: {}", id);
            Ok(true)
        } else {
            Ok(false)
        }
    }
}
