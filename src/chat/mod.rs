//! Conversational task-action protocol
//!
//! Client-side contract between a chat surface and a remote AI command
//! endpoint: the ordered turn log and its persistence, the conversation
//! session lifecycle, the single-flight command dispatcher with reply
//! normalization, the action notifier toward task-list collaborators,
//! and the panel visibility controller.

pub mod dispatcher;
pub mod notifier;
pub mod panel;
pub mod session;
pub mod store;
pub mod turn;

pub use dispatcher::{
    CommandDispatcher, CommandEndpoint, CommandReply, CommandRequest, HttpEndpoint, WireReply,
    NO_RESPONSE_FALLBACK,
};
pub use notifier::ActionNotifier;
pub use panel::{PanelController, PanelVisibility};
pub use session::{ConversationSession, SessionState, NEW_SESSION};
pub use store::{MessageStore, KEY_CONVERSATION_ID, KEY_MESSAGES};
pub use turn::{ActionKind, ChatTurn, Role};
