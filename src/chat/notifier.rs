//! Action notifier: tells external task-list collaborators that backend
//! state may have changed
//!
//! The notifier decouples the chat surface from whatever renders the task
//! list. It fires at most once per assistant turn whose action is present
//! and not `clarify`, passing the action and payload to a registered
//! callback. The callback is fire-and-forget: the dispatcher neither
//! awaits nor retries on its behalf, and the collaborator owns its own
//! refresh policy.

use crate::chat::turn::ActionKind;

/// Callback signature for action notifications
pub type ActionCallback = Box<dyn Fn(ActionKind, Option<&serde_json::Value>) + Send + Sync>;

/// Registry for the external action callback
#[derive(Default)]
pub struct ActionNotifier {
    callback: Option<ActionCallback>,
}

impl ActionNotifier {
    /// Create a notifier with no registered callback
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the external collaborator callback, replacing any
    /// previous registration
    pub fn on_action_executed<F>(&mut self, callback: F)
    where
        F: Fn(ActionKind, Option<&serde_json::Value>) + Send + Sync + 'static,
    {
        self.callback = Some(Box::new(callback));
    }

    /// Notify the collaborator of an executed action
    ///
    /// Does nothing for `clarify`, for a missing callback, or for a
    /// missing action (callers pass `None` action as no call at all).
    pub fn notify(&self, action: ActionKind, payload: Option<&serde_json::Value>) {
        if !action.is_notifiable() {
            return;
        }
        if let Some(callback) = &self.callback {
            tracing::debug!("Notifying collaborator: action={}", action);
            callback(action, payload);
        }
    }
}
