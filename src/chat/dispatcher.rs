//! Command dispatcher: one user utterance in, one normalized reply out
//!
//! The dispatcher is the only suspend point in the core. It enforces the
//! single-flight gate, appends the user turn optimistically before the
//! network call, normalizes the backend's dual-shape reply into one
//! canonical [`CommandReply`], records failures as system turns, and
//! signals the [`ActionNotifier`] for non-clarify actions.

use crate::chat::notifier::ActionNotifier;
use crate::chat::store::MessageStore;
use crate::chat::turn::{ActionKind, ChatTurn};
use crate::error::{Result, TaskchatError};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Literal content used when a success reply carries neither a `message`
/// nor a `reply` field
pub const NO_RESPONSE_FALLBACK: &str = "No response from AI";

/// Outbound request body for the command endpoint
///
/// `conversationId` is named for its conversational-memory role on the
/// backend, not a network-session concept.
#[derive(Debug, Clone, Serialize)]
pub struct CommandRequest {
    /// Trimmed user utterance
    pub message: String,
    /// Current session identifier, possibly the `"new"` sentinel
    #[serde(rename = "conversationId")]
    pub conversation_id: String,
}

/// Success reply exactly as the backend sends it
///
/// The field holding the human-readable text may be named `message` or
/// `reply` depending on the backend revision; both are tolerated here and
/// collapsed by [`CommandReply::from_wire`]. Unknown extra fields are
/// ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireReply {
    /// Reply text, first-choice field name
    #[serde(default)]
    pub message: Option<String>,
    /// Reply text, synonym used by older backend revisions
    #[serde(default)]
    pub reply: Option<String>,
    /// Backend-assigned conversation identifier
    #[serde(default)]
    pub conversation_id: Option<String>,
    /// Wire name of the executed action, if any
    #[serde(default)]
    pub action: Option<String>,
    /// Action-specific data (created task, task list)
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

/// Canonical reply shape; the dual-field ambiguity never leaks past here
#[derive(Debug, Clone)]
pub struct CommandReply {
    /// Human-readable reply text
    pub content: String,
    /// Backend-assigned conversation identifier, if present
    pub conversation_id: Option<String>,
    /// Executed action, if present and recognized
    pub action: Option<ActionKind>,
    /// Action-specific payload
    pub data: Option<serde_json::Value>,
}

impl CommandReply {
    /// Normalize a raw wire reply
    ///
    /// Prefers `message` over `reply` when both are present and falls
    /// back to a literal placeholder when neither is. Unrecognized action
    /// names are dropped with a warning rather than failing the exchange.
    pub fn from_wire(wire: WireReply) -> Self {
        let content = wire
            .message
            .or(wire.reply)
            .unwrap_or_else(|| NO_RESPONSE_FALLBACK.to_string());

        let action = wire.action.as_deref().and_then(|name| {
            let parsed = ActionKind::from_wire(name);
            if parsed.is_none() {
                tracing::warn!("Ignoring unknown action in reply: {}", name);
            }
            parsed
        });

        Self {
            content,
            conversation_id: wire.conversation_id,
            action,
            data: wire.data,
        }
    }
}

/// Transport seam between the dispatcher and the AI command endpoint
///
/// Production uses [`HttpEndpoint`]; tests substitute scripted
/// implementations.
#[async_trait]
pub trait CommandEndpoint: Send + Sync {
    /// Perform one command round trip
    ///
    /// # Errors
    ///
    /// Returns `TaskchatError::Backend` for non-2xx replies (detail
    /// surfaced verbatim), `TaskchatError::Http` for transport failures,
    /// and `TaskchatError::Dispatch` for malformed success bodies.
    async fn send_command(&self, request: &CommandRequest) -> Result<WireReply>;
}

/// HTTP implementation of [`CommandEndpoint`] backed by `reqwest`
pub struct HttpEndpoint {
    client: Client,
    url: String,
}

impl HttpEndpoint {
    /// Build an endpoint for `POST {api_base}/ai-chat/command`
    ///
    /// The timeout applies per request; expiry surfaces as a transport
    /// failure like any other network error.
    pub fn new(api_base: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("taskchat/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TaskchatError::Dispatch(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: join_url(api_base, "ai-chat/command"),
        })
    }

    /// Full URL of the command endpoint
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl CommandEndpoint for HttpEndpoint {
    async fn send_command(&self, request: &CommandRequest) -> Result<WireReply> {
        tracing::debug!(
            "Sending command: session={}, url={}",
            request.conversation_id,
            self.url
        );

        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(TaskchatError::Http)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = extract_detail(&body, status.as_u16());
            tracing::warn!("Command endpoint returned {}: {}", status, detail);
            return Err(TaskchatError::Backend {
                status: status.as_u16(),
                detail,
            }
            .into());
        }

        let wire: WireReply = response
            .json()
            .await
            .map_err(|e| TaskchatError::Dispatch(format!("Malformed reply body: {}", e)))?;
        Ok(wire)
    }
}

/// Join an API base and a path with exactly one slash between them
///
/// Configured bases arrive both with and without a trailing slash; both
/// must produce the same request URL.
pub fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Pull the human-readable detail string out of an error body
///
/// The backend sends `{"detail": "..."}`; that string is surfaced
/// verbatim. Non-JSON bodies are used as-is, and an empty body falls back
/// to the status code.
fn extract_detail(body: &str, status: u16) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(detail) = value.get("detail").and_then(|d| d.as_str()) {
            return detail.to_string();
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("Request failed with status {}", status)
    } else {
        trimmed.to_string()
    }
}

/// Clears the in-flight flag on every exit path
struct LoadingGuard<'a>(&'a AtomicBool);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Single-flight command dispatcher
///
/// At most one dispatch is in progress at a time; turns are therefore
/// strictly serialized and no request reconciliation is needed.
pub struct CommandDispatcher {
    endpoint: Box<dyn CommandEndpoint>,
    notifier: ActionNotifier,
    in_flight: AtomicBool,
}

impl CommandDispatcher {
    /// Create a dispatcher over an arbitrary endpoint implementation
    pub fn new(endpoint: Box<dyn CommandEndpoint>) -> Self {
        Self {
            endpoint,
            notifier: ActionNotifier::new(),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Create a dispatcher over the production HTTP endpoint
    pub fn http(api_base: &str, timeout: Duration) -> Result<Self> {
        Ok(Self::new(Box::new(HttpEndpoint::new(api_base, timeout)?)))
    }

    /// Register the external task-list collaborator callback
    pub fn on_action_executed<F>(&mut self, callback: F)
    where
        F: Fn(ActionKind, Option<&serde_json::Value>) + Send + Sync + 'static,
    {
        self.notifier.on_action_executed(callback);
    }

    /// Whether a dispatch is currently in flight
    ///
    /// UI callers must disable input while this is true.
    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Dispatch a user utterance through the command endpoint
    ///
    /// Returns `Ok(None)` when the dispatch was rejected locally: an
    /// empty (after trim) utterance, or another dispatch already in
    /// flight. In both cases no turn is appended and no network call is
    /// made.
    ///
    /// On success the user and assistant turns have been appended, the
    /// session identifier adopted if it was still the sentinel, and the
    /// notifier fired for any non-clarify action.
    ///
    /// # Errors
    ///
    /// Backend-facing failures are recorded as a system turn carrying the
    /// error's message text, then re-raised so callers may surface them
    /// additionally. The loading flag is cleared on every path.
    pub async fn dispatch(
        &self,
        store: &mut MessageStore,
        input: &str,
    ) -> Result<Option<CommandReply>> {
        let text = input.trim();
        if text.is_empty() {
            return Ok(None);
        }
        if self.in_flight.swap(true, Ordering::SeqCst) {
            tracing::debug!("Dispatch rejected: another dispatch is in flight");
            return Ok(None);
        }
        let _guard = LoadingGuard(&self.in_flight);

        // Optimistic: the user's turn lands before the network call so a
        // failed exchange still shows what was typed.
        store.append(ChatTurn::user(text))?;

        let request = CommandRequest {
            message: text.to_string(),
            conversation_id: store.session_id().to_string(),
        };

        let wire = match self.endpoint.send_command(&request).await {
            Ok(wire) => wire,
            Err(err) => {
                if let Err(append_err) = store.append(ChatTurn::system(err.to_string())) {
                    tracing::warn!("Failed to record error turn: {}", append_err);
                }
                return Err(err);
            }
        };

        let reply = CommandReply::from_wire(wire);

        // Adopt-once: refuses anything but the sentinel-to-concrete
        // transition, and persists before the next dispatch can start.
        if let Some(id) = &reply.conversation_id {
            store.adopt_session(id)?;
        }

        store.append(ChatTurn::assistant(
            reply.content.clone(),
            reply.action,
            reply.data.clone(),
        ))?;

        if let Some(action) = reply.action {
            self.notifier.notify(action, reply.data.as_ref());
        }

        Ok(Some(reply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::session::NEW_SESSION;
    use crate::chat::turn::Role;
    use crate::storage::MemoryPersistence;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;
    use std::sync::{Arc, Mutex};

    /// Endpoint that pops pre-scripted results and records requests
    struct ScriptedEndpoint {
        replies: Mutex<VecDeque<std::result::Result<WireReply, TaskchatError>>>,
        requests: Mutex<Vec<CommandRequest>>,
    }

    impl ScriptedEndpoint {
        fn new(replies: Vec<std::result::Result<WireReply, TaskchatError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl CommandEndpoint for Arc<ScriptedEndpoint> {
        async fn send_command(&self, request: &CommandRequest) -> Result<WireReply> {
            self.requests.lock().unwrap().push(request.clone());
            match self.replies.lock().unwrap().pop_front() {
                Some(Ok(wire)) => Ok(wire),
                Some(Err(err)) => Err(err.into()),
                None => panic!("ScriptedEndpoint ran out of replies"),
            }
        }
    }

    fn store() -> MessageStore {
        MessageStore::load(Box::new(MemoryPersistence::new()))
    }

    fn buy_milk_reply() -> WireReply {
        WireReply {
            message: Some("Added 'buy milk' to your tasks.".to_string()),
            conversation_id: Some("abc123".to_string()),
            action: Some("create_task".to_string()),
            data: Some(serde_json::json!({"id": "t1", "title": "buy milk"})),
            ..WireReply::default()
        }
    }

    #[tokio::test]
    async fn test_successful_dispatch_appends_user_then_assistant() {
        let endpoint = ScriptedEndpoint::new(vec![Ok(buy_milk_reply())]);
        let dispatcher = CommandDispatcher::new(Box::new(Arc::clone(&endpoint)));
        let mut store = store();

        let reply = dispatcher
            .dispatch(&mut store, "Add a task to buy milk")
            .await
            .unwrap()
            .expect("dispatch should complete");

        assert_eq!(reply.content, "Added 'buy milk' to your tasks.");
        assert_eq!(store.len(), 2);
        assert_eq!(store.turns()[0].role, Role::User);
        assert_eq!(store.turns()[0].content, "Add a task to buy milk");
        assert_eq!(store.turns()[1].role, Role::Assistant);
        assert_eq!(store.turns()[1].action, Some(ActionKind::CreateTask));
        assert!(!dispatcher.is_loading());
    }

    #[tokio::test]
    async fn test_request_carries_message_and_sentinel_session() {
        let endpoint = ScriptedEndpoint::new(vec![Ok(buy_milk_reply())]);
        let dispatcher = CommandDispatcher::new(Box::new(Arc::clone(&endpoint)));
        let mut store = store();

        dispatcher
            .dispatch(&mut store, "Add a task to buy milk")
            .await
            .unwrap();

        let requests = endpoint.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].message, "Add a task to buy milk");
        assert_eq!(requests[0].conversation_id, NEW_SESSION);
    }

    #[tokio::test]
    async fn test_session_adopted_only_from_sentinel() {
        let second = WireReply {
            message: Some("Done.".to_string()),
            conversation_id: Some("zzz999".to_string()),
            ..WireReply::default()
        };
        let endpoint = ScriptedEndpoint::new(vec![Ok(buy_milk_reply()), Ok(second)]);
        let dispatcher = CommandDispatcher::new(Box::new(Arc::clone(&endpoint)));
        let mut store = store();

        dispatcher.dispatch(&mut store, "first").await.unwrap();
        assert_eq!(store.session_id(), "abc123");

        dispatcher.dispatch(&mut store, "second").await.unwrap();
        // An already-active session's identifier is never overwritten.
        assert_eq!(store.session_id(), "abc123");

        let requests = endpoint.requests.lock().unwrap();
        assert_eq!(requests[1].conversation_id, "abc123");
    }

    #[tokio::test]
    async fn test_empty_input_makes_no_network_call() {
        let endpoint = ScriptedEndpoint::new(vec![]);
        let dispatcher = CommandDispatcher::new(Box::new(Arc::clone(&endpoint)));
        let mut store = store();

        let result = dispatcher.dispatch(&mut store, "   ").await.unwrap();
        assert!(result.is_none());
        assert!(store.is_empty());
        assert_eq!(endpoint.request_count(), 0);
    }

    #[tokio::test]
    async fn test_in_flight_dispatch_blocks_new_dispatch() {
        let endpoint = ScriptedEndpoint::new(vec![]);
        let dispatcher = CommandDispatcher::new(Box::new(Arc::clone(&endpoint)));
        let mut store = store();

        dispatcher.in_flight.store(true, Ordering::SeqCst);
        let result = dispatcher.dispatch(&mut store, "hello").await.unwrap();
        assert!(result.is_none());
        assert!(store.is_empty());
        assert_eq!(endpoint.request_count(), 0);
    }

    #[tokio::test]
    async fn test_failure_appends_user_then_system_and_reraises() {
        let endpoint = ScriptedEndpoint::new(vec![Err(TaskchatError::Backend {
            status: 500,
            detail: "AI service unavailable".to_string(),
        })]);
        let dispatcher = CommandDispatcher::new(Box::new(Arc::clone(&endpoint)));
        let mut store = store();

        let result = dispatcher.dispatch(&mut store, "hello").await;
        assert!(result.is_err());

        assert_eq!(store.len(), 2);
        assert_eq!(store.turns()[0].role, Role::User);
        assert_eq!(store.turns()[1].role, Role::System);
        assert_eq!(store.turns()[1].content, "AI service unavailable");
        assert!(!dispatcher.is_loading());
    }

    #[tokio::test]
    async fn test_notifier_fires_once_with_action_and_payload() {
        let endpoint = ScriptedEndpoint::new(vec![Ok(buy_milk_reply())]);
        let mut dispatcher = CommandDispatcher::new(Box::new(Arc::clone(&endpoint)));

        let seen: Arc<Mutex<Vec<(ActionKind, Option<serde_json::Value>)>>> =
            Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        dispatcher.on_action_executed(move |action, payload| {
            seen_clone.lock().unwrap().push((action, payload.cloned()));
        });

        let mut store = store();
        dispatcher
            .dispatch(&mut store, "Add a task to buy milk")
            .await
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, ActionKind::CreateTask);
        assert_eq!(
            seen[0].1,
            Some(serde_json::json!({"id": "t1", "title": "buy milk"}))
        );
    }

    #[tokio::test]
    async fn test_notifier_silent_for_clarify_and_missing_action() {
        let clarify = WireReply {
            message: Some("Which task did you mean?".to_string()),
            action: Some("clarify".to_string()),
            ..WireReply::default()
        };
        let no_action = WireReply {
            message: Some("Hello!".to_string()),
            ..WireReply::default()
        };
        let endpoint = ScriptedEndpoint::new(vec![Ok(clarify), Ok(no_action)]);
        let mut dispatcher = CommandDispatcher::new(Box::new(Arc::clone(&endpoint)));

        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = Arc::clone(&count);
        dispatcher.on_action_executed(move |_, _| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        let mut store = store();
        dispatcher.dispatch(&mut store, "do something").await.unwrap();
        dispatcher.dispatch(&mut store, "hi").await.unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_normalization_prefers_message_over_reply() {
        let reply = CommandReply::from_wire(WireReply {
            message: Some("from message".to_string()),
            reply: Some("from reply".to_string()),
            ..WireReply::default()
        });
        assert_eq!(reply.content, "from message");
    }

    #[test]
    fn test_normalization_falls_back_to_reply_field() {
        let reply = CommandReply::from_wire(WireReply {
            reply: Some("from reply".to_string()),
            ..WireReply::default()
        });
        assert_eq!(reply.content, "from reply");
    }

    #[test]
    fn test_normalization_placeholder_when_neither_present() {
        let reply = CommandReply::from_wire(WireReply::default());
        assert_eq!(reply.content, NO_RESPONSE_FALLBACK);
    }

    #[test]
    fn test_normalization_drops_unknown_action() {
        let reply = CommandReply::from_wire(WireReply {
            message: Some("ok".to_string()),
            action: Some("bulk_complete".to_string()),
            ..WireReply::default()
        });
        assert!(reply.action.is_none());
    }

    #[test]
    fn test_join_url_trailing_slash_variants() {
        assert_eq!(
            join_url("http://localhost:8000/api", "ai-chat/command"),
            "http://localhost:8000/api/ai-chat/command"
        );
        assert_eq!(
            join_url("http://localhost:8000/api/", "ai-chat/command"),
            "http://localhost:8000/api/ai-chat/command"
        );
        assert_eq!(
            join_url("http://localhost:8000/api/", "/ai-chat/command"),
            "http://localhost:8000/api/ai-chat/command"
        );
    }

    #[test]
    fn test_extract_detail_from_json_body() {
        assert_eq!(
            extract_detail(r#"{"detail": "AI service unavailable"}"#, 500),
            "AI service unavailable"
        );
    }

    #[test]
    fn test_extract_detail_plain_body() {
        assert_eq!(extract_detail("gateway exploded", 502), "gateway exploded");
    }

    #[test]
    fn test_extract_detail_empty_body_uses_status() {
        assert_eq!(extract_detail("", 503), "Request failed with status 503");
    }
}
