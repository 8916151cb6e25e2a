//! Conversation persistence integration tests
//!
//! Exercises the `MessageStore` over the production `sled` store:
//! reload across instances, corruption tolerance, clear semantics, and
//! append ordering.

use taskchat::chat::{ChatTurn, MessageStore, SessionState, NEW_SESSION};
use taskchat::storage::{Persistence, SledPersistence};
use tempfile::TempDir;

fn open(dir: &TempDir) -> MessageStore {
    let persistence =
        SledPersistence::open(dir.path().join("conversation.db")).expect("sled opens");
    MessageStore::load(Box::new(persistence))
}

#[test]
fn test_conversation_survives_reload() {
    let dir = TempDir::new().unwrap();
    {
        let mut store = open(&dir);
        store.append(ChatTurn::user("Add a task to buy milk")).unwrap();
        store
            .append(ChatTurn::assistant(
                "Added 'buy milk' to your tasks.",
                None,
                None,
            ))
            .unwrap();
        store.adopt_session("abc123").unwrap();
    }

    let store = open(&dir);
    assert_eq!(store.len(), 2);
    assert_eq!(store.turns()[0].content, "Add a task to buy milk");
    assert_eq!(store.session_id(), "abc123");
    assert_eq!(store.session_state(), SessionState::Active);
}

#[test]
fn test_append_order_preserved_across_reload() {
    let dir = TempDir::new().unwrap();
    {
        let mut store = open(&dir);
        for i in 0..10 {
            store.append(ChatTurn::user(format!("turn {}", i))).unwrap();
        }
    }

    let store = open(&dir);
    let contents: Vec<&str> = store.turns().iter().map(|t| t.content.as_str()).collect();
    let expected: Vec<String> = (0..10).map(|i| format!("turn {}", i)).collect();
    assert_eq!(contents, expected);
}

#[test]
fn test_corrupt_log_degrades_to_empty_session() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("conversation.db");
    {
        let persistence = SledPersistence::open(&path).unwrap();
        persistence.set("ai_chat_messages", "{definitely not json").unwrap();
        persistence.set("ai_chat_conversation_id", "abc123").unwrap();
    }

    let persistence = SledPersistence::open(&path).unwrap();
    let store = MessageStore::load(Box::new(persistence));
    // The log is discarded but the surviving session identifier is kept;
    // neither prevents the chat surface from functioning.
    assert!(store.is_empty());
    assert_eq!(store.session_id(), "abc123");
}

#[test]
fn test_clear_removes_persisted_state() {
    let dir = TempDir::new().unwrap();
    {
        let mut store = open(&dir);
        store.append(ChatTurn::user("hello")).unwrap();
        store.adopt_session("abc123").unwrap();
        store.clear().unwrap();
    }

    let store = open(&dir);
    assert!(store.is_empty());
    assert_eq!(store.session_id(), NEW_SESSION);
    assert_eq!(store.session_state(), SessionState::Empty);
}

#[test]
fn test_clear_twice_is_stable() {
    let dir = TempDir::new().unwrap();
    let mut store = open(&dir);
    store.append(ChatTurn::user("hello")).unwrap();

    store.clear().unwrap();
    let first_state = (store.len(), store.session_id().to_string());
    store.clear().unwrap();
    let second_state = (store.len(), store.session_id().to_string());

    assert_eq!(first_state, second_state);
    assert_eq!(first_state, (0, NEW_SESSION.to_string()));
}

#[test]
fn test_session_identifier_persisted_before_next_run() {
    let dir = TempDir::new().unwrap();
    {
        let mut store = open(&dir);
        assert!(store.adopt_session("abc123").unwrap());
    }
    // A later run must see the concrete identifier even though no turn
    // was ever appended.
    let store = open(&dir);
    assert_eq!(store.session_id(), "abc123");
}
