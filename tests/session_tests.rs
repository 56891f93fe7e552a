// Session registry and per-session state

use std::sync::Arc;
use subtitle_relay::error::RelayError;
use subtitle_relay::session::SessionRegistry;

#[test]
fn test_get_or_create_returns_same_session() {
    let registry = SessionRegistry::new();

    let first = registry.get_or_create("meeting-1");
    let second = registry.get_or_create("meeting-1");

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(registry.session_count(), 1);
}

#[tokio::test]
async fn test_sequence_strictly_increasing_under_concurrency() {
    let registry = Arc::new(SessionRegistry::new());
    registry.get_or_create("meeting-1");

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let registry = Arc::clone(&registry);
        tasks.push(tokio::spawn(async move {
            (0..100)
                .map(|_| registry.next_sequence("meeting-1").unwrap())
                .collect::<Vec<u64>>()
        }));
    }

    let mut all: Vec<u64> = Vec::new();
    for task in tasks {
        let sequences = task.await.unwrap();
        // Each caller sees its own sequence values increase
        assert!(sequences.windows(2).all(|w| w[0] < w[1]));
        all.extend(sequences);
    }

    // No duplicates across callers
    all.sort_unstable();
    let expected: Vec<u64> = (1..=800).collect();
    assert_eq!(all, expected);
}

#[test]
fn test_target_languages_union_of_joined_participants() {
    let registry = SessionRegistry::new();
    let session = registry.get_or_create("meeting-1");

    session.add_participant("alice", "Alice", "en");
    session.add_participant("bob", "Bob", "ko");
    session.add_participant("carol", "Carol", "en");

    assert_eq!(registry.target_languages("meeting-1"), vec!["en", "ko"]);

    // A departed participant no longer contributes a language
    session.remove_participant("bob");
    assert_eq!(registry.target_languages("meeting-1"), vec!["en"]);

    // Re-joining restores it
    session.add_participant("bob", "Bob", "ja");
    assert_eq!(registry.target_languages("meeting-1"), vec!["en", "ja"]);
}

#[test]
fn test_language_change_updates_union() {
    let registry = SessionRegistry::new();
    let session = registry.get_or_create("meeting-1");

    session.add_participant("alice", "Alice", "en");
    assert!(session.update_language("alice", "fr"));
    assert!(!session.update_language("ghost", "de"));

    assert_eq!(registry.target_languages("meeting-1"), vec!["fr"]);
}

#[test]
fn test_ended_session_fails_softly() {
    let registry = SessionRegistry::new();
    registry.get_or_create("meeting-1");
    registry.next_sequence("meeting-1").unwrap();

    let ended = registry.end_session("meeting-1").expect("session existed");
    assert!(!ended.is_active());

    // Late-arriving operations are soft errors, never panics
    match registry.next_sequence("meeting-1") {
        Err(RelayError::SessionNotFound(id)) => assert_eq!(id, "meeting-1"),
        other => panic!("Expected SessionNotFound, got {:?}", other),
    }
    assert!(registry.target_languages("meeting-1").is_empty());
    assert!(registry.end_session("meeting-1").is_none());
}

#[test]
fn test_drain_ends_everything() {
    let registry = SessionRegistry::new();
    registry.get_or_create("a");
    registry.get_or_create("b");

    let drained = registry.drain();
    assert_eq!(drained.len(), 2);
    assert!(drained.iter().all(|s| !s.is_active()));
    assert_eq!(registry.session_count(), 0);
}
