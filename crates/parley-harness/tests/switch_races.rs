//! Room switch races and end-to-end session scenarios.
//!
//! Every fetch and join result is parked until the test delivers it, so each
//! test spells out the exact interleaving it checks.

use std::time::Duration;

use parley_core::{Message, Room, RoomId, SessionConfig, SessionPhase};
use parley_harness::{InvariantRegistry, SimBackend, SimSession};

fn id(raw: &str) -> RoomId {
    RoomId::new(raw).unwrap()
}

fn message(room: &RoomId, author: &str, text: &str) -> Message {
    Message {
        id: String::new(),
        room_id: room.clone(),
        author: author.into(),
        author_avatar_ref: None,
        text: text.into(),
        sent_at: String::new(),
    }
}

fn room(raw: &str, name: &str) -> Room {
    Room { id: id(raw), display_name: name.into(), picture_ref: None, member_count: 2, is_ai: false }
}

fn backend() -> SimBackend {
    SimBackend::new()
        .with_room(room("room-a", "Alpha"), vec![message(&id("room-a"), "ann", "a1")])
        .with_room(room("room-b", "Beta"), vec![message(&id("room-b"), "bob", "b1")])
        .with_public_history(vec![message(&RoomId::public(), "cat", "welcome")])
}

fn sim() -> SimSession {
    SimSession::new(SessionConfig::default(), backend())
        .with_invariants(InvariantRegistry::standard())
}

fn texts(sim: &SimSession) -> Vec<String> {
    sim.snapshot().visible_messages().iter().map(|m| m.text.clone()).collect()
}

#[test]
fn public_room_hello() {
    let mut sim = sim();
    sim.select(RoomId::public());
    sim.settle();

    assert_eq!(sim.snapshot().phase, SessionPhase::Active);
    assert_eq!(texts(&sim), ["welcome"]);

    sim.send("hello");
    assert_eq!(sim.sent().len(), 1);
    assert!(!sim.sent()[0].ai);
    assert_eq!(sim.draft(), "");

    // Server echoes the message back on the room subscription.
    sim.push(&RoomId::public(), vec![message(&RoomId::public(), "me", "hello")]);
    assert_eq!(texts(&sim), ["welcome", "hello"]);

    let snapshot = sim.snapshot();
    assert!(!snapshot.locked);
    assert_eq!(snapshot.cooldown_remaining, 3);

    sim.advance(Duration::from_secs(3));
    assert!(sim.snapshot().input_enabled());
}

#[test]
fn ai_room_explain_recursion() {
    let mut sim = sim();
    sim.select(RoomId::ai());
    assert_eq!(sim.pending_len(), 1, "only the join is requested");
    sim.settle();
    assert!(texts(&sim).is_empty());

    sim.send("explain recursion");
    let sent = &sim.sent()[0];
    assert!(sent.ai);
    assert_eq!(sent.text, "explain recursion");

    sim.push(&RoomId::ai(), vec![message(&RoomId::ai(), "me", "explain recursion")]);
    sim.advance(Duration::from_secs(4));

    let snapshot = sim.snapshot();
    assert!(snapshot.locked);
    assert_eq!(snapshot.cooldown_remaining, 0);
    assert_eq!(snapshot.input_placeholder, "Generating your response...");

    sim.send("and iteration?");
    assert_eq!(sim.sent().len(), 1, "second send refused while the assistant is busy");
    assert_eq!(sim.draft(), "and iteration?", "rejected draft stays in the input");

    sim.ai_reply("Recursion is when a function calls itself.");
    let snapshot = sim.snapshot();
    assert!(!snapshot.locked);
    assert!(!snapshot.placeholder_active);
    assert_eq!(texts(&sim), ["explain recursion", "Recursion is when a function calls itself."]);

    sim.send("and iteration?");
    assert_eq!(sim.sent().len(), 2);
}

#[test]
fn stream_error_unblocks_ai_room() {
    let mut sim = sim();
    sim.select(RoomId::ai());
    sim.settle();
    sim.send("question");

    sim.server_error(Some(RoomId::ai()), "Rate limit exceeded");
    assert!(!sim.snapshot().locked);
    assert_eq!(sim.snapshot().status.as_deref(), Some("Rate limit exceeded"));
    assert_eq!(sim.reported().len(), 1);
}

#[test]
fn late_history_for_previous_room_is_discarded() {
    let mut sim = sim();
    sim.select(id("room-a"));
    sim.select(id("room-b"));

    // room-a's results are still queued ahead of room-b's.
    assert_eq!(sim.pending_len(), 4);
    sim.settle();

    let snapshot = sim.snapshot();
    assert_eq!(snapshot.room_id, Some(id("room-b")));
    assert_eq!(snapshot.room.map(|r| r.display_name), Some("Beta".to_string()));
    assert_eq!(texts(&sim), ["b1"]);
}

#[test]
fn newest_results_first_still_converge() {
    let mut sim = sim();
    sim.select(id("room-a"));
    sim.select(id("room-b"));

    while sim.deliver_last() {}

    assert_eq!(sim.snapshot().room_id, Some(id("room-b")));
    assert_eq!(texts(&sim), ["b1"]);
}

#[test]
fn pushes_for_abandoned_room_never_render() {
    let mut sim = sim();
    sim.select(id("room-a"));
    sim.settle();
    sim.select(id("room-b"));

    assert!(!sim.subscriptions().contains(&id("room-a")));
    sim.push(&id("room-a"), vec![message(&id("room-a"), "ann", "late")]);
    sim.settle();

    assert_eq!(texts(&sim), ["b1"]);
}

#[test]
fn leaving_ai_room_mid_generation_resets_gate() {
    let mut sim = sim();
    sim.select(RoomId::ai());
    sim.settle();
    sim.send("question");

    sim.select(id("room-a"));
    sim.settle();
    let snapshot = sim.snapshot();
    assert!(!snapshot.locked);
    assert!(!snapshot.placeholder_active);
    assert_eq!(snapshot.cooldown_remaining, 0);

    sim.send("hi alpha");
    assert_eq!(sim.sent().len(), 2);
}

#[test]
fn join_landing_after_leaving_is_released() {
    let mut sim = sim();
    sim.select(RoomId::ai());
    sim.select(id("room-a"));
    sim.settle();

    assert_eq!(sim.subscriptions().iter().collect::<Vec<_>>(), [&id("room-a")]);
}

#[test]
fn returning_to_room_adopts_earlier_join() {
    let mut sim = sim();
    sim.select(RoomId::ai());
    sim.select(id("room-a"));
    sim.select(RoomId::ai());

    // First AI join lands while the second visit is in progress.
    sim.deliver_next();
    assert!(sim.subscriptions().contains(&RoomId::ai()));
    sim.settle();

    sim.select(id("room-b"));
    sim.settle();
    assert_eq!(sim.subscriptions().iter().collect::<Vec<_>>(), [&id("room-b")]);
}

#[test]
fn unknown_room_falls_back_and_reports() {
    let mut sim = sim();
    sim.select(id("nowhere"));
    sim.settle();

    let snapshot = sim.snapshot();
    assert_eq!(snapshot.phase, SessionPhase::Active);
    assert_eq!(snapshot.input_placeholder, "Message in nowhere...");
    assert_eq!(sim.reported().len(), 2, "metadata and history both failed");
    assert!(snapshot.status.is_some());
}

#[test]
fn failed_send_restores_draft() {
    let mut backend = backend();
    backend.fail_sends = true;
    let mut sim =
        SimSession::new(SessionConfig::default(), backend).with_invariants(InvariantRegistry::standard());

    sim.select(RoomId::ai());
    sim.settle();
    sim.send("lost words");
    assert_eq!(sim.draft(), "");

    sim.settle();
    assert_eq!(sim.draft(), "lost words");
    assert!(!sim.snapshot().locked);
    assert_eq!(sim.snapshot().status.as_deref(), Some("Failed to send message"));
}

#[test]
fn failed_join_keeps_room_usable() {
    let mut backend = backend();
    backend.fail_joins = true;
    let mut sim =
        SimSession::new(SessionConfig::default(), backend).with_invariants(InvariantRegistry::standard());

    sim.select(id("room-a"));
    sim.settle();

    assert_eq!(sim.snapshot().phase, SessionPhase::Active);
    assert!(sim.subscriptions().is_empty());
    sim.send("anyone?");
    assert_eq!(sim.sent().len(), 1);
}

#[test]
fn placeholder_reveal_transcript() {
    let mut sim = sim();
    sim.select(RoomId::ai());
    sim.settle();
    sim.send("question");

    let mut frames = Vec::new();
    for _ in 0..6 {
        sim.advance(Duration::from_millis(40));
        frames.push(sim.snapshot().input_placeholder);
    }

    insta::assert_snapshot!(frames.join("|"), @"G|Ge|Gen|Gene|Gener|Genera");
}
