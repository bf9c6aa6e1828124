//! End-to-end runtime tests against the in-process server.
//!
//! Time is paused, so fetch delays, cooldowns and assistant latency elapse
//! instantly and deterministically.

use std::time::Duration;

use parley_app::{
    Credential, Notice, RoomApi, Runtime, RuntimeConfig, RuntimeError, SessionContext,
    SessionHandle, SystemEnv, Transport, TransportEvent,
    local::LocalBackend,
};
use parley_core::{
    FetchError, Message, OutgoingMessage, Room, RoomId, SessionConfig, SessionPhase,
    SessionSnapshot, TransportError,
};
use tokio::{sync::mpsc, task::JoinHandle};

fn alpha() -> RoomId {
    RoomId::new("66aa00000000000000000001").unwrap()
}

fn backend() -> LocalBackend {
    LocalBackend::new().with_room(Room {
        id: alpha(),
        display_name: "Alpha".into(),
        picture_ref: None,
        member_count: 4,
        is_ai: false,
    })
}

fn start(backend: &LocalBackend, fetch_delay: Duration) -> (SessionHandle, JoinHandle<SessionContext>) {
    let server = backend.spawn_server("ann", Duration::from_secs(2));
    let (transport, pushes) = server.connect(16);

    let (runtime, handle) = Runtime::new(
        SystemEnv::new(),
        backend.api(fetch_delay),
        transport,
        pushes,
        SessionContext::logged_in("token"),
        SessionConfig::default(),
        &RuntimeConfig::default(),
    )
    .unwrap();

    (handle, tokio::spawn(runtime.run()))
}

async fn wait_for(handle: &SessionHandle, check: impl FnMut(&SessionSnapshot) -> bool) -> SessionSnapshot {
    let mut watch = handle.watch();
    let snapshot = watch.wait_for(check).await.unwrap().clone();
    snapshot
}

fn texts(snapshot: &SessionSnapshot) -> Vec<&str> {
    snapshot.visible_messages().iter().map(|m| m.text.as_str()).collect()
}

#[tokio::test(start_paused = true)]
async fn public_room_roundtrip() {
    let backend = backend();
    let (handle, _task) = start(&backend, Duration::from_millis(300));

    handle.select_room(RoomId::public()).await.unwrap();
    let snapshot = wait_for(&handle, |s| s.phase == SessionPhase::Active).await;
    assert_eq!(snapshot.input_placeholder, "Message in Public Room...");

    handle.send_message("hello").await.unwrap();
    let snapshot = wait_for(&handle, |s| !s.messages.is_empty()).await;
    assert_eq!(texts(&snapshot), ["hello"]);
    assert!(snapshot.cooldown_remaining > 0);

    let snapshot = wait_for(&handle, |s| s.cooldown_remaining == 0).await;
    assert!(snapshot.input_enabled());
}

#[tokio::test(start_paused = true)]
async fn ai_room_waits_for_reply() {
    let backend = backend();
    let (handle, _task) = start(&backend, Duration::ZERO);

    handle.select_room(RoomId::ai()).await.unwrap();
    wait_for(&handle, |s| s.phase == SessionPhase::Active).await;

    handle.send_message("explain recursion").await.unwrap();
    let snapshot = wait_for(&handle, |s| s.locked).await;
    assert!(snapshot.placeholder_active);

    let snapshot = wait_for(&handle, |s| s.messages.iter().any(Message::is_ai)).await;
    assert!(!snapshot.locked);
    assert!(!snapshot.placeholder_active);
    assert_eq!(snapshot.messages[0].text, "explain recursion");
}

#[tokio::test(start_paused = true)]
async fn quick_switch_shows_only_final_room() {
    let backend = backend();
    let (handle, _task) = start(&backend, Duration::from_millis(500));

    handle.select_room(alpha()).await.unwrap();
    handle.select_room(RoomId::public()).await.unwrap();

    let snapshot = wait_for(&handle, |s| s.phase == SessionPhase::Active).await;
    assert_eq!(snapshot.room_id, Some(RoomId::public()));
    assert_eq!(snapshot.room.map(|r| r.display_name), Some("Public Room".to_string()));
}

#[tokio::test(start_paused = true)]
async fn logout_stops_runtime_and_drops_credential() {
    let backend = backend();
    let (handle, task) = start(&backend, Duration::ZERO);

    handle.select_room(alpha()).await.unwrap();
    wait_for(&handle, |s| s.phase == SessionPhase::Active).await;

    handle.logout().await.unwrap();
    let context = task.await.unwrap();
    assert!(!context.is_authenticated());
    assert_eq!(handle.snapshot().phase, SessionPhase::Idle);

    let err = handle.send_message("anyone?").await.unwrap_err();
    assert!(matches!(err, RuntimeError::Closed));
}

#[tokio::test]
async fn refuses_to_start_logged_out() {
    let backend = backend();
    let server = backend.spawn_server("ann", Duration::ZERO);
    let (transport, pushes) = server.connect(4);

    let result = Runtime::new(
        SystemEnv::new(),
        backend.api(Duration::ZERO),
        transport,
        pushes,
        SessionContext::new(),
        SessionConfig::default(),
        &RuntimeConfig::default(),
    );
    assert!(matches!(result, Err(RuntimeError::Unauthenticated)));
}

/// Transport whose dispatch always fails.
struct BrokenSend;

impl Transport for BrokenSend {
    async fn join(&self, _room_id: &RoomId) -> Result<(), TransportError> {
        Ok(())
    }

    async fn send(&self, _message: &OutgoingMessage) -> Result<(), TransportError> {
        Err(TransportError::Send("socket closed".into()))
    }

    fn release(&self, _room_id: &RoomId) {}
}

#[tokio::test(start_paused = true)]
async fn failed_send_restores_draft() {
    let backend = backend();
    let (_pushes_tx, pushes) = mpsc::channel::<TransportEvent>(4);
    let (runtime, handle) = Runtime::new(
        SystemEnv::new(),
        backend.api(Duration::ZERO),
        BrokenSend,
        pushes,
        SessionContext::logged_in("token"),
        SessionConfig::default(),
        &RuntimeConfig::default(),
    )
    .unwrap();
    let _task = tokio::spawn(runtime.run());
    let mut notices = handle.notices();

    handle.select_room(RoomId::ai()).await.unwrap();
    wait_for(&handle, |s| s.phase == SessionPhase::Active).await;
    handle.send_message("lost words").await.unwrap();

    assert_eq!(notices.recv().await.unwrap(), Notice::ClearInput);
    assert_eq!(notices.recv().await.unwrap(), Notice::RestoreInput("lost words".into()));
    assert!(matches!(notices.recv().await.unwrap(), Notice::Error(_)));

    let snapshot = wait_for(&handle, |s| !s.locked).await;
    assert_eq!(snapshot.status.as_deref(), Some("Failed to send message"));
}

/// REST collaborator that fails every request.
struct Offline;

impl RoomApi for Offline {
    async fn fetch_room(&self, _: &Credential, _: &RoomId) -> Result<Room, FetchError> {
        Err(FetchError::Network("connection refused".into()))
    }

    async fn fetch_history(&self, _: &Credential, _: &RoomId) -> Result<Vec<Message>, FetchError> {
        Err(FetchError::Network("connection refused".into()))
    }
}

#[tokio::test(start_paused = true)]
async fn offline_api_still_joins() {
    let backend = backend();
    let server = backend.spawn_server("ann", Duration::ZERO);
    let (transport, pushes) = server.connect(16);
    let (runtime, handle) = Runtime::new(
        SystemEnv::new(),
        Offline,
        transport,
        pushes,
        SessionContext::logged_in("token"),
        SessionConfig::default(),
        &RuntimeConfig::default(),
    )
    .unwrap();
    let _task = tokio::spawn(runtime.run());

    handle.select_room(alpha()).await.unwrap();
    let snapshot = wait_for(&handle, |s| s.phase == SessionPhase::Active).await;
    assert_eq!(snapshot.status.as_deref(), Some("network error: connection refused"));

    handle.send_message("still here").await.unwrap();
    let snapshot = wait_for(&handle, |s| !s.messages.is_empty()).await;
    assert_eq!(texts(&snapshot), ["still here"]);
}
