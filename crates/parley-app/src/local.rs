//! In-process room server.
//!
//! Serves the REST and socket sides from one shared store, with no network.
//! Frames flow through tokio channels as the same JSON a remote server would
//! send, so the full client stack runs unchanged against it.
//!
//! The AI room answers every message with a canned reply after a
//! configurable delay.

use std::{
    collections::{BTreeSet, HashMap},
    sync::{Arc, PoisonError, RwLock},
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use parley_core::{FetchError, Message, Room, RoomId};
use parley_proto::{AI_AUTHOR, ClientFrame, OutgoingMessage, ServerFrame};
use serde_json::json;
use tokio::sync::mpsc;

use crate::{ChannelTransport, Credential, RoomApi, TransportEvent};

/// Frames buffered in each direction.
const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Default)]
struct Store {
    rooms: HashMap<RoomId, Room>,
    messages: HashMap<RoomId, Vec<Message>>,
    next_id: u64,
}

/// Shared room store behind the local server and REST API.
#[derive(Debug, Clone, Default)]
pub struct LocalBackend {
    store: Arc<RwLock<Store>>,
}

impl LocalBackend {
    /// Empty store. The public and AI rooms always exist.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a room.
    #[must_use]
    pub fn with_room(self, room: Room) -> Self {
        self.write().rooms.insert(room.id.clone(), room);
        self
    }

    /// REST side with `fetch_delay` before every response.
    pub fn api(&self, fetch_delay: Duration) -> LocalRoomApi {
        LocalRoomApi { backend: self.clone(), fetch_delay }
    }

    /// Start the socket side for one client posting as `user`.
    pub fn spawn_server(&self, user: &str, ai_delay: Duration) -> ServerHandle {
        let (client_tx, server_rx) = mpsc::channel::<String>(CHANNEL_CAPACITY);
        let (server_tx, client_rx) = mpsc::channel::<String>(CHANNEL_CAPACITY);

        let session = ServerSession {
            backend: self.clone(),
            user: user.to_string(),
            ai_delay,
            joined: BTreeSet::new(),
            outbox: server_tx,
        };
        let handle = tokio::spawn(session.run(server_rx));

        ServerHandle {
            to_server: client_tx,
            from_server: client_rx,
            abort_handle: handle.abort_handle(),
        }
    }

    fn exists(&self, room_id: &RoomId) -> bool {
        Room::sentinel(room_id).is_some() || self.read().rooms.contains_key(room_id)
    }

    fn record(&self, room_id: &RoomId, author: &str, text: &str) -> Message {
        let mut store = self.write();
        store.next_id += 1;
        let message = Message {
            id: format!("{:024x}", store.next_id),
            room_id: room_id.clone(),
            author: author.to_string(),
            author_avatar_ref: (author != AI_AUTHOR).then(|| author.to_string()),
            text: text.to_string(),
            sent_at: timestamp(),
        };
        store.messages.entry(room_id.clone()).or_default().push(message.clone());
        message
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Store> {
        self.store.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Store> {
        self.store.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// [`RoomApi`] over a [`LocalBackend`].
#[derive(Debug, Clone)]
pub struct LocalRoomApi {
    backend: LocalBackend,
    fetch_delay: Duration,
}

impl RoomApi for LocalRoomApi {
    async fn fetch_room(&self, _credential: &Credential, room_id: &RoomId) -> Result<Room, FetchError> {
        tokio::time::sleep(self.fetch_delay).await;

        if let Some(room) = Room::sentinel(room_id) {
            return Ok(room);
        }
        self.backend.read().rooms.get(room_id).cloned().ok_or_else(not_found)
    }

    async fn fetch_history(
        &self,
        _credential: &Credential,
        room_id: &RoomId,
    ) -> Result<Vec<Message>, FetchError> {
        tokio::time::sleep(self.fetch_delay).await;

        if !self.backend.exists(room_id) {
            return Err(not_found());
        }
        Ok(self.backend.read().messages.get(room_id).cloned().unwrap_or_default())
    }
}

fn not_found() -> FetchError {
    FetchError::Http { status: 404, message: "Room not found!".into() }
}

/// Handle to a running local server.
pub struct ServerHandle {
    /// Send frames to the server.
    pub to_server: mpsc::Sender<String>,
    /// Receive frames from the server.
    pub from_server: mpsc::Receiver<String>,
    abort_handle: tokio::task::AbortHandle,
}

impl ServerHandle {
    /// Stop the server.
    pub fn stop(&self) {
        self.abort_handle.abort();
    }

    /// Attach a [`ChannelTransport`] to this connection.
    ///
    /// The server stops on its own once the transport is dropped.
    pub fn connect(self, capacity: usize) -> (ChannelTransport, mpsc::Receiver<TransportEvent>) {
        ChannelTransport::connect(self.to_server, self.from_server, capacity)
    }
}

/// Server side of one client connection.
struct ServerSession {
    backend: LocalBackend,
    user: String,
    ai_delay: Duration,
    joined: BTreeSet<RoomId>,
    outbox: mpsc::Sender<String>,
}

impl ServerSession {
    async fn run(mut self, mut inbox: mpsc::Receiver<String>) {
        while let Some(text) = inbox.recv().await {
            let frame = match ClientFrame::from_json(&text) {
                Ok(frame) => frame,
                Err(e) => {
                    self.emit(ServerFrame::Error(json!({ "error": e.to_string() }))).await;
                    continue;
                },
            };

            match frame {
                ClientFrame::Join(request) => {
                    if self.backend.exists(&request.room_id) {
                        self.joined.insert(request.room_id);
                    } else {
                        self.emit(ServerFrame::Error(json!("Room not found!"))).await;
                    }
                },
                ClientFrame::Leave(request) => {
                    self.joined.remove(&request.room_id);
                },
                ClientFrame::Message(outgoing) => self.post(outgoing).await,
            }
        }
    }

    async fn post(&mut self, outgoing: OutgoingMessage) {
        if outgoing.text.trim().is_empty() {
            self.emit(ServerFrame::Error(json!({ "error": "Message cannot be empty!" }))).await;
            return;
        }
        if !self.joined.contains(&outgoing.room_id) {
            self.emit(ServerFrame::Error(json!({ "error": "Join the room first!" }))).await;
            return;
        }

        let echo = self.backend.record(&outgoing.room_id, &self.user, &outgoing.text);
        self.emit(ServerFrame::Message(vec![echo])).await;

        if outgoing.ai {
            let reply = self.backend.record(&outgoing.room_id, AI_AUTHOR, &answer(&outgoing.text));
            let outbox = self.outbox.clone();
            let delay = self.ai_delay;
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                if let Ok(text) = ServerFrame::Message(vec![reply]).to_json() {
                    // Client may have gone; nothing to do then.
                    outbox.send(text).await.ok();
                }
            });
        }
    }

    async fn emit(&self, frame: ServerFrame) {
        match frame.to_json() {
            Ok(text) => {
                if self.outbox.send(text).await.is_err() {
                    tracing::debug!("client disconnected");
                }
            },
            Err(e) => tracing::warn!(error = %e, "server frame not encoded"),
        }
    }
}

/// Canned assistant reply.
fn answer(prompt: &str) -> String {
    let words = prompt.split_whitespace().count();
    format!("You asked about \"{}\" ({words} words). Here is what I know.", prompt.trim())
}

/// Seconds since the epoch, as text.
fn timestamp() -> String {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or_default().to_string()
}
