//! Live connection collaborator.
//!
//! A [`Transport`] opens and releases room subscriptions and dispatches
//! messages. Everything the server pushes arrives as [`TransportEvent`]s on
//! a channel, tagged with the subscription that delivered it.
//!
//! [`ChannelTransport`] speaks [`ClientFrame`]/[`ServerFrame`] JSON over a
//! pair of tokio channels, which is how both the in-process server and
//! socket adapters plug in.

use std::{
    collections::BTreeSet,
    future::Future,
    sync::{Arc, PoisonError, RwLock},
};

use parley_core::{Message, OutgoingMessage, RoomId, TransportError};
use parley_proto::{ClientFrame, JoinRequest, ServerFrame, describe_error_payload};
use tokio::sync::mpsc;

/// Something the server pushed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Message batch on a room subscription.
    Batch {
        /// Subscription that delivered it.
        room_id: RoomId,
        /// Messages in delivery order.
        batch: Vec<Message>,
    },
    /// Error push.
    Error {
        /// Subscription that reported it. `None` for connection-level errors.
        room_id: Option<RoomId>,
        /// Failure cause.
        error: TransportError,
    },
}

/// Room-scoped live connection.
pub trait Transport: Send + Sync + 'static {
    /// Subscribe to `room_id`.
    fn join(&self, room_id: &RoomId) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Dispatch a message.
    fn send(
        &self,
        message: &OutgoingMessage,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Drop the subscription for `room_id` and every listener attached to it.
    ///
    /// After this returns no further [`TransportEvent::Batch`] for the room
    /// is delivered.
    fn release(&self, room_id: &RoomId);
}

type Subscriptions = Arc<RwLock<BTreeSet<RoomId>>>;

/// [`Transport`] over JSON frames on tokio channels.
pub struct ChannelTransport {
    to_server: mpsc::Sender<String>,
    subscriptions: Subscriptions,
    pump: tokio::task::AbortHandle,
}

impl ChannelTransport {
    /// Attach to a connection and start routing server frames.
    ///
    /// Returns the transport and the receiver for its pushes.
    pub fn connect(
        to_server: mpsc::Sender<String>,
        from_server: mpsc::Receiver<String>,
        capacity: usize,
    ) -> (Self, mpsc::Receiver<TransportEvent>) {
        let (events_tx, events_rx) = mpsc::channel(capacity);
        let subscriptions = Subscriptions::default();

        let pump = tokio::spawn(pump(from_server, events_tx, Arc::clone(&subscriptions)));

        (Self { to_server, subscriptions, pump: pump.abort_handle() }, events_rx)
    }

    /// Rooms currently subscribed.
    pub fn subscriptions(&self) -> Vec<RoomId> {
        self.subscriptions.read().unwrap_or_else(PoisonError::into_inner).iter().cloned().collect()
    }

    async fn post(&self, frame: &ClientFrame) -> Result<(), String> {
        let text = frame.to_json().map_err(|e| e.to_string())?;
        self.to_server.send(text).await.map_err(|e| e.to_string())
    }
}

impl Transport for ChannelTransport {
    async fn join(&self, room_id: &RoomId) -> Result<(), TransportError> {
        self.subscriptions.write().unwrap_or_else(PoisonError::into_inner).insert(room_id.clone());

        let frame = ClientFrame::Join(JoinRequest { room_id: room_id.clone() });
        if let Err(reason) = self.post(&frame).await {
            self.subscriptions.write().unwrap_or_else(PoisonError::into_inner).remove(room_id);
            return Err(TransportError::Join(reason));
        }
        Ok(())
    }

    async fn send(&self, message: &OutgoingMessage) -> Result<(), TransportError> {
        self.post(&ClientFrame::Message(message.clone())).await.map_err(TransportError::Send)
    }

    fn release(&self, room_id: &RoomId) {
        let removed =
            self.subscriptions.write().unwrap_or_else(PoisonError::into_inner).remove(room_id);
        if !removed {
            return;
        }

        let frame = ClientFrame::Leave(JoinRequest { room_id: room_id.clone() });
        match frame.to_json() {
            Ok(text) => {
                if let Err(e) = self.to_server.try_send(text) {
                    tracing::warn!(%room_id, error = %e, "leave not delivered");
                }
            },
            Err(e) => tracing::warn!(%room_id, error = %e, "leave not encoded"),
        }
    }
}

impl Drop for ChannelTransport {
    fn drop(&mut self) {
        self.pump.abort();
    }
}

/// Route server frames to subscribed rooms until either side closes.
async fn pump(
    mut from_server: mpsc::Receiver<String>,
    events: mpsc::Sender<TransportEvent>,
    subscriptions: Subscriptions,
) {
    while let Some(text) = from_server.recv().await {
        let frame = match ServerFrame::from_json(&text) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(error = %e, "dropping undecodable server frame");
                continue;
            },
        };

        let routed = match frame {
            ServerFrame::Message(batch) => {
                let subscribed = subscriptions.read().unwrap_or_else(PoisonError::into_inner);
                split_by_room(batch)
                    .into_iter()
                    .filter(|(room_id, _)| subscribed.contains(room_id))
                    .map(|(room_id, batch)| TransportEvent::Batch { room_id, batch })
                    .collect()
            },
            ServerFrame::Error(payload) => vec![TransportEvent::Error {
                room_id: None,
                error: TransportError::Server(describe_error_payload(&payload)),
            }],
        };

        for event in routed {
            if events.send(event).await.is_err() {
                return;
            }
        }
    }

    let closed = TransportEvent::Error {
        room_id: None,
        error: TransportError::Disconnected("server closed the connection".into()),
    };
    if events.send(closed).await.is_err() {
        tracing::debug!("runtime gone before disconnect was reported");
    }
}

/// Group a batch by room, keeping first-appearance order of rooms and
/// delivery order within each room.
fn split_by_room(batch: Vec<Message>) -> Vec<(RoomId, Vec<Message>)> {
    let mut groups: Vec<(RoomId, Vec<Message>)> = Vec::new();
    for message in batch {
        match groups.iter_mut().find(|(room_id, _)| *room_id == message.room_id) {
            Some((_, group)) => group.push(message),
            None => groups.push((message.room_id.clone(), vec![message])),
        }
    }
    groups
}
