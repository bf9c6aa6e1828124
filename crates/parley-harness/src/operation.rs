//! Operations for randomized session testing.
//!
//! An [`Operation`] is one step a user, the server, or the clock can take.
//! proptest and the fuzzer generate sequences of them and apply each to a
//! [`SimSession`] with invariants enabled.

use std::time::Duration;

use arbitrary::Arbitrary;
use parley_core::{Message, Room, RoomId, SessionConfig};

use crate::sim_session::{SimBackend, SimSession};

/// Room slot (maps onto [`room_universe`] modulo its length).
pub type RoomSlot = u8;

/// Steps a session can take.
#[derive(Debug, Clone, Arbitrary)]
pub enum Operation {
    /// User selects a room.
    Select {
        /// Target room.
        room: RoomSlot,
    },

    /// User submits a message.
    Send {
        /// Message content.
        content: SmallText,
    },

    /// Deliver one pending fetch/join/send result.
    Deliver {
        /// Position in the pending queue (taken modulo its length).
        index: u8,
    },

    /// Server pushes a message on a room's subscription.
    Push {
        /// Subscription that delivers the push.
        room: RoomSlot,
        /// Author is the assistant.
        from_ai: bool,
    },

    /// Server pushes an error.
    ServerError {
        /// Subscription that reports it. `None` for connection-level errors.
        room: Option<RoomSlot>,
    },

    /// Advance virtual time.
    AdvanceTime {
        /// Milliseconds to advance.
        millis: u16,
    },
}

/// Compact message text.
#[derive(Debug, Clone, Arbitrary)]
pub struct SmallText {
    /// Content seed.
    pub seed: u8,
    /// Length hint (0-3 maps to empty/short/long/over the limit).
    pub size_class: u8,
}

impl SmallText {
    /// Expand to text.
    pub fn to_text(&self) -> String {
        let len = match self.size_class % 4 {
            0 => 0,
            1 => 8,
            2 => 1400,
            _ => 1501,
        };
        let c = char::from(b'a' + self.seed % 26);
        std::iter::repeat_n(c, len).collect()
    }
}

/// Rooms reachable by operations.
///
/// The AI and public sentinels, two fetchable rooms, and one that the
/// backend does not know.
pub fn room_universe() -> Vec<RoomId> {
    let mut rooms = vec![RoomId::ai(), RoomId::public()];
    rooms.extend(["66aa00000000000000000001", "66aa00000000000000000002", "missing"].map(
        |id| RoomId::new(id).unwrap_or_else(|_| RoomId::public()),
    ));
    rooms
}

/// Backend serving [`room_universe`].
pub fn universe_backend() -> SimBackend {
    let universe = room_universe();
    let mut backend = SimBackend::new();
    for (i, id) in universe.iter().enumerate().skip(2).take(2) {
        let room = Room {
            id: id.clone(),
            display_name: format!("Room {i}"),
            picture_ref: None,
            member_count: 3,
            is_ai: false,
        };
        backend = backend.with_room(room, vec![history_message(id, i)]);
    }
    backend.with_public_history(vec![history_message(&RoomId::public(), 0)])
}

fn history_message(room_id: &RoomId, i: usize) -> Message {
    Message {
        id: format!("h{i}"),
        room_id: room_id.clone(),
        author: "ann".into(),
        author_avatar_ref: None,
        text: format!("earlier in {room_id}"),
        sent_at: String::new(),
    }
}

fn slot(room: RoomSlot, universe: &[RoomId]) -> RoomId {
    universe[usize::from(room) % universe.len()].clone()
}

impl SimSession {
    /// Session over [`universe_backend`] with default config.
    pub fn universe() -> Self {
        Self::new(SessionConfig::default(), universe_backend())
    }

    /// Apply one operation.
    pub fn apply(&mut self, op: &Operation) {
        let universe = room_universe();
        match op {
            Operation::Select { room } => self.select(slot(*room, &universe)),
            Operation::Send { content } => self.send(&content.to_text()),
            Operation::Deliver { index } => {
                let len = self.pending_len();
                if len > 0 {
                    self.deliver(usize::from(*index) % len);
                }
            },
            Operation::Push { room, from_ai } => {
                let room_id = slot(*room, &universe);
                let author = if *from_ai { parley_proto::AI_AUTHOR } else { "bob" };
                let message = Message {
                    id: String::new(),
                    room_id: room_id.clone(),
                    author: author.into(),
                    author_avatar_ref: None,
                    text: "pushed".into(),
                    sent_at: String::new(),
                };
                self.push(&room_id, vec![message]);
            },
            Operation::ServerError { room } => {
                let room_id = room.map(|r| slot(r, &universe));
                self.server_error(room_id, "server error");
            },
            Operation::AdvanceTime { millis } => {
                self.advance(Duration::from_millis(u64::from(*millis)));
            },
        }
    }
}
