//! Chat messages and client-to-server payloads.

use serde::{Deserialize, Serialize};

use crate::room::RoomId;

/// Reserved author name for assistant-origin messages.
///
/// No human account can carry this name; a message with this author is the
/// completion signal for a pending AI exchange.
pub const AI_AUTHOR: &str = "AI";

/// A chat message.
///
/// Immutable once received. Sessions order messages by arrival, never by
/// `sent_at`, so the timestamp is kept as the server's opaque ISO-8601 text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Server-assigned document id. Empty for pushes that omit it.
    #[serde(rename = "_id", default)]
    pub id: String,

    /// Room the message belongs to.
    pub room_id: RoomId,

    /// Author display name, or [`AI_AUTHOR`].
    #[serde(rename = "user")]
    pub author: String,

    /// Author avatar seed. `None` for the assistant or unknown users.
    #[serde(rename = "pfp", default)]
    pub author_avatar_ref: Option<String>,

    /// Message body.
    #[serde(rename = "message")]
    pub text: String,

    /// Server timestamp (ISO-8601).
    #[serde(rename = "timestamp", default)]
    pub sent_at: String,
}

impl Message {
    /// True if the assistant wrote this message.
    pub fn is_ai(&self) -> bool {
        self.author == AI_AUTHOR
    }
}

/// Message dispatched to the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    /// Target room.
    #[serde(rename = "room_uuid")]
    pub room_id: RoomId,

    /// Message body, exactly as typed.
    #[serde(rename = "message")]
    pub text: String,

    /// Route to the assistant. Omitted on the wire for human rooms.
    #[serde(rename = "is_ai", default, skip_serializing_if = "std::ops::Not::not")]
    pub ai: bool,
}

/// Room subscription announcement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRequest {
    /// Room to subscribe to.
    #[serde(rename = "room_uuid")]
    pub room_id: RoomId,
}
