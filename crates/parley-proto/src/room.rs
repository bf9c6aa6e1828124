//! Room identity and metadata.
//!
//! A room's [`RoomMode`] decides how the session engine treats it: AI rooms
//! hold the send lock until the assistant answers and never have persisted
//! history, while human rooms only throttle. Mode is derived from well-known
//! sentinel ids or from the room's own `is_ai` flag and is never edited by the
//! user.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{ProtocolError, Result};

/// Id of the shared public room. Metadata is synthesized locally.
pub const PUBLIC_ROOM_ID: &str = "685a64dcd94f6bbc0088f911";

/// Id of the per-user AI room. No metadata or history fetch is ever issued.
pub const AI_ROOM_ID: &str = "ai";

/// Opaque room identifier.
///
/// The server uses 24-hex-digit document ids, but sentinel ids such as
/// [`AI_ROOM_ID`] are not in that format, so the id is kept as a string and
/// never parsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Wrap a non-empty id.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::EmptyRoomId` if `id` is empty or whitespace
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ProtocolError::EmptyRoomId);
        }
        Ok(Self(id))
    }

    /// The AI room sentinel.
    pub fn ai() -> Self {
        Self(AI_ROOM_ID.to_string())
    }

    /// The public room sentinel.
    pub fn public() -> Self {
        Self(PUBLIC_ROOM_ID.to_string())
    }

    /// Id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for the AI room sentinel.
    pub fn is_ai_sentinel(&self) -> bool {
        self.0 == AI_ROOM_ID
    }

    /// True for the public room sentinel.
    pub fn is_public_sentinel(&self) -> bool {
        self.0 == PUBLIC_ROOM_ID
    }

    /// Mode implied by the id alone.
    ///
    /// Ordinary ids report [`RoomMode::Standard`]; a fetched room may still
    /// upgrade itself to AI mode through its `is_ai` flag.
    pub fn sentinel_mode(&self) -> RoomMode {
        if self.is_ai_sentinel() {
            RoomMode::Ai
        } else if self.is_public_sentinel() {
            RoomMode::Public
        } else {
            RoomMode::Standard
        }
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RoomId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Behavioral class of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomMode {
    /// Member-only human room.
    Standard,
    /// The shared public room.
    Public,
    /// Assistant room: sends are routed to the AI and serialized.
    Ai,
}

impl RoomMode {
    /// True if sends in this mode wait for an assistant reply.
    pub fn is_ai(self) -> bool {
        matches!(self, Self::Ai)
    }
}

/// Room metadata.
///
/// Replaced wholesale on every room switch and never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    /// Room identity.
    #[serde(rename = "_id")]
    pub id: RoomId,

    /// Human-readable name.
    #[serde(rename = "room_name", default)]
    pub display_name: String,

    /// Picture reference. `None` if the room has no picture.
    #[serde(rename = "room_picture", default, deserialize_with = "nullable_picture")]
    pub picture_ref: Option<String>,

    /// Number of members.
    #[serde(rename = "members", default)]
    pub member_count: u64,

    /// Room-owned AI flag.
    #[serde(rename = "is_ai", default, skip_serializing_if = "std::ops::Not::not")]
    pub is_ai: bool,
}

impl Room {
    /// Locally synthesized metadata for sentinel ids.
    ///
    /// Returns `None` for ordinary ids, which must be fetched.
    pub fn sentinel(id: &RoomId) -> Option<Self> {
        let (display_name, is_ai) = if id.is_ai_sentinel() {
            ("AI Room", true)
        } else if id.is_public_sentinel() {
            ("Public Room", false)
        } else {
            return None;
        };

        Some(Self {
            id: id.clone(),
            display_name: display_name.to_string(),
            picture_ref: None,
            member_count: 0,
            is_ai,
        })
    }

    /// Metadata for a room whose fetch failed.
    ///
    /// Keeps the id as the display name so the view has something to show.
    pub fn unresolved(id: &RoomId) -> Self {
        Self::sentinel(id).unwrap_or_else(|| Self {
            id: id.clone(),
            display_name: id.to_string(),
            picture_ref: None,
            member_count: 0,
            is_ai: false,
        })
    }

    /// Effective mode: sentinel ids first, then the room-owned flag.
    pub fn mode(&self) -> RoomMode {
        match self.id.sentinel_mode() {
            RoomMode::Standard if self.is_ai => RoomMode::Ai,
            mode => mode,
        }
    }
}

/// The server stores a missing picture as either `null` or the string
/// `"null"`.
fn nullable_picture<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty() && s != "null"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_room_id_rejected() {
        assert_eq!(RoomId::new(""), Err(ProtocolError::EmptyRoomId));
        assert_eq!(RoomId::new("   "), Err(ProtocolError::EmptyRoomId));
    }

    #[test]
    fn sentinel_modes() {
        assert_eq!(RoomId::ai().sentinel_mode(), RoomMode::Ai);
        assert_eq!(RoomId::public().sentinel_mode(), RoomMode::Public);
        assert_eq!(RoomId::new("abc").map(|id| id.sentinel_mode()), Ok(RoomMode::Standard));
    }

    #[test]
    fn room_flag_upgrades_standard_to_ai() {
        let mut room = Room::unresolved(&RoomId::new("abc").unwrap());
        assert_eq!(room.mode(), RoomMode::Standard);

        room.is_ai = true;
        assert_eq!(room.mode(), RoomMode::Ai);
    }

    #[test]
    fn public_sentinel_ignores_ai_flag() {
        let mut room = Room::sentinel(&RoomId::public()).unwrap();
        room.is_ai = true;
        assert_eq!(room.mode(), RoomMode::Public);
    }

    #[test]
    fn sentinel_metadata_only_for_sentinels() {
        assert!(Room::sentinel(&RoomId::new("abc").unwrap()).is_none());
        assert_eq!(Room::sentinel(&RoomId::ai()).map(|r| r.display_name), Some("AI Room".into()));
        assert_eq!(
            Room::sentinel(&RoomId::public()).map(|r| r.display_name),
            Some("Public Room".into())
        );
    }
}
