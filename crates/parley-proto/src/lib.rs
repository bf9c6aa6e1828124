//! Parley wire data model.
//!
//! Types shared by the session engine and its collaborators: rooms, messages,
//! outgoing socket payloads, and the REST response envelopes they arrive in.
//!
//! Everything on the wire is JSON. Field names follow the server's document
//! schema (`_id`, `room_name`, `user`, ...) while the Rust side uses
//! descriptive names, so each type carries explicit `serde` renames.
//!
//! # Components
//!
//! - [`Room`] and [`RoomMode`]: room metadata and its behavioral class
//! - [`Message`]: immutable chat message, ordered by arrival
//! - [`OutgoingMessage`] and [`JoinRequest`]: client-to-server payloads
//! - [`RoomEnvelope`] and [`MessagesEnvelope`]: REST response bodies
//! - [`ClientFrame`] and [`ServerFrame`]: socket events
//! - [`describe_error_payload`]: normalizes server-pushed error payloads

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod envelope;
pub mod errors;
pub mod frame;
pub mod message;
pub mod room;

pub use envelope::{MessagesEnvelope, RoomEnvelope, describe_error_payload};
pub use errors::{ProtocolError, Result};
pub use frame::{ClientFrame, ServerFrame};
pub use message::{AI_AUTHOR, JoinRequest, Message, OutgoingMessage};
pub use room::{AI_ROOM_ID, PUBLIC_ROOM_ID, Room, RoomId, RoomMode};
