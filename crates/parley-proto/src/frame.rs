//! Socket event frames.
//!
//! The live connection carries named events with a JSON payload. Each frame
//! is encoded as `{"event": <name>, "data": <payload>}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    JoinRequest, Message, OutgoingMessage,
    errors::{ProtocolError, Result},
};

/// Client-to-server event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "lowercase")]
pub enum ClientFrame {
    /// Subscribe to a room.
    Join(JoinRequest),
    /// Drop a room subscription.
    Leave(JoinRequest),
    /// Post a message.
    Message(OutgoingMessage),
}

/// Server-to-client event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "lowercase")]
pub enum ServerFrame {
    /// New messages, in delivery order.
    Message(Vec<Message>),
    /// Error payload of unspecified shape. See
    /// [`crate::describe_error_payload`].
    Error(Value),
}

impl ClientFrame {
    /// Encode as JSON text.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| ProtocolError::JsonEncode(e.to_string()))
    }

    /// Decode from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| ProtocolError::decode("ClientFrame", &e))
    }
}

impl ServerFrame {
    /// Encode as JSON text.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| ProtocolError::JsonEncode(e.to_string()))
    }

    /// Decode from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| ProtocolError::decode("ServerFrame", &e))
    }
}
