//! REST response envelopes and error payload normalization.
//!
//! Every successful REST body is an object with a human-readable `message`
//! plus the data field. Failures carry an `error` (400) or `detail` (403)
//! field instead.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    Message, Room,
    errors::{ProtocolError, Result},
};

/// Body of `GET /api/rooms/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomEnvelope {
    /// Server status text.
    #[serde(default)]
    pub message: String,
    /// Room metadata.
    pub room: Room,
}

impl RoomEnvelope {
    /// Decode from a JSON body.
    pub fn from_json(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body).map_err(|e| ProtocolError::decode("RoomEnvelope", &e))
    }
}

/// Body of `GET /api/rooms/{id}/messages`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagesEnvelope {
    /// Server status text.
    #[serde(default)]
    pub message: String,
    /// History, oldest first.
    pub messages: Vec<Message>,
}

impl MessagesEnvelope {
    /// Decode from a JSON body.
    pub fn from_json(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body).map_err(|e| ProtocolError::decode("MessagesEnvelope", &e))
    }
}

/// Render an error payload as user-facing text.
///
/// The server pushes errors in several shapes: a bare string, an object with
/// an `error` or `detail` field, or anything else. Unknown shapes are shown
/// as their JSON text.
pub fn describe_error_payload(payload: &Value) -> String {
    match payload {
        Value::String(s) => s.clone(),
        Value::Object(map) => match map.get("error").or_else(|| map.get("detail")) {
            Some(Value::String(s)) => s.clone(),
            _ => payload.to_string(),
        },
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn error_payload_shapes() {
        assert_eq!(describe_error_payload(&json!("Room not found!")), "Room not found!");
        assert_eq!(describe_error_payload(&json!({ "error": "Invalid token!" })), "Invalid token!");
        assert_eq!(
            describe_error_payload(&json!({ "detail": "You are not allowed to access this room." })),
            "You are not allowed to access this room."
        );
        assert_eq!(describe_error_payload(&json!({ "code": 7 })), r#"{"code":7}"#);
        assert_eq!(describe_error_payload(&json!(42)), "42");
    }

    #[test]
    fn malformed_body_names_shape() {
        let err = RoomEnvelope::from_json(b"{").unwrap_err();
        assert!(matches!(err, ProtocolError::JsonDecode { shape: "RoomEnvelope", .. }));
    }
}
