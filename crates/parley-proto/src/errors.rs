//! Error types for wire decoding.

use thiserror::Error;

/// Result alias for wire operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors produced while decoding or encoding wire payloads.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Body was not valid JSON for the expected shape
    #[error("JSON decode failed for {shape}: {reason}")]
    JsonDecode {
        /// Name of the shape being decoded
        shape: &'static str,
        /// Decoder message
        reason: String,
    },

    /// Payload could not be serialized
    #[error("JSON encode failed: {0}")]
    JsonEncode(String),

    /// Room id was empty
    #[error("room id must not be empty")]
    EmptyRoomId,
}

impl ProtocolError {
    pub(crate) fn decode(shape: &'static str, err: &serde_json::Error) -> Self {
        Self::JsonDecode { shape, reason: err.to_string() }
    }
}
