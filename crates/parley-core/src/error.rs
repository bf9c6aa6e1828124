//! Error types for the session engine.
//!
//! Three families, matching how each is handled:
//!
//! - [`FetchError`]: REST metadata/history retrieval failed. Reported to the
//!   user, never fatal.
//! - [`TransportError`]: the live stream failed or the server pushed an error.
//!   Reported to the user and always releases any pending send lock.
//! - [`ValidationError`]: a send was refused at the gate. Silent; it never
//!   reaches the transport and is not surfaced as a failure.

use thiserror::Error;

/// REST retrieval failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Server answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Server-provided error text
        message: String,
    },

    /// Request never produced a response.
    #[error("network error: {0}")]
    Network(String),

    /// Response body had an unexpected shape.
    #[error("invalid response: {0}")]
    Decode(String),
}

impl From<parley_proto::ProtocolError> for FetchError {
    fn from(err: parley_proto::ProtocolError) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Live stream failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Server pushed an error payload.
    #[error("{0}")]
    Server(String),

    /// Connection dropped or could not be opened.
    #[error("disconnected: {0}")]
    Disconnected(String),

    /// Join handshake failed.
    #[error("join failed: {0}")]
    Join(String),

    /// Dispatch of an outgoing message failed.
    #[error("Failed to send message")]
    Send(String),
}

/// Errors reported to the user.
///
/// None of these are fatal: the session stays usable after each one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Metadata or history retrieval failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Stream-level failure.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Reasons a send is refused before dispatch.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// Text is empty after trimming.
    #[error("message is empty")]
    Empty,

    /// No room is active (idle, or a switch is still in progress).
    #[error("no active room")]
    NoActiveRoom,

    /// A previous AI exchange is still pending.
    #[error("waiting for the previous response")]
    Locked,

    /// The post-send cooldown has not elapsed.
    #[error("cooldown: {remaining}s")]
    CoolingDown {
        /// Whole seconds left
        remaining: u32,
    },

    /// Text exceeds the maximum length.
    #[error("Message is too long. Maximum {} characters allowed.", group_thousands(.max))]
    TooLong {
        /// Length of the rejected text in characters
        len: usize,
        /// Configured maximum
        max: usize,
    },
}

impl ValidationError {
    /// True if the user should be told about this rejection.
    ///
    /// Only over-length text gets a notice; the other refusals mirror a
    /// disabled input and stay silent.
    pub fn is_user_visible(&self) -> bool {
        matches!(self, Self::TooLong { .. })
    }
}

/// `1500` -> `1,500`.
fn group_thousands(n: &usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_too_long_is_user_visible() {
        assert!(ValidationError::TooLong { len: 1501, max: 1500 }.is_user_visible());
        assert!(!ValidationError::Empty.is_user_visible());
        assert!(!ValidationError::NoActiveRoom.is_user_visible());
        assert!(!ValidationError::Locked.is_user_visible());
        assert!(!ValidationError::CoolingDown { remaining: 2 }.is_user_visible());
    }

    #[test]
    fn too_long_notice_groups_digits() {
        let err = ValidationError::TooLong { len: 1501, max: 1500 };
        assert_eq!(err.to_string(), "Message is too long. Maximum 1,500 characters allowed.");
        assert_eq!(group_thousands(&999), "999");
        assert_eq!(group_thousands(&1_000_000), "1,000,000");
    }

    #[test]
    fn send_failure_message_is_user_facing() {
        let err = SessionError::from(TransportError::Send("channel closed".into()));
        assert_eq!(err.to_string(), "Failed to send message");
    }

    #[test]
    fn protocol_errors_become_decode_failures() {
        let err = FetchError::from(parley_proto::ProtocolError::EmptyRoomId);
        assert!(matches!(err, FetchError::Decode(_)));
    }
}
