//! Runtime error types.

use thiserror::Error;

/// Errors from starting or talking to the session runtime.
///
/// Session-level failures (fetch, transport, validation) never appear here;
/// the controller reports those to the user and keeps going.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// No credential in the session context.
    #[error("not logged in")]
    Unauthenticated,

    /// The runtime loop has exited.
    #[error("session runtime has stopped")]
    Closed,

    /// HTTP collaborator could not be built.
    #[cfg(feature = "http")]
    #[error(transparent)]
    Http(#[from] HttpError),
}

/// HTTP collaborator construction failure.
#[cfg(feature = "http")]
#[derive(Error, Debug)]
pub enum HttpError {
    /// Base URL does not parse.
    #[error("invalid base URL {url}: {reason}")]
    InvalidBaseUrl {
        /// Rejected URL
        url: String,
        /// Parser message
        reason: String,
    },

    /// Client builder failed (TLS backend, invalid options).
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}
