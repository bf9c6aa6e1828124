//! Async orchestration for the Parley session engine
//!
//! Connects the pure [`parley_core::SessionController`] to real I/O: a REST
//! collaborator for metadata and history, a room-scoped live transport, and
//! the tokio clock. The UI talks to the running session only through a
//! [`SessionHandle`].
//!
//! # Components
//!
//! - [`SessionContext`]: login boundary holding the bearer [`Credential`]
//! - [`RoomApi`]: trait for metadata/history retrieval
//! - [`Transport`]: trait for room subscriptions and dispatch
//! - [`ChannelTransport`]: [`Transport`] over JSON frames on tokio channels
//! - [`Runtime`]: event loop executing controller actions
//! - [`local`]: in-process room server for demos and tests
//! - `HttpRoomApi` (feature `http`): [`RoomApi`] over HTTP

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod api;
mod context;
mod env;
mod error;
#[cfg(feature = "http")]
mod http;
pub mod local;
mod runtime;
mod transport;

pub use api::RoomApi;
pub use context::{Credential, SessionContext};
pub use env::SystemEnv;
#[cfg(feature = "http")]
pub use error::HttpError;
pub use error::RuntimeError;
#[cfg(feature = "http")]
pub use http::{HttpConfig, HttpRoomApi};
pub use runtime::{Notice, Runtime, RuntimeConfig, SessionHandle};
pub use transport::{ChannelTransport, Transport, TransportEvent};
