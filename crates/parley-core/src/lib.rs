//! Room session engine for Parley
//!
//! Pure state machines that decide what the chat client does when the user
//! switches rooms, sends a message, or the server pushes something. No I/O
//! happens here: every operation returns actions for a runtime to execute,
//! and time is passed in, so the same code runs in production and in
//! deterministic simulation.
//!
//! # Components
//!
//! - [`SessionController`]: switch protocol, stale-result discard, routing
//! - [`MessageStream`]: arrival-ordered message sequence
//! - [`SendGate`]: lock, cooldown and length validation for outgoing sends
//! - [`PlaceholderAnimator`]: progressive "generating" indicator for AI rooms
//! - [`Environment`]: clock abstraction used by drivers

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod config;
mod controller;
pub mod env;
mod error;
mod event;
mod placeholder;
mod send_gate;
mod session;
mod stream;

pub use action::SessionAction;
pub use config::{
    DEFAULT_COOLDOWN_SECS, DEFAULT_MAX_MESSAGE_LEN, DEFAULT_NEAR_LIMIT_LEN,
    DEFAULT_PLACEHOLDER_TEXT, DEFAULT_REVEAL_INTERVAL, SessionConfig,
};
pub use controller::SessionController;
pub use env::{Environment, TimePoint};
pub use error::{FetchError, SessionError, TransportError, ValidationError};
pub use event::{FetchTarget, SessionEvent};
pub use parley_proto::{Message, OutgoingMessage, Room, RoomId, RoomMode};
pub use placeholder::PlaceholderAnimator;
pub use send_gate::SendGate;
pub use session::{SessionPhase, SessionSnapshot, SessionState, SwitchId};
pub use stream::{Appended, MessageStream};
