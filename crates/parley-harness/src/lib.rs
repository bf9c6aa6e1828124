//! Deterministic simulation harness for the Parley session engine.
//!
//! A virtual clock and a scripted driver that parks every fetch and join
//! result until the test delivers it, so interleavings that are rare in
//! production (a stale history response landing after the next switch, an
//! assistant reply arriving for a room the user already left) can be
//! reproduced exactly.
//!
//! # Invariant Testing
//!
//! The `invariants` module checks properties that must hold after every
//! step. Use [`InvariantRegistry::standard()`] with
//! [`SimSession::with_invariants`] to assert them continuously.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod invariants;
pub mod operation;
pub mod sim_env;
pub mod sim_session;

pub use invariants::{
    CooldownBounded, IdleIsInert, Invariant, InvariantRegistry, InvariantResult, LockOnlyForAi,
    MessagesBelongToRoom, SingleSubscription, SystemSnapshot, Violation,
};
pub use operation::{Operation, RoomSlot, SmallText, room_universe, universe_backend};
pub use sim_env::{SimEnv, SimInstant};
pub use sim_session::{SimBackend, SimSession};
