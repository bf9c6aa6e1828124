//! Observable state snapshots for invariant checking.
//!
//! Invariants operate on snapshots rather than live state so every check sees
//! one consistent moment.

use std::collections::BTreeSet;

use parley_core::{SessionConfig, SessionSnapshot};
use parley_proto::RoomId;

/// Snapshot of the session plus what the simulated transport observed.
#[derive(Debug, Clone)]
pub struct SystemSnapshot {
    /// Controller view.
    pub session: SessionSnapshot,
    /// Configured cooldown, in whole seconds.
    pub cooldown_secs: u32,
    /// Rooms the transport currently holds a subscription for.
    pub subscriptions: BTreeSet<RoomId>,
}

impl SystemSnapshot {
    /// Idle session with no subscriptions.
    pub fn empty() -> Self {
        let config = SessionConfig::default();
        Self {
            session: SessionSnapshot::idle(&config),
            cooldown_secs: config.cooldown_secs,
            subscriptions: BTreeSet::new(),
        }
    }

    /// Snapshot of a session under `config` with no transport state.
    pub fn from_session(session: SessionSnapshot, config: &SessionConfig) -> Self {
        Self { session, cooldown_secs: config.cooldown_secs, subscriptions: BTreeSet::new() }
    }

    /// Record the live transport subscriptions.
    #[must_use]
    pub fn with_subscriptions(mut self, rooms: impl IntoIterator<Item = RoomId>) -> Self {
        self.subscriptions = rooms.into_iter().collect();
        self
    }
}
