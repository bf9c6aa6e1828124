//! Virtual clock environment.
//!
//! Time only moves when the test advances it, so cooldown and placeholder
//! timers fire at exactly the instants a scenario names.

use std::{
    future::Future,
    ops::{Add, Sub},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use parley_core::Environment;

/// Instant on the virtual clock: time since simulation start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SimInstant(Duration);

impl SimInstant {
    /// Simulation start.
    pub const ZERO: Self = Self(Duration::ZERO);

    /// Instant `elapsed` after simulation start.
    pub const fn from_start(elapsed: Duration) -> Self {
        Self(elapsed)
    }

    /// Time since simulation start.
    pub const fn elapsed(self) -> Duration {
        self.0
    }
}

impl Add<Duration> for SimInstant {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self {
        Self(self.0 + rhs)
    }
}

impl Sub for SimInstant {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Duration {
        self.0.saturating_sub(rhs.0)
    }
}

/// Shared virtual clock.
///
/// Clones share the same clock. `sleep` advances it instead of waiting.
#[derive(Debug, Clone, Default)]
pub struct SimEnv {
    nanos: Arc<AtomicU64>,
}

impl SimEnv {
    /// Clock at simulation start.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        self.nanos.fetch_add(by.as_nanos() as u64, Ordering::SeqCst);
    }

    /// Move the clock to `to`. Never moves backwards.
    pub fn advance_to(&self, to: SimInstant) {
        self.nanos.fetch_max(to.0.as_nanos() as u64, Ordering::SeqCst);
    }
}

impl Environment for SimEnv {
    type Instant = SimInstant;

    fn now(&self) -> SimInstant {
        SimInstant(Duration::from_nanos(self.nanos.load(Ordering::SeqCst)))
    }

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        self.advance(duration);
        std::future::ready(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_clock() {
        let env = SimEnv::new();
        let other = env.clone();
        env.advance(Duration::from_millis(40));
        assert_eq!(other.now(), SimInstant::from_start(Duration::from_millis(40)));
    }

    #[test]
    fn advance_to_never_rewinds() {
        let env = SimEnv::new();
        env.advance(Duration::from_secs(2));
        env.advance_to(SimInstant::from_start(Duration::from_secs(1)));
        assert_eq!(env.now().elapsed(), Duration::from_secs(2));
    }

    #[test]
    fn until_is_zero_for_past_deadlines() {
        let env = SimEnv::new();
        env.advance(Duration::from_secs(5));
        assert_eq!(env.until(SimInstant::from_start(Duration::from_secs(1))), Duration::ZERO);
        assert_eq!(
            env.until(SimInstant::from_start(Duration::from_secs(6))),
            Duration::from_secs(1)
        );
    }
}
