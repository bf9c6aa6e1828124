//! Environment abstraction for deterministic testing.
//!
//! Decouples session logic from the system clock. The state machines in this
//! crate never read time themselves: every operation that depends on time
//! takes the current instant as a parameter. The [`Environment`] trait is what
//! drivers use to obtain that instant and to wait, so production can use the
//! tokio clock while simulation uses a virtual one.

use std::{
    future::Future,
    ops::{Add, Sub},
    time::Duration,
};

/// A point in monotonic time.
///
/// Blanket-implemented for any type with the required arithmetic, which
/// covers `std::time::Instant`, `tokio::time::Instant` and virtual instants.
pub trait TimePoint:
    Copy + Ord + Send + Sync + Sub<Output = Duration> + Add<Duration, Output = Self> + 'static
{
}

impl<T> TimePoint for T where
    T: Copy + Ord + Send + Sync + Sub<Output = Duration> + Add<Duration, Output = T> + 'static
{
}

/// Abstract environment providing time and async sleeping.
///
/// # Invariants
///
/// - `now()` never goes backwards within one execution context
pub trait Environment: Clone + Send + Sync + 'static {
    /// The instant type used by this environment.
    ///
    /// Production environments use the runtime's clock, simulation
    /// environments use virtual time.
    type Instant: TimePoint;

    /// Current time (monotonic).
    fn now(&self) -> Self::Instant;

    /// Sleeps for the specified duration.
    ///
    /// Only driver code awaits this; session logic stays synchronous.
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;

    /// Duration from now until `deadline`, zero if it has passed.
    fn until(&self, deadline: Self::Instant) -> Duration {
        let now = self.now();
        if deadline > now { deadline - now } else { Duration::ZERO }
    }
}
