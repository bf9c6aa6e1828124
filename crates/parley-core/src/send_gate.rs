//! Send rate and concurrency control.
//!
//! The gate combines two independent conditions:
//!
//! - Lock: set when a send is accepted. Human rooms release it right after
//!   dispatch; AI rooms hold it until the assistant answers or the stream
//!   fails, which serializes AI exchanges.
//! - Cooldown: a whole-second countdown started by every accepted send. It
//!   throttles all rooms regardless of the lock.
//!
//! A send is accepted only when both are clear.
//!
//! ```text
//!            accept                   release
//! ┌──────┐ ─────────> ┌────────┐ ─────────────────> ┌──────┐
//! │ Open │            │ Locked │                    │ Open │ (after cooldown)
//! └──────┘            └────────┘                    └──────┘
//!                      cooldown 3 → 2 → 1 → 0, one step per second
//! ```

use std::time::Duration;

use crate::{SessionConfig, env::TimePoint, error::ValidationError};

const ONE_SECOND: Duration = Duration::from_secs(1);

/// Per-session send gate.
///
/// Owned by the session state and dropped with it on room switch, which
/// cancels the cooldown timer.
#[derive(Debug, Clone)]
pub struct SendGate<I> {
    locked: bool,
    cooldown_remaining: u32,
    /// When the countdown next steps. `None` while the cooldown is 0.
    next_step: Option<I>,
    cooldown_secs: u32,
    max_len: usize,
}

impl<I: TimePoint> SendGate<I> {
    /// Create an open gate.
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            locked: false,
            cooldown_remaining: 0,
            next_step: None,
            cooldown_secs: config.cooldown_secs,
            max_len: config.max_message_len,
        }
    }

    /// True while a send is awaiting its terminal signal.
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Whole seconds of cooldown left.
    pub fn cooldown_remaining(&self) -> u32 {
        self.cooldown_remaining
    }

    /// True if neither lock nor cooldown blocks sending.
    pub fn is_open(&self) -> bool {
        !self.locked && self.cooldown_remaining == 0
    }

    /// Check `text` against the gate without changing state.
    ///
    /// Room activity is checked by the caller; this covers content, lock and
    /// cooldown. Conditions are checked in order: empty, locked, cooldown,
    /// length.
    ///
    /// # Errors
    ///
    /// - `ValidationError::Empty` if `text` is blank
    /// - `ValidationError::Locked` if a previous send is pending
    /// - `ValidationError::CoolingDown` if the cooldown is running
    /// - `ValidationError::TooLong` if `text` exceeds the maximum length
    pub fn check(&self, text: &str) -> Result<(), ValidationError> {
        if text.trim().is_empty() {
            return Err(ValidationError::Empty);
        }
        if self.locked {
            return Err(ValidationError::Locked);
        }
        if self.cooldown_remaining > 0 {
            return Err(ValidationError::CoolingDown { remaining: self.cooldown_remaining });
        }

        let len = text.chars().count();
        if len > self.max_len {
            return Err(ValidationError::TooLong { len, max: self.max_len });
        }

        Ok(())
    }

    /// Record an accepted send: lock and start the cooldown at `now`.
    pub fn accept(&mut self, now: I) {
        debug_assert!(self.is_open(), "accept called on a closed gate");

        self.locked = true;
        self.cooldown_remaining = self.cooldown_secs;
        self.next_step = (self.cooldown_secs > 0).then(|| now + ONE_SECOND);
    }

    /// Release the lock. The cooldown keeps running.
    pub fn release(&mut self) {
        self.locked = false;
    }

    /// Advance the cooldown to `now`.
    ///
    /// Steps down by exactly one for each full second elapsed since the last
    /// step. Returns `true` if the remaining count changed.
    pub fn tick(&mut self, now: I) -> bool {
        let before = self.cooldown_remaining;

        while let Some(at) = self.next_step {
            if now < at {
                break;
            }
            self.cooldown_remaining = self.cooldown_remaining.saturating_sub(1);
            self.next_step = (self.cooldown_remaining > 0).then(|| at + ONE_SECOND);
        }

        self.cooldown_remaining != before
    }

    /// Instant of the next cooldown step, if any.
    pub fn next_deadline(&self) -> Option<I> {
        self.next_step
    }
}
