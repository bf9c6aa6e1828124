//! Session tuning parameters.

use std::time::Duration;

/// Seconds a user must wait after an accepted send.
pub const DEFAULT_COOLDOWN_SECS: u32 = 3;

/// Longest accepted message, in characters.
pub const DEFAULT_MAX_MESSAGE_LEN: usize = 1500;

/// Draft length at which the input starts warning about the limit.
pub const DEFAULT_NEAR_LIMIT_LEN: usize = 1400;

/// Status text revealed in the input while the assistant is generating.
pub const DEFAULT_PLACEHOLDER_TEXT: &str = "Generating your response...";

/// Time between revealed placeholder characters.
pub const DEFAULT_REVEAL_INTERVAL: Duration = Duration::from_millis(40);

/// Session configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Cooldown after each accepted send, in whole seconds.
    pub cooldown_secs: u32,
    /// Maximum message length in characters.
    pub max_message_len: usize,
    /// Length at which [`crate::SessionSnapshot::near_limit`] turns true.
    pub near_limit_len: usize,
    /// Text revealed by the placeholder animation.
    pub placeholder_text: String,
    /// Delay between revealed characters (should be > 0).
    pub reveal_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: DEFAULT_COOLDOWN_SECS,
            max_message_len: DEFAULT_MAX_MESSAGE_LEN,
            near_limit_len: DEFAULT_NEAR_LIMIT_LEN,
            placeholder_text: DEFAULT_PLACEHOLDER_TEXT.to_string(),
            reveal_interval: DEFAULT_REVEAL_INTERVAL,
        }
    }
}
