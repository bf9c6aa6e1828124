//! "Generating your response" typing indicator.
//!
//! Reveals a fixed status string one character per interval while an AI
//! exchange is pending, then holds the full text. The animation only replaces
//! the input's placeholder text; it never touches the draft.

use std::time::Duration;

use crate::{SessionConfig, env::TimePoint};

/// Character-by-character placeholder reveal.
#[derive(Debug, Clone)]
pub struct PlaceholderAnimator<I> {
    text: String,
    /// Total characters in `text`.
    text_chars: usize,
    /// Characters currently revealed.
    revealed: usize,
    active: bool,
    /// When the next character appears. `None` when inactive or complete.
    next_reveal: Option<I>,
    interval: Duration,
}

impl<I: TimePoint> PlaceholderAnimator<I> {
    /// Create an inactive animator.
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            text: config.placeholder_text.clone(),
            text_chars: config.placeholder_text.chars().count(),
            revealed: 0,
            active: false,
            next_reveal: None,
            interval: config.reveal_interval,
        }
    }

    /// True while the animation is running or holding.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Start revealing from an empty prefix.
    pub fn activate(&mut self, now: I) {
        self.active = true;
        self.revealed = 0;
        self.next_reveal = (self.text_chars > 0).then(|| now + self.interval);
    }

    /// Stop and discard the revealed text.
    pub fn deactivate(&mut self) {
        self.active = false;
        self.revealed = 0;
        self.next_reveal = None;
    }

    /// Reveal every character due by `now`. Returns `true` if text changed.
    pub fn tick(&mut self, now: I) -> bool {
        let before = self.revealed;

        while let Some(at) = self.next_reveal {
            if now < at {
                break;
            }
            self.revealed += 1;
            self.next_reveal = (self.revealed < self.text_chars).then(|| at + self.interval);
        }

        self.revealed != before
    }

    /// Revealed prefix. Empty when inactive.
    pub fn revealed_text(&self) -> &str {
        let end = self.text.char_indices().nth(self.revealed).map_or(self.text.len(), |(i, _)| i);
        &self.text[..end]
    }

    /// True once the whole text is showing.
    pub fn is_complete(&self) -> bool {
        self.active && self.revealed == self.text_chars
    }

    /// Instant of the next reveal, if any.
    pub fn next_deadline(&self) -> Option<I> {
        self.next_reveal
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;

    const STEP: Duration = Duration::from_millis(40);

    fn animator() -> PlaceholderAnimator<Instant> {
        PlaceholderAnimator::new(&SessionConfig::default())
    }

    #[test]
    fn reveals_one_character_per_interval() {
        let t0 = Instant::now();
        let mut anim = animator();
        anim.activate(t0);
        assert_eq!(anim.revealed_text(), "");

        assert!(!anim.tick(t0 + STEP - Duration::from_millis(1)));
        assert!(anim.tick(t0 + STEP));
        assert_eq!(anim.revealed_text(), "G");

        anim.tick(t0 + STEP * 10);
        assert_eq!(anim.revealed_text(), "Generating");
    }

    #[test]
    fn holds_full_text_after_completion() {
        let t0 = Instant::now();
        let mut anim = animator();
        anim.activate(t0);

        let len = "Generating your response...".chars().count() as u32;
        anim.tick(t0 + STEP * len);
        assert!(anim.is_complete());
        assert_eq!(anim.revealed_text(), "Generating your response...");
        assert_eq!(anim.next_deadline(), None);

        assert!(!anim.tick(t0 + STEP * (len + 50)));
        assert_eq!(anim.revealed_text(), "Generating your response...");
    }

    #[test]
    fn deactivate_discards_immediately() {
        let t0 = Instant::now();
        let mut anim = animator();
        anim.activate(t0);
        anim.tick(t0 + STEP * 5);

        anim.deactivate();
        assert!(!anim.is_active());
        assert_eq!(anim.revealed_text(), "");
        assert!(!anim.tick(t0 + STEP * 100));
    }

    #[test]
    fn multibyte_text_reveals_on_char_boundaries() {
        let config =
            SessionConfig { placeholder_text: "Génère…".into(), ..SessionConfig::default() };
        let t0 = Instant::now();
        let mut anim: PlaceholderAnimator<Instant> = PlaceholderAnimator::new(&config);
        anim.activate(t0);

        anim.tick(t0 + STEP * 2);
        assert_eq!(anim.revealed_text(), "Gé");
        anim.tick(t0 + STEP * 7);
        assert_eq!(anim.revealed_text(), "Génère…");
    }
}
