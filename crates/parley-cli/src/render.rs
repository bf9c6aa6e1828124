//! Snapshot-to-text rendering.
//!
//! The runtime publishes whole snapshots. [`Renderer`] remembers what it has
//! already printed and emits only the lines for what changed.

use parley_core::{Message, RoomId, RoomMode, SessionPhase, SessionSnapshot};

/// Printed once when the assistant starts generating.
const GENERATING: &str = "(generating a response...)";

/// Incremental line renderer.
#[derive(Debug, Default)]
pub struct Renderer {
    room_id: Option<RoomId>,
    entered: bool,
    shown: usize,
    status: Option<String>,
    placeholder_active: bool,
    cooldown: bool,
}

impl Renderer {
    /// Empty renderer; the first snapshot prints in full.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines to print for `snapshot`.
    pub fn lines(&mut self, snapshot: &SessionSnapshot) -> Vec<String> {
        let mut out = Vec::new();

        if snapshot.room_id != self.room_id {
            self.room_id = snapshot.room_id.clone();
            self.entered = false;
            self.shown = 0;
            if let Some(id) = &snapshot.room_id {
                out.push(format!("switching to {id}..."));
            }
        }

        if snapshot.phase == SessionPhase::Active && !self.entered {
            self.entered = true;
            out.push(header(snapshot));
        }

        let visible = snapshot.visible_messages();
        if visible.len() < self.shown {
            self.shown = 0;
        }
        out.extend(visible[self.shown..].iter().map(line));
        self.shown = visible.len();

        if snapshot.status != self.status {
            self.status.clone_from(&snapshot.status);
            if let Some(status) = &snapshot.status {
                out.push(format!("! {status}"));
            }
        }

        // The placeholder reveals one character per frame, so its text is
        // still empty when generation starts.
        if snapshot.placeholder_active && !self.placeholder_active {
            out.push(GENERATING.to_string());
        }
        self.placeholder_active = snapshot.placeholder_active;

        let cooling = snapshot.cooldown_remaining > 0;
        if cooling && !self.cooldown {
            out.push(format!("(next message in {}s)", snapshot.cooldown_remaining));
        }
        self.cooldown = cooling;

        out
    }
}

fn header(snapshot: &SessionSnapshot) -> String {
    let name = snapshot.room.as_ref().map_or("room", |r| r.display_name.as_str());
    match (snapshot.mode, snapshot.room.as_ref()) {
        (Some(RoomMode::Standard), Some(room)) if room.member_count > 0 => {
            format!("== {name} ({} members) ==", room.member_count)
        },
        (Some(RoomMode::Ai), _) => format!("== {name} (assistant) =="),
        _ => format!("== {name} =="),
    }
}

fn line(message: &Message) -> String {
    if message.is_ai() {
        format!("AI> {}", message.text)
    } else {
        format!("{}: {}", message.author, message.text)
    }
}
