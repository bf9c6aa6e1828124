//! Per-room session state and its observable snapshot.
//!
//! [`SessionState`] is the single live aggregate for the selected room. It is
//! created when a switch starts and dropped when the next one starts, so its
//! timers (cooldown, placeholder reveal) can never outlive the room they
//! belong to.
//!
//! [`SessionSnapshot`] is the read-only view handed to renderers. It is a
//! plain value: observers never hold references into live state.

use std::fmt;

use parley_proto::{Message, Room, RoomId, RoomMode};

use crate::{MessageStream, PlaceholderAnimator, SendGate, SessionConfig, env::TimePoint};

/// Generation number of a room switch.
///
/// Every asynchronous result carries the id of the switch that requested it;
/// results whose id is not the current switch are stale and discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SwitchId(u64);

impl SwitchId {
    /// Wrap a raw generation number.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw generation number.
    pub const fn get(self) -> u64 {
        self.0
    }

    /// The following generation.
    pub(crate) fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for SwitchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Coarse lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No room selected.
    Idle,
    /// Loading metadata/history or joining.
    Switching,
    /// Subscribed and rendering.
    Active,
}

/// Progress of an in-flight switch.
#[derive(Debug, Clone, Default)]
pub(crate) struct PendingSwitch {
    pub(crate) history: Option<Vec<Message>>,
    /// Join has been requested.
    pub(crate) joining: bool,
}

/// Live state of the selected room.
#[derive(Debug, Clone)]
pub struct SessionState<I> {
    pub(crate) room_id: RoomId,
    pub(crate) switch: SwitchId,
    pub(crate) room: Option<Room>,
    /// `Some` while switching, `None` once active.
    pub(crate) pending: Option<PendingSwitch>,
    /// A subscription may exist for `room_id` and must be released on exit.
    pub(crate) subscribed: bool,
    /// A problem was reported while this switch was in progress.
    pub(crate) switch_error: bool,
    pub(crate) stream: MessageStream,
    pub(crate) gate: SendGate<I>,
    pub(crate) placeholder: PlaceholderAnimator<I>,
}

impl<I: TimePoint> SessionState<I> {
    /// Fresh state for a switch to `room_id`.
    pub(crate) fn switching(room_id: RoomId, switch: SwitchId, config: &SessionConfig) -> Self {
        Self {
            room_id,
            switch,
            room: None,
            pending: Some(PendingSwitch::default()),
            subscribed: false,
            switch_error: false,
            stream: MessageStream::new(),
            gate: SendGate::new(config),
            placeholder: PlaceholderAnimator::new(config),
        }
    }

    /// Selected room id.
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// Switch that created this state.
    pub fn switch(&self) -> SwitchId {
        self.switch
    }

    /// Metadata, once loaded.
    pub fn room(&self) -> Option<&Room> {
        self.room.as_ref()
    }

    /// True while the switch protocol is still running.
    pub fn is_transitioning(&self) -> bool {
        self.pending.is_some()
    }

    /// Effective mode. Falls back to the sentinel mode until metadata loads.
    pub fn mode(&self) -> RoomMode {
        self.room.as_ref().map_or_else(|| self.room_id.sentinel_mode(), Room::mode)
    }

    /// Messages in arrival order.
    pub fn messages(&self) -> &[Message] {
        self.stream.messages()
    }

    /// Send gate.
    pub fn gate(&self) -> &SendGate<I> {
        &self.gate
    }

    /// Placeholder animator.
    pub fn placeholder(&self) -> &PlaceholderAnimator<I> {
        &self.placeholder
    }

    /// True once this switch has requested its join.
    ///
    /// Pushes before that point would be overwritten by history.
    pub(crate) fn accepts_pushes(&self) -> bool {
        self.subscribed && self.pending.as_ref().is_none_or(|p| p.joining)
    }

    /// Release the send lock and stop the placeholder.
    pub(crate) fn settle(&mut self) {
        self.gate.release();
        self.placeholder.deactivate();
    }

    /// Earliest pending timer.
    pub(crate) fn next_deadline(&self) -> Option<I> {
        match (self.gate.next_deadline(), self.placeholder.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }
}

/// Observable view of the session for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Lifecycle phase.
    pub phase: SessionPhase,
    /// Selected room id. `None` when idle.
    pub room_id: Option<RoomId>,
    /// Metadata of the selected room, once loaded.
    pub room: Option<Room>,
    /// Effective mode of the selected room.
    pub mode: Option<RoomMode>,
    /// Switch in progress: entry effects and message rendering suppressed.
    pub transitioning: bool,
    /// Messages in arrival order.
    pub messages: Vec<Message>,
    /// A send is awaiting its terminal signal.
    pub locked: bool,
    /// Whole seconds of cooldown left.
    pub cooldown_remaining: u32,
    /// The generating indicator is running.
    pub placeholder_active: bool,
    /// Text shown as the input's placeholder.
    pub input_placeholder: String,
    /// Last reported problem, cleared by the next completed switch.
    pub status: Option<String>,
    /// Maximum message length in characters.
    pub max_message_len: usize,
    /// Length at which the input warns about the limit.
    pub near_limit_len: usize,
}

impl SessionSnapshot {
    /// Snapshot of an idle controller.
    pub fn idle(config: &SessionConfig) -> Self {
        Self {
            phase: SessionPhase::Idle,
            room_id: None,
            room: None,
            mode: None,
            transitioning: false,
            messages: Vec::new(),
            locked: false,
            cooldown_remaining: 0,
            placeholder_active: false,
            input_placeholder: String::new(),
            status: None,
            max_message_len: config.max_message_len,
            near_limit_len: config.near_limit_len,
        }
    }

    /// Capture `state`.
    pub(crate) fn capture<I: TimePoint>(
        state: &SessionState<I>,
        status: Option<&str>,
        config: &SessionConfig,
    ) -> Self {
        let phase =
            if state.is_transitioning() { SessionPhase::Switching } else { SessionPhase::Active };

        let input_placeholder = if state.placeholder.is_active() {
            state.placeholder.revealed_text().to_string()
        } else {
            let name = state
                .room
                .as_ref()
                .map(|r| r.display_name.as_str())
                .filter(|n| !n.is_empty())
                .unwrap_or("room");
            format!("Message in {name}...")
        };

        Self {
            phase,
            room_id: Some(state.room_id.clone()),
            room: state.room.clone(),
            mode: Some(state.mode()),
            transitioning: state.is_transitioning(),
            messages: state.messages().to_vec(),
            locked: state.gate.is_locked(),
            cooldown_remaining: state.gate.cooldown_remaining(),
            placeholder_active: state.placeholder.is_active(),
            input_placeholder,
            status: status.map(str::to_string),
            max_message_len: config.max_message_len,
            near_limit_len: config.near_limit_len,
        }
    }

    /// Messages the view should render. Empty while transitioning.
    pub fn visible_messages(&self) -> &[Message] {
        if self.transitioning { &[] } else { &self.messages }
    }

    /// True if the input accepts edits and submission.
    ///
    /// Editing is blocked while locked or cooling down, independent of the
    /// placeholder animation.
    pub fn input_enabled(&self) -> bool {
        self.phase == SessionPhase::Active && !self.locked && self.cooldown_remaining == 0
    }

    /// True if a draft of `len` characters should show a length warning.
    pub fn near_limit(&self, len: usize) -> bool {
        len > self.near_limit_len
    }

    /// Characters left before the limit (0 when over).
    pub fn remaining_chars(&self, len: usize) -> usize {
        self.max_message_len.saturating_sub(len)
    }
}
