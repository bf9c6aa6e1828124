//! Room session state machine.
//!
//! [`SessionController`] owns the selected room, drives the switch protocol,
//! and routes sends and pushes through the gate, stream and placeholder. It is
//! a pure state machine: it consumes [`SessionEvent`]s and returns
//! [`SessionAction`]s for the runtime to execute. Time enters only through
//! the `now` parameter.
//!
//! # Switch protocol
//!
//! ```text
//! ┌──────┐ select ┌───────────┐ room + history ┌─────────┐ joined ┌────────┐
//! │ Idle │───────>│ Switching │───────────────>│ Joining │───────>│ Active │
//! └──────┘        └───────────┘                └─────────┘        └────────┘
//!                   ^    │ select (new switch id)                     │
//!                   └────┴────────────────────────────────────────────┘
//! ```
//!
//! Each selection creates a new [`SwitchId`]. The previous state is dropped
//! (its subscription released first), and any fetch or join result tagged
//! with an older id is discarded when it arrives. Pushes are accepted only
//! from the subscription of the selected room.

use parley_proto::{Message, OutgoingMessage, Room, RoomId};

use crate::{
    FetchError, SessionAction, SessionConfig, SessionError, SessionEvent, SessionSnapshot,
    TransportError, ValidationError,
    env::TimePoint,
    event::FetchTarget,
    session::{PendingSwitch, SessionPhase, SessionState, SwitchId},
    stream::MessageStream,
};

/// Session state machine.
///
/// No I/O dependencies; fully testable in simulation.
#[derive(Debug, Clone)]
pub struct SessionController<I> {
    config: SessionConfig,
    /// Last issued switch id.
    last_switch: SwitchId,
    /// `None` while idle.
    session: Option<SessionState<I>>,
    /// Last reported problem.
    status: Option<String>,
}

impl<I: TimePoint> SessionController<I> {
    /// Create an idle controller.
    pub fn new(config: SessionConfig) -> Self {
        Self { config, last_switch: SwitchId::new(0), session: None, status: None }
    }

    /// Process an event at time `now` and return actions.
    pub fn handle(&mut self, now: I, event: SessionEvent) -> Vec<SessionAction> {
        match event {
            SessionEvent::SelectRoom { room_id } => self.select_room(room_id),
            SessionEvent::SendMessage { text } => match self.send_message(now, &text) {
                Ok(actions) => actions,
                Err(reason) => self.rejected(reason),
            },
            SessionEvent::RoomLoaded { switch, room } => self.room_loaded(switch, room),
            SessionEvent::HistoryLoaded { switch, messages } => {
                self.history_loaded(switch, messages)
            },
            SessionEvent::FetchFailed { switch, target, error } => {
                self.fetch_failed(switch, target, error)
            },
            SessionEvent::Joined { switch, room_id } => self.joined(switch, &room_id),
            SessionEvent::JoinFailed { switch, room_id, error } => {
                self.join_failed(switch, &room_id, error)
            },
            SessionEvent::Incoming { room_id, batch } => self.incoming(&room_id, batch),
            SessionEvent::StreamError { room_id, error } => {
                self.stream_error(room_id.as_ref(), error)
            },
            SessionEvent::SendFailed { room_id, text, error } => {
                self.send_failed(&room_id, text, error)
            },
            SessionEvent::Tick => self.tick(now),
        }
    }

    /// Switch to `room_id`.
    ///
    /// No-op if `room_id` is already selected, whether active or still
    /// switching.
    pub fn select_room(&mut self, room_id: RoomId) -> Vec<SessionAction> {
        if self.session.as_ref().is_some_and(|s| s.room_id == room_id) {
            return vec![];
        }

        let mut actions = Vec::new();

        if let Some(previous) = self.session.take()
            && previous.subscribed
        {
            actions.push(SessionAction::ReleaseSubscription { room_id: previous.room_id });
        }

        self.last_switch = self.last_switch.next();
        let switch = self.last_switch;
        tracing::debug!(%room_id, %switch, "switching room");

        let mut state = SessionState::switching(room_id.clone(), switch, &self.config);

        match Room::sentinel(&room_id) {
            Some(room) => state.room = Some(room),
            None => actions.push(SessionAction::FetchRoom { switch, room_id: room_id.clone() }),
        }

        // The assistant room has no server-side history.
        if room_id.is_ai_sentinel() {
            state.pending = Some(PendingSwitch { history: Some(Vec::new()), joining: false });
        } else {
            actions.push(SessionAction::FetchHistory { switch, room_id });
        }

        self.session = Some(state);
        actions.extend(self.maybe_join());
        actions.push(SessionAction::Render);
        actions
    }

    /// Try to send `text` to the active room.
    ///
    /// # Errors
    ///
    /// Returns the [`ValidationError`] that refused the send. Nothing is
    /// dispatched and no state changes on rejection.
    pub fn send_message(
        &mut self,
        now: I,
        text: &str,
    ) -> Result<Vec<SessionAction>, ValidationError> {
        if text.trim().is_empty() {
            return Err(ValidationError::Empty);
        }

        let Some(state) = self.session.as_mut().filter(|s| !s.is_transitioning()) else {
            return Err(ValidationError::NoActiveRoom);
        };

        state.gate.check(text)?;

        let ai = state.mode().is_ai();
        state.gate.accept(now);
        if ai {
            state.placeholder.activate(now);
        }

        let outgoing = OutgoingMessage { room_id: state.room_id.clone(), text: text.to_string(), ai };

        if !ai {
            state.gate.release();
        }

        tracing::debug!(room_id = %state.room_id, ai, "message accepted");

        Ok(vec![SessionAction::ClearInput, SessionAction::Send(outgoing), SessionAction::Render])
    }

    /// Current state as a snapshot for rendering.
    pub fn snapshot(&self) -> SessionSnapshot {
        match &self.session {
            Some(state) => SessionSnapshot::capture(state, self.status.as_deref(), &self.config),
            None => {
                let mut snapshot = SessionSnapshot::idle(&self.config);
                snapshot.status.clone_from(&self.status);
                snapshot
            },
        }
    }

    /// Coarse lifecycle phase.
    pub fn phase(&self) -> SessionPhase {
        match &self.session {
            None => SessionPhase::Idle,
            Some(s) if s.is_transitioning() => SessionPhase::Switching,
            Some(_) => SessionPhase::Active,
        }
    }

    /// Live state of the selected room. `None` when idle.
    pub fn session(&self) -> Option<&SessionState<I>> {
        self.session.as_ref()
    }

    /// Selected room id. `None` when idle.
    pub fn active_room(&self) -> Option<&RoomId> {
        self.session.as_ref().map(|s| &s.room_id)
    }

    /// Last reported problem.
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Configuration in use.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Earliest instant at which [`SessionEvent::Tick`] would change state.
    pub fn next_deadline(&self) -> Option<I> {
        self.session.as_ref().and_then(SessionState::next_deadline)
    }

    /// Drop the session, releasing its subscription.
    ///
    /// Used at logout; the controller returns to idle.
    pub fn close(&mut self) -> Vec<SessionAction> {
        let mut actions = Vec::new();
        if let Some(state) = self.session.take()
            && state.subscribed
        {
            actions.push(SessionAction::ReleaseSubscription { room_id: state.room_id });
        }
        self.status = None;
        actions.push(SessionAction::Render);
        actions
    }

    /// Current session if `switch` is its switch and it is still switching.
    fn pending_for(&mut self, switch: SwitchId) -> Option<&mut SessionState<I>> {
        match self.session.as_mut() {
            Some(state) if state.switch == switch && state.is_transitioning() => Some(state),
            _ => {
                tracing::debug!(%switch, "discarding stale switch result");
                None
            },
        }
    }

    fn room_loaded(&mut self, switch: SwitchId, room: Room) -> Vec<SessionAction> {
        let Some(state) = self.pending_for(switch) else {
            return vec![];
        };

        if room.id != state.room_id {
            tracing::warn!(expected = %state.room_id, got = %room.id, "metadata for wrong room");
        }
        state.room = Some(Room { id: state.room_id.clone(), ..room });

        self.maybe_join()
    }

    fn history_loaded(
        &mut self,
        switch: SwitchId,
        messages: Vec<Message>,
    ) -> Vec<SessionAction> {
        let Some(state) = self.pending_for(switch) else {
            return vec![];
        };

        if let Some(pending) = state.pending.as_mut() {
            pending.history = Some(messages);
        }

        self.maybe_join()
    }

    fn fetch_failed(
        &mut self,
        switch: SwitchId,
        target: FetchTarget,
        error: FetchError,
    ) -> Vec<SessionAction> {
        let Some(state) = self.pending_for(switch) else {
            return vec![];
        };

        tracing::warn!(room_id = %state.room_id, ?target, %error, "fetch failed");

        match target {
            FetchTarget::Room => state.room = Some(Room::unresolved(&state.room_id)),
            FetchTarget::History => {
                if let Some(pending) = state.pending.as_mut() {
                    pending.history = Some(Vec::new());
                }
            },
        }
        state.settle();

        let mut actions = self.report(SessionError::Fetch(error));
        actions.extend(self.maybe_join());
        actions
    }

    /// Request the join once metadata and history are both in.
    fn maybe_join(&mut self) -> Vec<SessionAction> {
        let Some(state) = self.session.as_mut() else {
            return vec![];
        };
        let Some(pending) = state.pending.as_mut() else {
            return vec![];
        };
        if pending.joining || state.room.is_none() {
            return vec![];
        }
        let Some(history) = pending.history.take() else {
            return vec![];
        };

        pending.joining = true;
        state.stream = MessageStream::with_history(history);
        state.subscribed = true;

        vec![SessionAction::Join { switch: state.switch, room_id: state.room_id.clone() }]
    }

    fn joined(&mut self, switch: SwitchId, room_id: &RoomId) -> Vec<SessionAction> {
        let Some(state) = self.session.as_mut() else {
            return vec![SessionAction::ReleaseSubscription { room_id: room_id.clone() }];
        };

        if state.switch != switch || !state.is_transitioning() {
            if state.room_id == *room_id {
                // An earlier visit's join is live again; release it on exit.
                state.subscribed = true;
                return vec![];
            }
            tracing::debug!(%room_id, %switch, "releasing join of abandoned room");
            return vec![SessionAction::ReleaseSubscription { room_id: room_id.clone() }];
        }

        state.pending = None;
        let clean = !state.switch_error;
        tracing::debug!(room_id = %state.room_id, %switch, "room active");

        if clean {
            self.status = None;
        }

        vec![SessionAction::Render]
    }

    fn join_failed(
        &mut self,
        switch: SwitchId,
        room_id: &RoomId,
        error: TransportError,
    ) -> Vec<SessionAction> {
        let Some(state) = self.pending_for(switch) else {
            return vec![];
        };

        tracing::warn!(%room_id, %error, "join failed");
        state.pending = None;
        state.subscribed = false;
        state.settle();

        self.report(SessionError::Transport(error))
    }

    fn incoming(&mut self, room_id: &RoomId, batch: Vec<Message>) -> Vec<SessionAction> {
        let Some(state) =
            self.session.as_mut().filter(|s| s.accepts_pushes() && s.room_id == *room_id)
        else {
            tracing::debug!(%room_id, count = batch.len(), "discarding batch for unselected room");
            return vec![];
        };

        let (batch, foreign): (Vec<_>, Vec<_>) =
            batch.into_iter().partition(|m| m.room_id == state.room_id);
        if !foreign.is_empty() {
            tracing::warn!(%room_id, count = foreign.len(), "dropping messages tagged for another room");
        }

        let appended = state.stream.append(batch);
        if appended.ai_completion {
            tracing::debug!(%room_id, "assistant replied");
            state.settle();
        }

        if appended.count == 0 && !appended.ai_completion {
            return vec![];
        }
        vec![SessionAction::Render]
    }

    fn stream_error(
        &mut self,
        room_id: Option<&RoomId>,
        error: TransportError,
    ) -> Vec<SessionAction> {
        let Some(state) = self.session.as_mut() else {
            return self.report(SessionError::Transport(error));
        };

        if room_id.is_some_and(|r| *r != state.room_id) {
            tracing::debug!(?room_id, %error, "discarding error for unselected room");
            return vec![];
        }

        state.settle();
        self.report(SessionError::Transport(error))
    }

    fn send_failed(
        &mut self,
        room_id: &RoomId,
        text: String,
        error: TransportError,
    ) -> Vec<SessionAction> {
        let Some(state) = self.session.as_mut().filter(|s| s.room_id == *room_id) else {
            return vec![];
        };

        state.settle();

        let mut actions = vec![SessionAction::RestoreInput { text }];
        actions.extend(self.report(SessionError::Transport(error)));
        actions
    }

    fn tick(&mut self, now: I) -> Vec<SessionAction> {
        let Some(state) = self.session.as_mut() else {
            return vec![];
        };

        let cooled = state.gate.tick(now);
        let revealed = state.placeholder.tick(now);

        if cooled || revealed { vec![SessionAction::Render] } else { vec![] }
    }

    fn rejected(&mut self, reason: ValidationError) -> Vec<SessionAction> {
        tracing::debug!(%reason, "send rejected");
        if reason.is_user_visible() {
            self.status = Some(reason.to_string());
            return vec![SessionAction::Render];
        }
        vec![]
    }

    fn report(&mut self, error: SessionError) -> Vec<SessionAction> {
        if let Some(state) = self.session.as_mut()
            && state.is_transitioning()
        {
            state.switch_error = true;
        }
        self.status = Some(error.to_string());
        vec![SessionAction::ReportError(error), SessionAction::Render]
    }
}
