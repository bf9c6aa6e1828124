//! Scripted session driver.
//!
//! `SimSession` executes [`SessionAction`]s against an in-memory backend, but
//! instead of completing fetches and joins immediately it parks their results
//! in a queue. Tests decide when, and in what order, each result is
//! delivered, which is how stale-response races are reproduced
//! deterministically.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use parley_core::{
    Environment, FetchError, FetchTarget, Message, OutgoingMessage, Room, RoomId, SessionAction,
    SessionConfig, SessionController, SessionError, SessionEvent, SessionSnapshot,
    TransportError,
};
use parley_proto::AI_AUTHOR;

use crate::{
    InvariantRegistry, SystemSnapshot,
    sim_env::{SimEnv, SimInstant},
};

/// In-memory stand-in for the REST API and socket server.
#[derive(Debug, Clone, Default)]
pub struct SimBackend {
    rooms: BTreeMap<RoomId, Room>,
    histories: BTreeMap<RoomId, Vec<Message>>,
    /// Every dispatch fails.
    pub fail_sends: bool,
    /// Every join fails.
    pub fail_joins: bool,
}

impl SimBackend {
    /// Empty backend: every non-sentinel room is unknown.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a room with its history.
    #[must_use]
    pub fn with_room(mut self, room: Room, history: Vec<Message>) -> Self {
        self.histories.insert(room.id.clone(), history);
        self.rooms.insert(room.id.clone(), room);
        self
    }

    /// Register the public room's history.
    #[must_use]
    pub fn with_public_history(mut self, history: Vec<Message>) -> Self {
        self.histories.insert(RoomId::public(), history);
        self
    }

    fn room(&self, room_id: &RoomId) -> Result<Room, FetchError> {
        self.rooms
            .get(room_id)
            .cloned()
            .ok_or_else(|| FetchError::Http { status: 404, message: "Room not found".into() })
    }

    fn history(&self, room_id: &RoomId) -> Result<Vec<Message>, FetchError> {
        self.histories
            .get(room_id)
            .cloned()
            .ok_or_else(|| FetchError::Http { status: 404, message: "Room not found".into() })
    }
}

/// Deterministic driver around a [`SessionController`].
pub struct SimSession {
    env: SimEnv,
    controller: SessionController<SimInstant>,
    backend: SimBackend,
    /// Results of requested work, not yet delivered.
    pending: VecDeque<SessionEvent>,
    subscriptions: BTreeSet<RoomId>,
    sent: Vec<OutgoingMessage>,
    reported: Vec<SessionError>,
    draft: String,
    renders: usize,
    invariants: Option<InvariantRegistry>,
}

impl SimSession {
    /// Idle session over `backend`.
    pub fn new(config: SessionConfig, backend: SimBackend) -> Self {
        Self {
            env: SimEnv::new(),
            controller: SessionController::new(config),
            backend,
            pending: VecDeque::new(),
            subscriptions: BTreeSet::new(),
            sent: Vec::new(),
            reported: Vec::new(),
            draft: String::new(),
            renders: 0,
            invariants: None,
        }
    }

    /// Assert `registry` after every step.
    #[must_use]
    pub fn with_invariants(mut self, registry: InvariantRegistry) -> Self {
        self.invariants = Some(registry);
        self
    }

    /// Feed an event to the controller at the current virtual time.
    pub fn handle(&mut self, event: SessionEvent) {
        let context = format!("after {event:?}");
        let actions = self.controller.handle(self.env.now(), event);
        self.execute(actions);
        self.check(&context);
    }

    /// User selects a room.
    pub fn select(&mut self, room_id: RoomId) {
        self.handle(SessionEvent::SelectRoom { room_id });
    }

    /// User types `text` and submits it.
    pub fn send(&mut self, text: &str) {
        self.draft = text.to_string();
        self.handle(SessionEvent::SendMessage { text: text.to_string() });
    }

    /// Server pushes `batch` on the subscription for `room_id`.
    ///
    /// Delivered only if the transport holds that subscription.
    pub fn push(&mut self, room_id: &RoomId, batch: Vec<Message>) {
        if !self.subscriptions.contains(room_id) {
            tracing::debug!(%room_id, "no subscription, push dropped");
            return;
        }
        self.handle(SessionEvent::Incoming { room_id: room_id.clone(), batch });
    }

    /// Assistant answers on the AI room subscription.
    pub fn ai_reply(&mut self, text: &str) {
        let ai = RoomId::ai();
        let reply = Message {
            id: String::new(),
            room_id: ai.clone(),
            author: AI_AUTHOR.to_string(),
            author_avatar_ref: None,
            text: text.to_string(),
            sent_at: String::new(),
        };
        self.push(&ai, vec![reply]);
    }

    /// Server pushes an error payload.
    pub fn server_error(&mut self, room_id: Option<RoomId>, message: &str) {
        self.handle(SessionEvent::StreamError {
            room_id,
            error: TransportError::Server(message.to_string()),
        });
    }

    /// Advance virtual time and tick the controller.
    pub fn advance(&mut self, by: std::time::Duration) {
        self.env.advance(by);
        self.handle(SessionEvent::Tick);
    }

    /// Number of undelivered results.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Deliver the oldest pending result. Returns `false` if none.
    pub fn deliver_next(&mut self) -> bool {
        self.deliver(0)
    }

    /// Deliver the newest pending result. Returns `false` if none.
    pub fn deliver_last(&mut self) -> bool {
        match self.pending.len() {
            0 => false,
            n => self.deliver(n - 1),
        }
    }

    /// Deliver the pending result at `index`. Returns `false` if out of range.
    pub fn deliver(&mut self, index: usize) -> bool {
        let Some(event) = self.pending.remove(index) else {
            return false;
        };
        // The transport subscribes when the join lands, whoever asked for it.
        if let SessionEvent::Joined { room_id, .. } = &event {
            self.subscriptions.insert(room_id.clone());
        }
        self.handle(event);
        true
    }

    /// Deliver every pending result, oldest first, including results they
    /// cause.
    pub fn settle(&mut self) {
        while self.deliver_next() {}
    }

    /// Controller view.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.controller.snapshot()
    }

    /// Controller view plus transport state.
    pub fn system_snapshot(&self) -> SystemSnapshot {
        SystemSnapshot::from_session(self.snapshot(), self.controller.config())
            .with_subscriptions(self.subscriptions.iter().cloned())
    }

    /// Underlying controller.
    pub fn controller(&self) -> &SessionController<SimInstant> {
        &self.controller
    }

    /// Messages dispatched so far.
    pub fn sent(&self) -> &[OutgoingMessage] {
        &self.sent
    }

    /// Errors reported to the user so far.
    pub fn reported(&self) -> &[SessionError] {
        &self.reported
    }

    /// Current input draft.
    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// Live transport subscriptions.
    pub fn subscriptions(&self) -> &BTreeSet<RoomId> {
        &self.subscriptions
    }

    /// Number of renders requested.
    pub fn renders(&self) -> usize {
        self.renders
    }

    /// Current virtual time.
    pub fn now(&self) -> SimInstant {
        self.env.now()
    }

    fn execute(&mut self, actions: Vec<SessionAction>) {
        for action in actions {
            match action {
                SessionAction::Render => self.renders += 1,
                SessionAction::ReleaseSubscription { room_id } => {
                    self.subscriptions.remove(&room_id);
                },
                SessionAction::FetchRoom { switch, room_id } => {
                    let event = match self.backend.room(&room_id) {
                        Ok(room) => SessionEvent::RoomLoaded { switch, room },
                        Err(error) => {
                            SessionEvent::FetchFailed { switch, target: FetchTarget::Room, error }
                        },
                    };
                    self.pending.push_back(event);
                },
                SessionAction::FetchHistory { switch, room_id } => {
                    let event = match self.backend.history(&room_id) {
                        Ok(messages) => SessionEvent::HistoryLoaded { switch, messages },
                        Err(error) => SessionEvent::FetchFailed {
                            switch,
                            target: FetchTarget::History,
                            error,
                        },
                    };
                    self.pending.push_back(event);
                },
                SessionAction::Join { switch, room_id } => {
                    let event = if self.backend.fail_joins {
                        SessionEvent::JoinFailed {
                            switch,
                            room_id,
                            error: TransportError::Join("refused".into()),
                        }
                    } else {
                        SessionEvent::Joined { switch, room_id }
                    };
                    self.pending.push_back(event);
                },
                SessionAction::Send(outgoing) => {
                    if self.backend.fail_sends {
                        self.pending.push_back(SessionEvent::SendFailed {
                            room_id: outgoing.room_id.clone(),
                            text: outgoing.text.clone(),
                            error: TransportError::Send("socket closed".into()),
                        });
                    }
                    self.sent.push(outgoing);
                },
                SessionAction::ClearInput => self.draft.clear(),
                SessionAction::RestoreInput { text } => self.draft = text,
                SessionAction::ReportError(error) => self.reported.push(error),
            }
        }
    }

    fn check(&self, context: &str) {
        if let Some(registry) = &self.invariants {
            registry.assert_all(&self.system_snapshot(), context);
        }
    }
}
