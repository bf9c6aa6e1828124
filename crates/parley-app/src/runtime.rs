//! Async runtime for the session engine.
//!
//! The Runtime owns the [`SessionController`] and is the only place that
//! mutates it. A single `tokio::select!` loop serializes everything the
//! controller reacts to:
//!
//! - commands from the [`SessionHandle`] (select room, send, logout)
//! - pushes from the [`Transport`]
//! - completions of fetch, join and send tasks
//! - timer deadlines for cooldown and placeholder reveal
//!
//! Actions coming back from the controller are executed here: I/O is spawned
//! onto a `JoinSet` whose results re-enter the loop as events, snapshots are
//! published through a `watch` channel, and input/error notices through a
//! `broadcast` channel.

use std::sync::Arc;

use parley_core::{
    Environment, FetchTarget, RoomId, SessionAction, SessionConfig, SessionController,
    SessionError, SessionEvent, SessionSnapshot,
};
use tokio::{
    sync::{broadcast, mpsc, watch},
    task::JoinSet,
};

use crate::{Credential, RoomApi, RuntimeError, SessionContext, Transport, TransportEvent};

/// Runtime channel sizes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Commands buffered from the handle.
    pub command_capacity: usize,
    /// Notices buffered per subscriber before the oldest are dropped.
    pub notice_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self { command_capacity: 32, notice_capacity: 64 }
    }
}

/// Input-side effects and user-facing errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Clear the input draft.
    ClearInput,
    /// Put this text back into the input draft.
    RestoreInput(String),
    /// Show a non-fatal error.
    Error(SessionError),
}

#[derive(Debug)]
enum Command {
    SelectRoom(RoomId),
    SendMessage(String),
    Logout,
}

/// UI-side handle to a running session.
///
/// Cheap to clone. Every clone talks to the same runtime.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<SessionSnapshot>,
    notices: broadcast::Sender<Notice>,
}

impl SessionHandle {
    /// Switch to `room_id`.
    pub async fn select_room(&self, room_id: RoomId) -> Result<(), RuntimeError> {
        self.command(Command::SelectRoom(room_id)).await
    }

    /// Submit `text` from the input.
    ///
    /// Rejections are silent apart from the over-length notice in the
    /// snapshot status.
    pub async fn send_message(&self, text: impl Into<String>) -> Result<(), RuntimeError> {
        self.command(Command::SendMessage(text.into())).await
    }

    /// Release the room, drop the credential, and stop the runtime.
    pub async fn logout(&self) -> Result<(), RuntimeError> {
        self.command(Command::Logout).await
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver notified on every published snapshot.
    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    /// Subscribe to notices published from now on.
    pub fn notices(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }

    async fn command(&self, command: Command) -> Result<(), RuntimeError> {
        self.commands.send(command).await.map_err(|_| RuntimeError::Closed)
    }
}

/// Session event loop.
///
/// # Type Parameters
///
/// - `E`: clock used for timer deadlines
/// - `A`: REST collaborator
/// - `T`: live connection collaborator
pub struct Runtime<E: Environment, A, T> {
    env: E,
    api: Arc<A>,
    transport: Arc<T>,
    context: SessionContext,
    credential: Credential,
    controller: SessionController<E::Instant>,
    commands: mpsc::Receiver<Command>,
    pushes: mpsc::Receiver<TransportEvent>,
    /// In-flight I/O. Each finished task yields the event it produced, if any.
    tasks: JoinSet<Option<SessionEvent>>,
    snapshots: watch::Sender<SessionSnapshot>,
    notices: broadcast::Sender<Notice>,
}

impl<E, A, T> Runtime<E, A, T>
where
    E: Environment,
    A: RoomApi,
    T: Transport,
{
    /// Create a runtime and its handle.
    ///
    /// `pushes` is the receiver paired with `transport`.
    ///
    /// # Errors
    ///
    /// - `RuntimeError::Unauthenticated` if `context` holds no credential
    pub fn new(
        env: E,
        api: A,
        transport: T,
        pushes: mpsc::Receiver<TransportEvent>,
        context: SessionContext,
        session: SessionConfig,
        config: &RuntimeConfig,
    ) -> Result<(Self, SessionHandle), RuntimeError> {
        let credential = context.credential().cloned().ok_or(RuntimeError::Unauthenticated)?;

        let controller = SessionController::new(session);
        let (commands_tx, commands) = mpsc::channel(config.command_capacity);
        let (snapshots, snapshots_rx) = watch::channel(controller.snapshot());
        let (notices, _) = broadcast::channel(config.notice_capacity);

        let handle =
            SessionHandle { commands: commands_tx, snapshots: snapshots_rx, notices: notices.clone() };

        let runtime = Self {
            env,
            api: Arc::new(api),
            transport: Arc::new(transport),
            context,
            credential,
            controller,
            commands,
            pushes,
            tasks: JoinSet::new(),
            snapshots,
            notices,
        };

        Ok((runtime, handle))
    }

    /// Run until logout or until every handle is dropped.
    ///
    /// Returns the logged-out context.
    pub async fn run(mut self) -> SessionContext {
        tracing::debug!("session runtime started");

        loop {
            let env = self.env.clone();
            let deadline = self.controller.next_deadline();
            let timer = async move {
                match deadline {
                    Some(at) => env.sleep(env.until(at)).await,
                    None => std::future::pending().await,
                }
            };

            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::SelectRoom(room_id)) => {
                        self.dispatch(SessionEvent::SelectRoom { room_id });
                    },
                    Some(Command::SendMessage(text)) => {
                        self.dispatch(SessionEvent::SendMessage { text });
                    },
                    Some(Command::Logout) | None => break,
                },

                Some(push) = self.pushes.recv() => {
                    let event = match push {
                        TransportEvent::Batch { room_id, batch } => {
                            SessionEvent::Incoming { room_id, batch }
                        },
                        TransportEvent::Error { room_id, error } => {
                            SessionEvent::StreamError { room_id, error }
                        },
                    };
                    self.dispatch(event);
                },

                Some(done) = self.tasks.join_next(), if !self.tasks.is_empty() => match done {
                    Ok(Some(event)) => self.dispatch(event),
                    Ok(None) => {},
                    Err(e) => tracing::warn!(error = %e, "session task failed"),
                },

                () = timer => self.dispatch(SessionEvent::Tick),
            }
        }

        let actions = self.controller.close();
        self.execute(actions);
        self.tasks.abort_all();
        self.context.logout();

        tracing::debug!("session runtime stopped");
        self.context
    }

    fn dispatch(&mut self, event: SessionEvent) {
        let actions = self.controller.handle(self.env.now(), event);
        self.execute(actions);
    }

    fn execute(&mut self, actions: Vec<SessionAction>) {
        for action in actions {
            match action {
                SessionAction::Render => {
                    self.snapshots.send_replace(self.controller.snapshot());
                },
                SessionAction::ReleaseSubscription { room_id } => self.transport.release(&room_id),
                SessionAction::FetchRoom { switch, room_id } => {
                    let api = Arc::clone(&self.api);
                    let credential = self.credential.clone();
                    self.tasks.spawn(async move {
                        Some(match api.fetch_room(&credential, &room_id).await {
                            Ok(room) => SessionEvent::RoomLoaded { switch, room },
                            Err(error) => {
                                SessionEvent::FetchFailed { switch, target: FetchTarget::Room, error }
                            },
                        })
                    });
                },
                SessionAction::FetchHistory { switch, room_id } => {
                    let api = Arc::clone(&self.api);
                    let credential = self.credential.clone();
                    self.tasks.spawn(async move {
                        Some(match api.fetch_history(&credential, &room_id).await {
                            Ok(messages) => SessionEvent::HistoryLoaded { switch, messages },
                            Err(error) => SessionEvent::FetchFailed {
                                switch,
                                target: FetchTarget::History,
                                error,
                            },
                        })
                    });
                },
                SessionAction::Join { switch, room_id } => {
                    let transport = Arc::clone(&self.transport);
                    self.tasks.spawn(async move {
                        Some(match transport.join(&room_id).await {
                            Ok(()) => SessionEvent::Joined { switch, room_id },
                            Err(error) => SessionEvent::JoinFailed { switch, room_id, error },
                        })
                    });
                },
                SessionAction::Send(outgoing) => {
                    let transport = Arc::clone(&self.transport);
                    self.tasks.spawn(async move {
                        // The echo of a successful send arrives as a push.
                        transport.send(&outgoing).await.err().map(|error| {
                            SessionEvent::SendFailed {
                                room_id: outgoing.room_id,
                                text: outgoing.text,
                                error,
                            }
                        })
                    });
                },
                SessionAction::ClearInput => self.notify(Notice::ClearInput),
                SessionAction::RestoreInput { text } => self.notify(Notice::RestoreInput(text)),
                SessionAction::ReportError(error) => {
                    tracing::warn!(%error, "session error");
                    self.notify(Notice::Error(error));
                },
            }
        }
    }

    fn notify(&self, notice: Notice) {
        // No subscribers is fine; notices are advisory.
        if self.notices.send(notice).is_err() {
            tracing::trace!("notice dropped, no subscribers");
        }
    }
}
