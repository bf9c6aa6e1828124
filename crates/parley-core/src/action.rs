//! Session side-effects and intents.
//!
//! [`SessionAction`] values are instructions produced by the
//! [`crate::SessionController`] for the runtime to execute. The controller
//! performs no I/O itself.

use parley_proto::{OutgoingMessage, RoomId};

use crate::{SessionError, session::SwitchId};

/// Actions produced by the session controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Publish a fresh snapshot to observers.
    Render,

    /// Drop the transport subscription and all listeners for a room.
    ReleaseSubscription {
        /// Room to unsubscribe from.
        room_id: RoomId,
    },

    /// Fetch room metadata.
    FetchRoom {
        /// Switch to tag the result with.
        switch: SwitchId,
        /// Room to fetch.
        room_id: RoomId,
    },

    /// Fetch message history.
    FetchHistory {
        /// Switch to tag the result with.
        switch: SwitchId,
        /// Room to fetch.
        room_id: RoomId,
    },

    /// Subscribe the transport to a room.
    Join {
        /// Switch to tag the result with.
        switch: SwitchId,
        /// Room to join.
        room_id: RoomId,
    },

    /// Dispatch a message. Fire-and-forget; failures come back as
    /// [`crate::SessionEvent::SendFailed`].
    Send(OutgoingMessage),

    /// Clear the input draft.
    ClearInput,

    /// Put text back into the input draft.
    RestoreInput {
        /// Text to restore.
        text: String,
    },

    /// Tell the user about a non-fatal failure.
    ReportError(SessionError),
}
