//! Session input events.
//!
//! This module defines [`SessionEvent`], the complete set of inputs that drive
//! the [`crate::SessionController`].
//!
//! Events originate from three sources:
//! - User intents (select a room, send a message).
//! - Completions of asynchronous work the controller requested (fetches,
//!   joins, dispatch failures). These carry the [`SwitchId`] they were
//!   requested under so stale results can be recognized.
//! - Transport pushes and the passage of time.

use parley_proto::{Message, Room, RoomId};

use crate::{FetchError, TransportError, session::SwitchId};

/// Which REST call a fetch result belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchTarget {
    /// Room metadata.
    Room,
    /// Message history.
    History,
}

/// Events processed by the session controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// User selected a room.
    SelectRoom {
        /// Room to switch to.
        room_id: RoomId,
    },

    /// User submitted a message.
    SendMessage {
        /// Draft text, exactly as typed.
        text: String,
    },

    /// Room metadata arrived.
    RoomLoaded {
        /// Switch that requested it.
        switch: SwitchId,
        /// Fetched metadata.
        room: Room,
    },

    /// Message history arrived.
    HistoryLoaded {
        /// Switch that requested it.
        switch: SwitchId,
        /// History in server order.
        messages: Vec<Message>,
    },

    /// A metadata or history fetch failed.
    FetchFailed {
        /// Switch that requested it.
        switch: SwitchId,
        /// Which fetch failed.
        target: FetchTarget,
        /// Failure cause.
        error: FetchError,
    },

    /// Transport subscription is live.
    Joined {
        /// Switch that requested it.
        switch: SwitchId,
        /// Subscribed room.
        room_id: RoomId,
    },

    /// Transport subscription could not be opened.
    JoinFailed {
        /// Switch that requested it.
        switch: SwitchId,
        /// Room that failed.
        room_id: RoomId,
        /// Failure cause.
        error: TransportError,
    },

    /// Transport pushed a message batch.
    Incoming {
        /// Room of the subscription that delivered the batch.
        room_id: RoomId,
        /// Messages in delivery order.
        batch: Vec<Message>,
    },

    /// Transport reported a stream error.
    StreamError {
        /// Room of the subscription that failed. `None` for connection-level
        /// errors, which always apply to the current session.
        room_id: Option<RoomId>,
        /// Failure cause.
        error: TransportError,
    },

    /// An accepted message could not be dispatched.
    SendFailed {
        /// Room the message was sent to.
        room_id: RoomId,
        /// Original text, restored to the input.
        text: String,
        /// Failure cause.
        error: TransportError,
    },

    /// Time passed; advance timers.
    Tick,
}
