//! REST collaborator for room metadata and history.

use std::future::Future;

use parley_core::{FetchError, Message, Room, RoomId};

use crate::Credential;

/// Retrieves room metadata and message history.
///
/// The runtime calls these from spawned tasks, one per request. Results are
/// tagged with the switch that asked for them before they reach the
/// controller, so implementations need no cancellation support.
///
/// # Implementations
///
/// - [`crate::local::LocalRoomApi`]: in-process store
/// - `HttpRoomApi` (feature `http`): the REST endpoints over HTTP
pub trait RoomApi: Send + Sync + 'static {
    /// Fetch metadata for `room_id`.
    fn fetch_room(
        &self,
        credential: &Credential,
        room_id: &RoomId,
    ) -> impl Future<Output = Result<Room, FetchError>> + Send;

    /// Fetch the message history of `room_id`, oldest first.
    fn fetch_history(
        &self,
        credential: &Credential,
        room_id: &RoomId,
    ) -> impl Future<Output = Result<Vec<Message>, FetchError>> + Send;
}
