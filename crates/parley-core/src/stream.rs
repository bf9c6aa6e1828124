//! Arrival-ordered message sequence.

use parley_proto::Message;

/// Append-only message sequence for one active session.
///
/// Messages are kept in the order they arrived. Nothing here sorts by
/// timestamp, so out-of-order delivery from the transport is preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageStream {
    messages: Vec<Message>,
}

/// Outcome of appending a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Appended {
    /// Number of messages appended.
    pub count: usize,
    /// The batch contained an assistant message.
    pub ai_completion: bool,
}

impl MessageStream {
    /// Empty stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stream seeded with fetched history.
    pub fn with_history(history: Vec<Message>) -> Self {
        Self { messages: history }
    }

    /// Append `batch` after existing content, preserving batch order.
    pub fn append(&mut self, batch: Vec<Message>) -> Appended {
        let ai_completion = batch.iter().any(Message::is_ai);
        let count = batch.len();
        self.messages.extend(batch);
        Appended { count, ai_completion }
    }

    /// Messages in arrival order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// True if no messages have arrived.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
