//! Fuzz target for socket frame and REST envelope decoding.
//!
//! Arbitrary text must decode to a value or an error, never panic. Error
//! payloads of any JSON shape must still describe to some text.

#![no_main]

use libfuzzer_sys::fuzz_target;
use parley_proto::{ClientFrame, MessagesEnvelope, RoomEnvelope, ServerFrame, describe_error_payload};

fuzz_target!(|data: &[u8]| {
    let _ = RoomEnvelope::from_json(data);
    let _ = MessagesEnvelope::from_json(data);

    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(ServerFrame::Error(payload)) = ServerFrame::from_json(text) {
        let _ = describe_error_payload(&payload);
    }
    let _ = ClientFrame::from_json(text);
});
