//! Fuzz target for the session engine under arbitrary interleavings.
//!
//! # Invariants
//!
//! - Rendered messages always belong to the selected room
//! - Cooldown never exceeds the configured seconds
//! - Only the AI room ever holds the send lock
//! - At most one room subscription is live
//! - An idle session shows nothing and holds nothing
//! - Once every parked result is delivered, the last selection is active

#![no_main]

use libfuzzer_sys::fuzz_target;
use parley_harness::{InvariantRegistry, Operation, SimSession};

fuzz_target!(|ops: Vec<Operation>| {
    let mut sim = SimSession::universe().with_invariants(InvariantRegistry::standard());
    for op in &ops {
        sim.apply(op);
    }
    sim.settle();

    if ops.iter().any(|op| matches!(op, Operation::Select { .. })) {
        let snapshot = sim.snapshot();
        assert!(snapshot.room_id.is_some());
        assert!(!snapshot.transitioning);
    }
});
