//! Standard invariant checks.
//!
//! These capture properties that must hold after every event, whatever order
//! fetches, joins and pushes arrive in.

use parley_core::{RoomMode, SessionPhase};

use super::{Invariant, InvariantResult, SystemSnapshot, Violation};

/// Every message shown belongs to the selected room.
///
/// A message from any other room means a push or a stale history response
/// leaked across a switch.
pub struct MessagesBelongToRoom;

impl Invariant for MessagesBelongToRoom {
    fn name(&self) -> &'static str {
        "MessagesBelongToRoom"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        let session = &state.session;
        let Some(room_id) = &session.room_id else {
            if session.messages.is_empty() {
                return Ok(());
            }
            return Err(Violation {
                invariant: self.name(),
                message: format!("idle session holds {} messages", session.messages.len()),
            });
        };

        match session.messages.iter().find(|m| m.room_id != *room_id) {
            Some(stray) => Err(Violation {
                invariant: self.name(),
                message: format!("room {room_id} shows message from {}", stray.room_id),
            }),
            None => Ok(()),
        }
    }
}

/// Cooldown never exceeds its configured length.
pub struct CooldownBounded;

impl Invariant for CooldownBounded {
    fn name(&self) -> &'static str {
        "CooldownBounded"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        let remaining = state.session.cooldown_remaining;
        if remaining > state.cooldown_secs {
            return Err(Violation {
                invariant: self.name(),
                message: format!("cooldown {remaining} > configured {}", state.cooldown_secs),
            });
        }
        Ok(())
    }
}

/// The send lock outlives dispatch only in AI rooms, and the placeholder
/// runs only while it is held.
pub struct LockOnlyForAi;

impl Invariant for LockOnlyForAi {
    fn name(&self) -> &'static str {
        "LockOnlyForAi"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        let session = &state.session;
        let ai = session.mode.is_some_and(RoomMode::is_ai);

        if session.locked && !ai {
            return Err(Violation {
                invariant: self.name(),
                message: format!("lock held in {:?} room", session.mode),
            });
        }
        if session.placeholder_active && !session.locked {
            return Err(Violation {
                invariant: self.name(),
                message: "placeholder running without a pending send".to_string(),
            });
        }
        Ok(())
    }
}

/// At most one subscription is live, and only for the selected room.
pub struct SingleSubscription;

impl Invariant for SingleSubscription {
    fn name(&self) -> &'static str {
        "SingleSubscription"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        let selected = state.session.room_id.as_ref();
        match state.subscriptions.iter().find(|r| Some(*r) != selected) {
            Some(extra) => Err(Violation {
                invariant: self.name(),
                message: format!("subscription for {extra} while {selected:?} is selected"),
            }),
            None => Ok(()),
        }
    }
}

/// An idle session shows nothing and blocks input.
pub struct IdleIsInert;

impl Invariant for IdleIsInert {
    fn name(&self) -> &'static str {
        "IdleIsInert"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        let session = &state.session;
        if session.phase != SessionPhase::Idle {
            return Ok(());
        }
        if session.room.is_some() || session.locked || session.input_enabled() {
            return Err(Violation {
                invariant: self.name(),
                message: format!("idle session is not inert: {session:?}"),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use parley_core::{Message, SessionConfig};
    use parley_proto::RoomId;

    use super::*;

    fn active(room: &str) -> SystemSnapshot {
        let mut snapshot = SystemSnapshot::empty();
        snapshot.session.phase = SessionPhase::Active;
        snapshot.session.room_id = Some(RoomId::new(room).unwrap());
        snapshot.session.mode = Some(RoomMode::Standard);
        snapshot
    }

    #[test]
    fn stray_message_is_a_violation() {
        let mut snapshot = active("a");
        snapshot.session.messages.push(Message {
            id: String::new(),
            room_id: RoomId::new("b").unwrap(),
            author: "ann".into(),
            author_avatar_ref: None,
            text: "hi".into(),
            sent_at: String::new(),
        });
        assert!(MessagesBelongToRoom.check(&snapshot).is_err());
    }

    #[test]
    fn lock_in_human_room_is_a_violation() {
        let mut snapshot = active("a");
        snapshot.session.locked = true;
        assert!(LockOnlyForAi.check(&snapshot).is_err());

        snapshot.session.mode = Some(RoomMode::Ai);
        assert!(LockOnlyForAi.check(&snapshot).is_ok());
    }

    #[test]
    fn subscription_for_other_room_is_a_violation() {
        let snapshot = active("a").with_subscriptions([RoomId::new("b").unwrap()]);
        assert!(SingleSubscription.check(&snapshot).is_err());

        let snapshot = active("a").with_subscriptions([RoomId::new("a").unwrap()]);
        assert!(SingleSubscription.check(&snapshot).is_ok());
    }

    #[test]
    fn cooldown_over_configured_is_a_violation() {
        let mut snapshot = SystemSnapshot::from_session(
            active("a").session,
            &SessionConfig { cooldown_secs: 2, ..SessionConfig::default() },
        );
        snapshot.session.cooldown_remaining = 3;
        assert!(CooldownBounded.check(&snapshot).is_err());
    }
}
