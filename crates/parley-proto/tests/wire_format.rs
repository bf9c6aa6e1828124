//! Wire format tests against the server's JSON shapes.
//!
//! Outgoing payloads are pinned with inline snapshots; incoming bodies are
//! decoded from documents shaped exactly like the server's responses.

use parley_proto::{
    JoinRequest, MessagesEnvelope, OutgoingMessage, RoomEnvelope, RoomId, RoomMode,
};
use proptest::prelude::*;

#[test]
fn human_room_send_omits_ai_flag() {
    let payload =
        OutgoingMessage { room_id: RoomId::public(), text: "hello".into(), ai: false };
    let json = serde_json::to_string(&payload).unwrap();

    insta::assert_snapshot!(json, @r#"{"room_uuid":"685a64dcd94f6bbc0088f911","message":"hello"}"#);
}

#[test]
fn ai_room_send_carries_ai_flag() {
    let payload =
        OutgoingMessage { room_id: RoomId::ai(), text: "explain recursion".into(), ai: true };
    let json = serde_json::to_string(&payload).unwrap();

    insta::assert_snapshot!(json, @r#"{"room_uuid":"ai","message":"explain recursion","is_ai":true}"#);
}

#[test]
fn join_request_shape() {
    let payload = JoinRequest { room_id: RoomId::new("66aa").unwrap() };
    let json = serde_json::to_string(&payload).unwrap();

    insta::assert_snapshot!(json, @r#"{"room_uuid":"66aa"}"#);
}

#[test]
fn decode_room_envelope() {
    let body = br#"{
        "message": "Room retrieved successfully!",
        "room": {
            "_id": "66aa",
            "room_name": "Rustaceans",
            "owner": "ferris",
            "members": 12,
            "room_picture": "null",
            "room_join_code": "Ab3dE6gH",
            "created_at": "2025-01-01T00:00:00",
            "modified_at": "2025-01-01T00:00:00",
            "is_ai": false
        }
    }"#;

    let envelope = RoomEnvelope::from_json(body).unwrap();
    let room = envelope.room;

    assert_eq!(room.id.as_str(), "66aa");
    assert_eq!(room.display_name, "Rustaceans");
    assert_eq!(room.member_count, 12);
    assert_eq!(room.picture_ref, None, "\"null\" string means no picture");
    assert_eq!(room.mode(), RoomMode::Standard);
}

#[test]
fn decode_personal_ai_room() {
    let body = br#"{"room":{"_id":"77bb","room_name":"AI Room","members":1,"room_picture":null,"is_ai":true}}"#;

    let room = RoomEnvelope::from_json(body).unwrap().room;
    assert_eq!(room.mode(), RoomMode::Ai);
}

#[test]
fn decode_history_preserves_order() {
    let body = br#"{
        "message": "Messages retrieved successfully!",
        "messages": [
            {"_id": "2", "room_id": "66aa", "pfp": "seed-b", "user": "bob", "message": "second", "timestamp": "2025-01-01T00:00:05"},
            {"_id": "1", "room_id": "66aa", "pfp": null, "user": "AI", "message": "first", "timestamp": "2025-01-01T00:00:01"}
        ]
    }"#;

    let messages = MessagesEnvelope::from_json(body).unwrap().messages;
    let ids: Vec<_> = messages.iter().map(|m| m.id.as_str()).collect();

    assert_eq!(ids, ["2", "1"], "history is kept in body order, not timestamp order");
    assert!(messages[1].is_ai());
    assert_eq!(messages[0].author_avatar_ref.as_deref(), Some("seed-b"));
}

proptest! {
    #[test]
    fn prop_ordinary_ids_follow_room_flag(id in "[0-9a-f]{24}", is_ai in any::<bool>()) {
        prop_assume!(id != parley_proto::PUBLIC_ROOM_ID);

        let mut room = parley_proto::Room::unresolved(&RoomId::new(id).unwrap());
        room.is_ai = is_ai;

        let expected = if is_ai { RoomMode::Ai } else { RoomMode::Standard };
        prop_assert_eq!(room.mode(), expected);
    }

    #[test]
    fn prop_non_blank_ids_accepted(id in "[ -~]{0,32}") {
        let result = RoomId::new(id.clone());
        prop_assert_eq!(result.is_ok(), !id.trim().is_empty());
    }
}

#[test]
fn socket_frames() {
    use parley_proto::{ClientFrame, ServerFrame};

    let join = ClientFrame::Join(JoinRequest { room_id: RoomId::public() });
    insta::assert_snapshot!(join.to_json().unwrap(), @r#"{"event":"join","data":{"room_uuid":"685a64dcd94f6bbc0088f911"}}"#);

    let push = ServerFrame::from_json(
        r#"{"event":"message","data":[{"_id":"1","room_id":"ai","user":"AI","pfp":null,"message":"Hi","timestamp":"2025-01-01T00:00:00"}]}"#,
    )
    .unwrap();
    let ServerFrame::Message(batch) = push else {
        panic!("expected message frame");
    };
    assert!(batch[0].is_ai());
}
