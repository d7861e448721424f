// WebSocket wire protocol shapes and the hub's eviction ordering.

use idler_server::websocket::hub::{oldest_connection, ClientInfo, WsMessage};
use std::time::{Duration, Instant};
use uuid::Uuid;

#[test]
fn outbound_frames_have_type_and_data() {
    let mut notification = WsMessage::notification(
        "Character hero finished gathering 3 items and is now idle",
        "info",
    );
    notification.to = Some(Uuid::nil().to_string());

    let raw = serde_json::to_value(&notification).unwrap();
    assert_eq!(raw["type"], "notification");
    assert_eq!(raw["to"], Uuid::nil().to_string());
    assert_eq!(raw["data"]["severity"], "info");
    assert_eq!(
        raw["data"]["message"],
        "Character hero finished gathering 3 items and is now idle"
    );
}

#[test]
fn error_frame_matches_disconnect_contract() {
    let frame = WsMessage::error("Session expired. Please reconnect.");
    let raw = serde_json::to_string(&frame).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();

    assert_eq!(parsed["type"], "error");
    assert_eq!(parsed["data"]["message"], "Session expired. Please reconnect.");
}

#[test]
fn system_frames_carry_only_a_message() {
    let frame = WsMessage::system("Server restarting soon");
    let raw = serde_json::to_value(&frame).unwrap();

    assert_eq!(raw["type"], "system");
    assert_eq!(raw["data"]["message"], "Server restarting soon");
    assert_eq!(raw["data"].as_object().unwrap().len(), 1);
}

#[test]
fn inbound_chat_roundtrip_keeps_unknown_data() {
    let frame: WsMessage = serde_json::from_str(
        r#"{"type":"chat","data":{"message":"hello","character_name":"hero","user_id":"spoofed"}}"#,
    )
    .unwrap();

    // The client-supplied user_id is present after parse; the read pump is
    // responsible for overwriting it before broadcast.
    assert_eq!(frame.kind, "chat");
    assert_eq!(frame.data["user_id"], "spoofed");
    assert!(frame.user_id.is_none());
}

#[test]
fn pong_carries_unix_timestamp() {
    let frame = WsMessage::pong(1_722_000_000);
    let raw = serde_json::to_value(&frame).unwrap();
    assert_eq!(raw["type"], "pong");
    assert_eq!(raw["data"]["timestamp"], 1_722_000_000);
}

#[test]
fn connection_cap_evicts_earliest_timestamp() {
    let base = Instant::now();
    let info = |jti: &str, offset: u64| ClientInfo {
        jti: jti.to_string(),
        connected_at: base + Duration::from_secs(offset),
    };

    let connections = vec![
        info("third", 30),
        info("first", 1),
        info("second", 2),
        info("fourth", 40),
        info("fifth", 50),
    ];

    let oldest = oldest_connection(&connections).unwrap();
    assert_eq!(connections[oldest].jti, "first");
}
