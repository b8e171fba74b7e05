use super::*;
use crate::state::{Battery, PositionRecord};
use chrono::Utc;

fn position(object_id: i64) -> PositionRecord {
    let now = Utc::now();
    PositionRecord {
        object_id,
        tag_id: format!("order-{:03}", object_id),
        timestamp: now,
        is_valid: true,
        source_id: 2,
        x: 1.0,
        y: 2.0,
        z: 0.0,
        a: 0.5,
        b: 0.0,
        c: 0.0,
        latitude: 48.1351,
        longitude: 11.5820,
        altitude: 520.0,
        flags: vec![],
        tenant_id: 1,
        battery: Battery {
            percentage: 88,
            percentage_last_update: now,
            voltage: None,
            state: None,
        },
    }
}

#[test]
fn test_no_filter_forwards_everything() {
    let manager = ConnectionManager::new();
    assert!(manager.should_forward(&position(1)));
    assert!(manager.should_forward(&position(250)));
}

#[test]
fn test_subscribe_filter_limits_forwarding() {
    let mut manager = ConnectionManager::new();
    manager
        .apply_client_message(r#"{"type":"subscribe","object_id":7}"#)
        .unwrap();

    assert!(manager.should_forward(&position(7)));
    assert!(!manager.should_forward(&position(8)));
}

#[test]
fn test_unsubscribe_last_object_restores_full_stream() {
    let mut manager = ConnectionManager::new();
    manager
        .apply_client_message(r#"{"type":"subscribe","object_id":7}"#)
        .unwrap();
    manager
        .apply_client_message(r#"{"type":"unsubscribe","object_id":7}"#)
        .unwrap();

    assert!(manager.should_forward(&position(8)));
}

#[test]
fn test_malformed_client_message_rejected() {
    let mut manager = ConnectionManager::new();

    assert!(manager.apply_client_message("not json").is_err());
    assert!(manager
        .apply_client_message(r#"{"type":"subscribe","object_id":"seven"}"#)
        .is_err());
    assert!(manager
        .apply_client_message(r#"{"type":"explode"}"#)
        .is_err());
    assert!(manager.should_forward(&position(1)));
}

#[test]
fn test_position_update_message_shape() {
    let msg = PositionUpdateMessage::from(position(3));
    let json = serde_json::to_value(&msg).unwrap();

    assert_eq!(json["type"], "position_update");
    assert_eq!(json["object_id"], 3);
    assert_eq!(json["tag_id"], "order-003");
    assert_eq!(json["battery"]["percentage"], 88);
    assert!(json["battery"].get("voltage").is_none());
}

#[test]
fn test_error_message_shape() {
    let json = serde_json::to_value(ErrorMessage::new("bad".to_string())).unwrap();
    assert_eq!(json["type"], "error");
    assert_eq!(json["error"], "bad");
}
