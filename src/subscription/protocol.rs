use crate::state::PositionRecord;
use serde::{Deserialize, Serialize};

/// Client → Server message types
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "subscribe")]
    Subscribe { object_id: i64 },
    #[serde(rename = "unsubscribe")]
    Unsubscribe { object_id: i64 },
}

/// Server → Client: Position update notification
#[derive(Debug, Clone, Serialize)]
pub struct PositionUpdateMessage {
    #[serde(rename = "type")]
    pub msg_type: String,
    #[serde(flatten)]
    pub position: PositionRecord,
}

impl From<PositionRecord> for PositionUpdateMessage {
    fn from(position: PositionRecord) -> Self {
        Self {
            msg_type: "position_update".to_string(),
            position,
        }
    }
}

/// Server → Client: Error message
#[derive(Debug, Clone, Serialize)]
pub struct ErrorMessage {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub error: String,
}

impl ErrorMessage {
    pub fn new(error: String) -> Self {
        Self {
            msg_type: "error".to_string(),
            error,
        }
    }
}
