use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Latest known state of one tracked object
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PositionRecord {
    /// Stable object identity in 1..=population
    pub object_id: i64,

    /// Tag label taken from the catalog at startup
    pub tag_id: String,

    /// Instant this state was produced
    pub timestamp: DateTime<Utc>,

    /// Sensor confidence
    pub is_valid: bool,

    pub source_id: i64,

    pub x: f64,
    pub y: f64,
    pub z: f64,

    /// Heading in radians
    pub a: f64,
    pub b: f64,
    pub c: f64,

    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,

    pub flags: Vec<i32>,

    pub tenant_id: i64,

    pub battery: Battery,
}

/// Battery sub-record; voltage and state are never reported by the simulator
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Battery {
    pub percentage: i32,
    pub percentage_last_update: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voltage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<i32>,
}
