// Static catalog of tracked objects, built once at startup

use chrono::{Duration, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Tag label used when an object has no catalog entry
pub const UNKNOWN_TAG: &str = "UNKNOWN";

/// Descriptive metadata for one tracked object
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackedObject {
    pub id: i64,

    /// Display name, e.g. "container-007"; doubles as the position tag
    pub name: String,

    pub labels: Vec<String>,

    pub properties: HashMap<String, String>,
}

/// Read-only lookup of tracked objects keyed by id
#[derive(Clone, Debug, Default)]
pub struct ObjectCatalog {
    objects: HashMap<i64, TrackedObject>,
}

impl ObjectCatalog {
    /// Generate objects `1..=population` with randomized types and properties
    pub fn generate<R: Rng + ?Sized>(population: usize, rng: &mut R) -> Self {
        let objects = (1..=population as i64)
            .map(|id| {
                let object = generate_object(id, rng);
                (id, object)
            })
            .collect();
        Self { objects }
    }

    pub fn from_objects(objects: impl IntoIterator<Item = TrackedObject>) -> Self {
        Self {
            objects: objects.into_iter().map(|o| (o.id, o)).collect(),
        }
    }

    pub fn get(&self, id: i64) -> Option<&TrackedObject> {
        self.objects.get(&id)
    }

    /// All objects ordered by id
    pub fn all(&self) -> Vec<&TrackedObject> {
        let mut objects: Vec<&TrackedObject> = self.objects.values().collect();
        objects.sort_by_key(|o| o.id);
        objects
    }

    /// Tag label for a position record
    pub fn tag_for(&self, id: i64) -> String {
        self.get(id)
            .map(|o| o.name.clone())
            .unwrap_or_else(|| UNKNOWN_TAG.to_string())
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

fn pick<R: Rng + ?Sized>(rng: &mut R, options: &[&str]) -> String {
    options.choose(rng).copied().unwrap_or_default().to_string()
}

fn generate_object<R: Rng + ?Sized>(id: i64, rng: &mut R) -> TrackedObject {
    let roll: f64 = rng.gen();
    let object_type = if roll < 0.4 {
        "container"
    } else if roll < 0.7 {
        "tool"
    } else {
        "order"
    };

    let mut properties = HashMap::new();
    properties.insert(
        "status".to_string(),
        pick(rng, &["idle", "in_transit", "processing", "completed"]),
    );
    let zone = (b'A' + rng.gen_range(0..5u8)) as char;
    properties.insert("zone".to_string(), format!("Zone-{}", zone));

    match object_type {
        "container" => {
            properties.insert("capacity".to_string(), rng.gen_range(100..500).to_string());
            properties.insert("fill_level".to_string(), rng.gen_range(0..=100).to_string());
            properties.insert(
                "material_type".to_string(),
                pick(rng, &["raw_material", "components", "finished_goods", "packaging"]),
            );
            properties.insert(
                "temperature".to_string(),
                format!("{:.1}", 18.0 + rng.gen::<f64>() * 8.0),
            );
        }
        "tool" => {
            properties.insert(
                "tool_type".to_string(),
                pick(rng, &["forklift", "pallet_jack", "tugger", "agv"]),
            );
            properties.insert("max_load".to_string(), rng.gen_range(500..2000).to_string());
            properties.insert(
                "operator".to_string(),
                pick(rng, &["John", "Maria", "Ahmed", "Lisa", "automatic"]),
            );
            properties.insert("maintenance_due".to_string(), rng.gen_range(0..90).to_string());
            properties.insert("usage_hours".to_string(), rng.gen_range(0..10_000).to_string());
        }
        _ => {
            properties.insert(
                "order_id".to_string(),
                format!("ORD-{:06}", rng.gen_range(100_000..1_000_000)),
            );
            properties.insert(
                "priority".to_string(),
                pick(rng, &["low", "medium", "high", "urgent"]),
            );
            properties.insert(
                "customer".to_string(),
                pick(
                    rng,
                    &["ACME Corp", "Tech Industries", "Global Supplies", "Manufacturing Inc"],
                ),
            );
            properties.insert("item_count".to_string(), rng.gen_range(1..=50).to_string());
            let due = Utc::now() + Duration::days(rng.gen_range(0..30));
            properties.insert("due_date".to_string(), due.format("%Y-%m-%d").to_string());
        }
    }

    TrackedObject {
        id,
        name: format!("{}-{:03}", object_type, id),
        labels: vec![object_type.to_string()],
        properties,
    }
}
