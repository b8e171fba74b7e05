// Latest-state table and subscriber fan-out

mod hub;
pub mod metrics;
mod position;
mod subscriber;

pub use hub::{StateHub, MAX_SUBSCRIBER_BUFFER};
pub use metrics::{HubMetrics, MetricsSnapshot};
pub use position::{Battery, PositionRecord};
pub use subscriber::{Subscription, SubscriptionId};
