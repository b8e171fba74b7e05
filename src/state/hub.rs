use crate::state::metrics::HubMetrics;
use crate::state::position::PositionRecord;
use crate::state::subscriber::{Registry, Subscription, SubscriptionId};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

/// Upper bound on a subscriber's buffer; larger requests are clamped
pub const MAX_SUBSCRIBER_BUFFER: usize = 1 << 20;

/// State hub holds the latest record per object and fans updates out to
/// live subscribers.
///
/// The position table and the subscriber registry are locked separately:
/// readers of one never wait on writers of the other. A reader may therefore
/// see a table entry slightly before or after the matching broadcast.
pub struct StateHub {
    /// Latest record per object id
    positions: DashMap<i64, PositionRecord>,

    /// Live subscriber senders
    registry: Arc<Registry>,

    /// Per-subscriber buffer size
    subscriber_buffer: usize,

    metrics: HubMetrics,
}

impl StateHub {
    /// Create a hub whose subscriptions each buffer `subscriber_buffer` records,
    /// clamped to `1..=MAX_SUBSCRIBER_BUFFER`
    pub fn new(subscriber_buffer: usize) -> Self {
        let metrics = HubMetrics::new();

        Self {
            positions: DashMap::new(),
            registry: Arc::new(Registry::new(metrics.clone())),
            subscriber_buffer: subscriber_buffer.clamp(1, MAX_SUBSCRIBER_BUFFER),
            metrics,
        }
    }

    /// Store `record` as the latest state for its object, then broadcast it.
    pub fn update(&self, record: PositionRecord) {
        self.metrics.record_update();
        self.positions.insert(record.object_id, record.clone());
        self.broadcast(&record);
    }

    /// Offer `record` to every subscriber without blocking.
    ///
    /// Subscribers whose buffer is full silently miss this record.
    pub fn broadcast(&self, record: &PositionRecord) {
        self.registry.broadcast(record);
    }

    /// Register a new bounded subscription.
    ///
    /// Callers that want a full picture should send `get_all()` to the client
    /// after subscribing and before draining the subscription.
    ///
    /// After `shutdown()` the returned subscription is already closed.
    pub fn subscribe(&self) -> Subscription {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(self.subscriber_buffer);

        if self.registry.insert(id, tx) {
            debug!(subscription = %id, subscribers = self.registry.len(), "Subscriber registered");
        } else {
            debug!(subscription = %id, "Hub shut down, subscription starts closed");
        }

        Subscription::new(id, self.subscriber_buffer, rx, Arc::downgrade(&self.registry))
    }

    /// Remove a subscription and close its channel.
    ///
    /// Returns false if it was already removed; repeated calls are no-ops.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self.registry.remove(id);
        if removed {
            debug!(subscription = %id, "Subscriber removed");
        }
        removed
    }

    /// Get latest record for an object
    pub fn get(&self, object_id: i64) -> Option<PositionRecord> {
        self.positions.get(&object_id).map(|p| p.clone())
    }

    /// Get all latest records, ordered by object id
    pub fn get_all(&self) -> Vec<PositionRecord> {
        let mut records: Vec<PositionRecord> =
            self.positions.iter().map(|p| p.value().clone()).collect();
        records.sort_by_key(|p| p.object_id);
        records
    }

    /// Close every subscription so open streams end. Later subscriptions
    /// start closed.
    pub fn shutdown(&self) {
        let closed = self.registry.clear();
        info!(closed = closed, "State hub shut down, subscriptions closed");
    }

    pub fn is_shut_down(&self) -> bool {
        self.registry.is_closed()
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry.len()
    }

    pub fn position_count(&self) -> usize {
        self.positions.len()
    }

    pub fn subscriber_buffer(&self) -> usize {
        self.subscriber_buffer
    }

    pub fn metrics(&self) -> &HubMetrics {
        &self.metrics
    }
}
