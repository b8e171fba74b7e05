use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Delivery counters for the state hub
#[derive(Clone)]
pub struct HubMetrics {
    /// Records accepted by `update`
    updates_published: Arc<AtomicU64>,

    /// Records handed to a subscriber buffer
    records_delivered: Arc<AtomicU64>,

    /// Records skipped because a subscriber buffer was full or closed
    records_dropped: Arc<AtomicU64>,

    subscriptions_opened: Arc<AtomicU64>,
    subscriptions_closed: Arc<AtomicU64>,
}

impl HubMetrics {
    pub fn new() -> Self {
        Self {
            updates_published: Arc::new(AtomicU64::new(0)),
            records_delivered: Arc::new(AtomicU64::new(0)),
            records_dropped: Arc::new(AtomicU64::new(0)),
            subscriptions_opened: Arc::new(AtomicU64::new(0)),
            subscriptions_closed: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn record_update(&self) {
        self.updates_published.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delivered(&self) {
        self.records_delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped(&self) {
        self.records_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_subscribe(&self) {
        self.subscriptions_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_unsubscribe(&self) {
        self.subscriptions_closed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_updates_published(&self) -> u64 {
        self.updates_published.load(Ordering::Relaxed)
    }

    pub fn get_records_delivered(&self) -> u64 {
        self.records_delivered.load(Ordering::Relaxed)
    }

    pub fn get_records_dropped(&self) -> u64 {
        self.records_dropped.load(Ordering::Relaxed)
    }

    pub fn get_snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            updates_published: self.get_updates_published(),
            records_delivered: self.get_records_delivered(),
            records_dropped: self.get_records_dropped(),
            subscriptions_opened: self.subscriptions_opened.load(Ordering::Relaxed),
            subscriptions_closed: self.subscriptions_closed.load(Ordering::Relaxed),
        }
    }
}

impl Default for HubMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of delivery metrics at a point in time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub updates_published: u64,
    pub records_delivered: u64,
    pub records_dropped: u64,
    pub subscriptions_opened: u64,
    pub subscriptions_closed: u64,
}
