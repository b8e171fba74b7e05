use crate::state::metrics::HubMetrics;
use crate::state::position::PositionRecord;
use futures::Stream;
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock, Weak};
use std::task::{Context, Poll};
use tokio::sync::mpsc::{self, error::TryRecvError, error::TrySendError};
use tracing::{debug, trace};
use uuid::Uuid;

pub type SubscriptionId = Uuid;

/// Live subscriber senders, keyed by subscription id.
///
/// Locked independently of the position table so fan-out never contends
/// with state reads.
pub(crate) struct Registry {
    senders: RwLock<HashMap<SubscriptionId, mpsc::Sender<PositionRecord>>>,
    /// Set by `clear`; later inserts are refused
    closed: AtomicBool,
    metrics: HubMetrics,
}

impl Registry {
    pub(crate) fn new(metrics: HubMetrics) -> Self {
        Self {
            senders: RwLock::new(HashMap::new()),
            closed: AtomicBool::new(false),
            metrics,
        }
    }

    /// Register a sender. Returns false once the registry has been cleared;
    /// the sender is dropped and its channel is closed from the start.
    pub(crate) fn insert(&self, id: SubscriptionId, tx: mpsc::Sender<PositionRecord>) -> bool {
        let mut senders = self.senders.write().unwrap_or_else(PoisonError::into_inner);
        if self.closed.load(Ordering::Acquire) {
            return false;
        }
        senders.insert(id, tx);
        self.metrics.record_subscribe();
        true
    }

    /// Remove a sender, closing its channel. Returns false if already gone.
    pub(crate) fn remove(&self, id: SubscriptionId) -> bool {
        let removed = self
            .senders
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .is_some();
        if removed {
            self.metrics.record_unsubscribe();
        }
        removed
    }

    /// Close every channel and refuse further inserts
    pub(crate) fn clear(&self) -> usize {
        let mut senders = self.senders.write().unwrap_or_else(PoisonError::into_inner);
        self.closed.store(true, Ordering::Release);
        let drained: Vec<_> = senders.drain().collect();
        drop(senders);

        for _ in &drained {
            self.metrics.record_unsubscribe();
        }
        drained.len()
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub(crate) fn len(&self) -> usize {
        self.senders
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Non-blocking fan-out. A full or closed buffer loses this record for
    /// that subscriber only.
    pub(crate) fn broadcast(&self, record: &PositionRecord) {
        let senders = self.senders.read().unwrap_or_else(PoisonError::into_inner);

        for (id, tx) in senders.iter() {
            match tx.try_send(record.clone()) {
                Ok(()) => self.metrics.record_delivered(),
                Err(TrySendError::Full(_)) => {
                    self.metrics.record_dropped();
                    trace!(subscription = %id, object_id = record.object_id, "Subscriber buffer full, dropping record");
                }
                Err(TrySendError::Closed(_)) => {
                    self.metrics.record_dropped();
                    trace!(subscription = %id, "Subscriber channel closed, dropping record");
                }
            }
        }
    }
}

/// One live observer's bounded delivery channel.
///
/// Dropping the subscription unregisters it from the hub, so a consumer that
/// goes away (client disconnect, task cancellation) always releases its slot.
pub struct Subscription {
    id: SubscriptionId,
    capacity: usize,
    rx: mpsc::Receiver<PositionRecord>,
    registry: Weak<Registry>,
}

impl Subscription {
    pub(crate) fn new(
        id: SubscriptionId,
        capacity: usize,
        rx: mpsc::Receiver<PositionRecord>,
        registry: Weak<Registry>,
    ) -> Self {
        Self {
            id,
            capacity,
            rx,
            registry,
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Buffer size; records beyond this are dropped until the consumer drains.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Wait for the next record. `None` once the hub has closed the channel.
    pub async fn recv(&mut self) -> Option<PositionRecord> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Result<PositionRecord, TryRecvError> {
        self.rx.try_recv()
    }
}

impl Stream for Subscription {
    type Item = PositionRecord;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            if registry.remove(self.id) {
                debug!(subscription = %self.id, "Subscription dropped");
            }
        }
    }
}
