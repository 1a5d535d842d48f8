//! Publishing side of the event bus.

use crate::events::{EventEnvelope, EventFilter};
use crate::subscriber::{EventStream, Subscription};
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Interface the map cache publishes through.
///
/// The cache never cares who is listening; `publish` reports the receiver
/// count purely for observability.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish an envelope to the bus.
    ///
    /// Returns the number of active subscribers that received it.
    async fn publish(&self, envelope: EventEnvelope) -> usize;

    /// Total number of envelopes published through this bus.
    fn events_published(&self) -> u64;
}

/// In-memory event bus on `tokio::sync::broadcast`.
///
/// Suitable for a single process; slow subscribers that fall more than the
/// channel capacity behind lose the oldest events rather than blocking the
/// publisher.
pub struct InMemoryEventBus {
    /// Broadcast sender for envelopes.
    sender: broadcast::Sender<EventEnvelope>,
    /// Total envelopes published.
    events_published: AtomicU64,
    /// Channel capacity.
    capacity: usize,
}

impl InMemoryEventBus {
    /// Create a bus with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a bus with a specific per-subscriber buffer capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            events_published: AtomicU64::new(0),
            capacity,
        }
    }

    /// Subscribe to envelopes matching a filter.
    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        debug!(kinds = ?filter.kinds, "New subscription created");
        Subscription::new(self.sender.subscribe(), filter)
    }

    /// Subscribe and wrap the subscription as a `Stream`.
    #[must_use]
    pub fn event_stream(&self, filter: EventFilter) -> EventStream {
        EventStream::new(self.subscribe(filter))
    }

    /// Number of currently attached subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// The per-subscriber buffer capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, envelope: EventEnvelope) -> usize {
        let kind = envelope.event.kind();
        self.events_published.fetch_add(1, Ordering::Relaxed);

        match self.sender.send(envelope) {
            Ok(receiver_count) => {
                debug!(kind = ?kind, receivers = receiver_count, "Event published");
                receiver_count
            }
            Err(_) => {
                // No receivers attached; the event is dropped.
                trace!(kind = ?kind, "Event dropped (no receivers)");
                0
            }
        }
    }

    fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }
}

/// Bus used when no event emitter is configured: publishes nowhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventBus;

#[async_trait]
impl EventPublisher for NoopEventBus {
    async fn publish(&self, _envelope: EventEnvelope) -> usize {
        0
    }

    fn events_published(&self) -> u64 {
        0
    }
}
