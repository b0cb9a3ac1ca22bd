//! Event bus for broadcasting booking events to subscribers
//!
//! Uses a tokio broadcast channel for the pub/sub pattern.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::broadcast;

use super::events::{BookingEvent, EventEnvelope};

/// Default channel capacity
const DEFAULT_CAPACITY: usize = 256;

/// Broadcasts booking events to every subscriber.
///
/// Publishing never blocks and never fails: with no subscribers the
/// event is simply dropped, which is the normal case for headless use.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventEnvelope>,
    subscriber_count: Arc<AtomicUsize>,
}

impl EventBus {
    /// Create a new event bus with default capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a new event bus with custom capacity
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            subscriber_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Publish an event to all subscribers
    pub fn publish(&self, event: BookingEvent) {
        let envelope = EventEnvelope::new(event);
        let event_type = envelope.event.event_type();
        let product_id = envelope.event.product_id();

        match self.sender.send(envelope) {
            Ok(count) => {
                debug!(
                    "Booking event published: type={}, product={}, subscribers={}",
                    event_type, product_id, count
                );
            }
            Err(_) => {
                debug!(
                    "Booking event published (no subscribers): type={}, product={}",
                    event_type, product_id
                );
            }
        }
    }

    /// Subscribe to receive events
    pub fn subscribe(&self) -> EventSubscriber {
        let receiver = self.sender.subscribe();
        self.subscriber_count.fetch_add(1, Ordering::SeqCst);
        let count = self.subscriber_count.load(Ordering::SeqCst);
        info!("New booking event subscriber, total: {}", count);

        EventSubscriber {
            receiver,
            subscriber_count: self.subscriber_count.clone(),
        }
    }

    /// Get current subscriber count
    pub fn subscriber_count(&self) -> usize {
        self.subscriber_count.load(Ordering::SeqCst)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Receives booking events from the bus
pub struct EventSubscriber {
    receiver: broadcast::Receiver<EventEnvelope>,
    subscriber_count: Arc<AtomicUsize>,
}

impl EventSubscriber {
    /// Receive the next event
    ///
    /// Returns `None` once every sender is gone. A slow subscriber that
    /// falls behind skips the missed events and keeps going.
    pub async fn recv(&mut self) -> Option<EventEnvelope> {
        loop {
            match self.receiver.recv().await {
                Ok(envelope) => return Some(envelope),
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    warn!("Booking event subscriber lagged, {} events missed", count);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => {
                    return None;
                }
            }
        }
    }
}

impl Drop for EventSubscriber {
    fn drop(&mut self) {
        let prev = self.subscriber_count.fetch_sub(1, Ordering::SeqCst);
        info!("Booking event subscriber gone, remaining: {}", prev - 1);
    }
}

/// Shared event bus type
pub type SharedEventBus = Arc<EventBus>;

/// Create a shared event bus
pub fn create_event_bus() -> SharedEventBus {
    Arc::new(EventBus::new())
}
