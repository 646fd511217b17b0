//! Event bus for tabview using tokio::broadcast
//!
//! Notifies views when a new record snapshot has been published.

use tokio::sync::broadcast;

/// Events emitted by the snapshot hub
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// A new snapshot replaced the previous one
    Refreshed {
        generation: u64,
        record_count: usize,
    },
    /// The data supplier failed to produce a snapshot; the previous one stays current
    RefreshFailed(String),
}

/// Event bus for broadcasting store events
///
/// Uses tokio::broadcast for multi-consumer support.
pub struct EventBus {
    sender: broadcast::Sender<StoreEvent>,
}

impl EventBus {
    /// Create a new event bus with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Create with default capacity (64 events)
    pub fn default_capacity() -> Self {
        Self::new(64)
    }

    /// Publish an event to all subscribers
    pub fn publish(&self, event: StoreEvent) {
        // No subscribers is fine
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::default_capacity()
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_bus_publish_subscribe() {
        let bus = EventBus::default_capacity();
        let mut rx = bus.subscribe();

        bus.publish(StoreEvent::Refreshed {
            generation: 1,
            record_count: 25,
        });
        bus.publish(StoreEvent::RefreshFailed("feed offline".to_string()));

        let event1 = rx.recv().await.unwrap();
        assert_eq!(
            event1,
            StoreEvent::Refreshed {
                generation: 1,
                record_count: 25
            }
        );

        let event2 = rx.recv().await.unwrap();
        assert!(matches!(event2, StoreEvent::RefreshFailed(msg) if msg == "feed offline"));
    }

    #[tokio::test]
    async fn test_event_bus_multiple_subscribers() {
        let bus = EventBus::default_capacity();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        assert_eq!(bus.subscriber_count(), 2);

        bus.publish(StoreEvent::Refreshed {
            generation: 7,
            record_count: 0,
        });

        assert!(matches!(
            rx1.recv().await.unwrap(),
            StoreEvent::Refreshed { generation: 7, .. }
        ));
        assert!(matches!(
            rx2.recv().await.unwrap(),
            StoreEvent::Refreshed { generation: 7, .. }
        ));
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::default_capacity();
        bus.publish(StoreEvent::RefreshFailed("nobody listening".to_string()));
        assert_eq!(bus.subscriber_count(), 0);
    }
}
