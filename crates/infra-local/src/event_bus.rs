// In-process event bus (tokio broadcast)
use tokio::sync::broadcast;
use tracing::{trace, warn};

use portprobe_core::domain::{Event, EventType};
use portprobe_core::port::EventPublisher;

/// Events buffered per subscriber before the slowest one starts lagging
pub const DEFAULT_EVENT_BUFFER: usize = 1024;

/// Process-wide publish/subscribe bus
///
/// `emit` never blocks: slow subscribers lag and skip events instead of
/// holding up publishers.
#[derive(Clone)]
pub struct BroadcastEventBus {
    tx: broadcast::Sender<Event>,
}

impl BroadcastEventBus {
    pub fn new(buffer: usize) -> Self {
        let (tx, _) = broadcast::channel(buffer.max(1));
        Self { tx }
    }

    /// Receive every event published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    /// Receive only events of `event_type`
    pub fn subscribe_to(&self, event_type: EventType) -> EventSubscription {
        EventSubscription {
            rx: self.tx.subscribe(),
            event_type,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for BroadcastEventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER)
    }
}

impl EventPublisher for BroadcastEventBus {
    fn emit(&self, event: Event) {
        let event_type = event.event_type.clone();
        match self.tx.send(event) {
            Ok(receivers) => trace!(event_type = %event_type, receivers, "Event published"),
            Err(_) => trace!(event_type = %event_type, "Event dropped: no subscribers"),
        }
    }
}

/// Subscription filtered on a single event type
pub struct EventSubscription {
    rx: broadcast::Receiver<Event>,
    event_type: EventType,
}

impl EventSubscription {
    /// Next matching event, or `None` once the bus is gone
    pub async fn recv(&mut self) -> Option<Event> {
        loop {
            match self.rx.recv().await {
                Ok(event) if event.event_type == self.event_type => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(
                        event_type = %self.event_type,
                        skipped,
                        "Subscriber lagged behind, events skipped"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
