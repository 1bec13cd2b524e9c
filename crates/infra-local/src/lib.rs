// Portprobe Infrastructure - In-process Adapters
// Implements: EventPublisher, InstanceStorage, InstanceManager

pub mod event_bus;
pub mod instance_store;

pub use event_bus::{BroadcastEventBus, EventSubscription};
pub use instance_store::InMemoryInstanceStore;
