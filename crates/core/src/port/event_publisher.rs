// Event publishing port
use crate::domain::Event;

/// Process-wide publish/subscribe bus
///
/// Fire-and-forget: `emit` must not wait for subscribers to process the
/// event, and a bus without subscribers silently drops it.
pub trait EventPublisher: Send + Sync {
    fn emit(&self, event: Event);
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::Mutex;

    /// Publisher that records every emitted event
    #[derive(Default)]
    pub struct RecordingPublisher {
        events: Mutex<Vec<Event>>,
    }

    impl RecordingPublisher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn events(&self) -> Vec<Event> {
            self.events.lock().unwrap().clone()
        }

        pub fn count(&self) -> usize {
            self.events.lock().unwrap().len()
        }
    }

    impl EventPublisher for RecordingPublisher {
        fn emit(&self, event: Event) {
            self.events.lock().unwrap().push(event);
        }
    }
}
