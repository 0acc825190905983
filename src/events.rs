//! Channel-based observation surface for UI collaborators.

use crate::viewport::ViewportState;
use crossbeam_channel::{unbounded, Receiver, Sender};

/// Notifications emitted by the controller and polled by subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagingEvent {
    /// The visible range, item count, or page geometry changed.
    ViewportChanged { viewport: ViewportState },
    /// A page was evicted from the cache under capacity pressure.
    CacheEvicted { page_index: usize },
    /// The page size changed, manually or through adaptation.
    SizeAdapted {
        previous_size: usize,
        new_size: usize,
    },
}

/// Fan-out of [`PagingEvent`]s to any number of channel subscribers.
///
/// Delivery is best-effort: a subscriber that dropped its receiver is
/// pruned on the next emission and never blocks the controller.
#[derive(Debug, Default)]
pub struct EventHub {
    subscribers: Vec<Sender<PagingEvent>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber and return its receiving end.
    pub fn subscribe(&mut self) -> Receiver<PagingEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }

    /// Deliver an event to every live subscriber.
    pub fn emit(&mut self, event: PagingEvent) {
        self.subscribers.retain(|tx| tx.send(event).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
