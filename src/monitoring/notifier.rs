/*!
 * Lifecycle Notifier
 * Fan-out of lifecycle events to subscribers without coupling the kernel to them
 *
 * Each subscriber owns an unbounded flume receiver; publishing never blocks
 * the tick. Subscribers that dropped their receiver are pruned on publish.
 */

use super::events::LifecycleEvent;
use flume::{Receiver, Sender};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

/// Notifier statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotifierStats {
    pub events_published: u64,
    pub deliveries: u64,
    pub active_subscribers: usize,
}

#[derive(Debug, Default)]
pub struct LifecycleNotifier {
    subscribers: Mutex<Vec<Sender<LifecycleEvent>>>,
    published: AtomicU64,
    delivered: AtomicU64,
}

impl LifecycleNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber; it sees events published from now on
    pub fn subscribe(&self) -> Receiver<LifecycleEvent> {
        let (tx, rx) = flume::unbounded();
        self.subscribers.lock().push(tx);
        rx
    }

    /// Deliver an event to every live subscriber
    pub fn publish(&self, event: LifecycleEvent) {
        self.published.fetch_add(1, Ordering::Relaxed);
        let mut subscribers = self.subscribers.lock();
        let before = subscribers.len();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        self.delivered
            .fetch_add(subscribers.len() as u64, Ordering::Relaxed);

        trace!(
            event = event.name(),
            process_id = %event.process_id(),
            delivered = subscribers.len(),
            pruned = before - subscribers.len(),
            "Lifecycle event published"
        );
    }

    pub fn stats(&self) -> NotifierStats {
        NotifierStats {
            events_published: self.published.load(Ordering::Relaxed),
            deliveries: self.delivered.load(Ordering::Relaxed),
            active_subscribers: self.subscribers.lock().len(),
        }
    }
}
