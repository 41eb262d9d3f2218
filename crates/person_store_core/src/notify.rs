//! Collection-change notification.
//!
//! # Responsibility
//! - Keep the registry of listeners interested in the person collection.
//! - Broadcast one collection-scoped event per successful write.
//!
//! # Invariants
//! - Broadcast never blocks: each subscriber owns a bounded queue and sends
//!   use `try_send`.
//! - A full queue skips that subscriber for this event. It still has an
//!   undelivered invalidation for the same collection queued.
//! - Disconnected subscribers are pruned on the next broadcast.

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError, TrySendError};
use log::debug;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Default per-subscriber queue capacity.
pub const DEFAULT_SUBSCRIBER_BUFFER: usize = 64;

/// Identifier handed out by `ChangeNotifier::subscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

/// "The record set changed" event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Collection locator the event is scoped to.
    pub collection: &'static str,
    /// Monotonic per-notifier counter, starting at 1.
    pub sequence: u64,
}

/// Receiving side of one subscription.
///
/// Dropping the handle disconnects it; the notifier forgets it on the next
/// broadcast.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    receiver: Receiver<ChangeEvent>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Blocks until an event arrives or the notifier is gone.
    pub fn recv(&self) -> Option<ChangeEvent> {
        self.receiver.recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<ChangeEvent> {
        match self.receiver.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    pub fn try_recv(&self) -> Option<ChangeEvent> {
        match self.receiver.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Drains every queued event without blocking.
    pub fn drain(&self) -> Vec<ChangeEvent> {
        self.receiver.try_iter().collect()
    }
}

/// Listener registry with fire-and-forget broadcast.
pub struct ChangeNotifier {
    collection: &'static str,
    subscribers: RwLock<HashMap<SubscriptionId, Sender<ChangeEvent>>>,
    next_id: AtomicU64,
    sequence: AtomicU64,
    buffer_size: usize,
}

impl ChangeNotifier {
    /// Creates a notifier scoped to `collection`. A zero buffer is raised to 1.
    pub fn new(collection: &'static str, buffer_size: usize) -> Self {
        Self {
            collection,
            subscribers: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            sequence: AtomicU64::new(0),
            buffer_size: buffer_size.max(1),
        }
    }

    pub fn collection(&self) -> &'static str {
        self.collection
    }

    pub fn subscribe(&self) -> Subscription {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let (sender, receiver) = bounded(self.buffer_size);
        self.subscribers.write().insert(id, sender);
        Subscription { id, receiver }
    }

    /// Returns whether `id` was still registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscribers.write().remove(&id).is_some()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Sends one change event to every subscriber.
    ///
    /// Returns how many subscribers had the event queued.
    pub fn broadcast(&self) -> usize {
        let event = ChangeEvent {
            collection: self.collection,
            sequence: self.sequence.fetch_add(1, Ordering::SeqCst) + 1,
        };

        let mut delivered = 0;
        let mut disconnected = Vec::new();
        {
            let subscribers = self.subscribers.read();
            for (id, sender) in subscribers.iter() {
                match sender.try_send(event.clone()) {
                    Ok(()) => delivered += 1,
                    Err(TrySendError::Full(_)) => {}
                    Err(TrySendError::Disconnected(_)) => disconnected.push(*id),
                }
            }
        }

        if !disconnected.is_empty() {
            let mut subscribers = self.subscribers.write();
            for id in &disconnected {
                subscribers.remove(id);
            }
        }

        debug!(
            "event=change_broadcast module=notify status=ok sequence={} delivered={} pruned={}",
            event.sequence,
            delivered,
            disconnected.len()
        );
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::{ChangeNotifier, SubscriptionId};

    const COLLECTION: &str = "content://test/person";

    #[test]
    fn broadcast_reaches_every_subscriber() {
        let notifier = ChangeNotifier::new(COLLECTION, 4);
        let first = notifier.subscribe();
        let second = notifier.subscribe();

        assert_eq!(notifier.broadcast(), 2);

        let event = first.try_recv().expect("first subscriber should get event");
        assert_eq!(event.collection, COLLECTION);
        assert_eq!(event.sequence, 1);
        assert_eq!(second.drain().len(), 1);
    }

    #[test]
    fn full_queue_skips_without_blocking() {
        let notifier = ChangeNotifier::new(COLLECTION, 1);
        let subscription = notifier.subscribe();

        assert_eq!(notifier.broadcast(), 1);
        assert_eq!(notifier.broadcast(), 0);
        assert_eq!(subscription.drain().len(), 1);
        assert_eq!(notifier.subscriber_count(), 1);
    }

    #[test]
    fn dropped_subscription_is_pruned() {
        let notifier = ChangeNotifier::new(COLLECTION, 4);
        let kept = notifier.subscribe();
        drop(notifier.subscribe());

        assert_eq!(notifier.broadcast(), 1);
        assert_eq!(notifier.subscriber_count(), 1);
        assert_eq!(kept.drain().len(), 1);
    }

    #[test]
    fn unsubscribe_is_reported_once() {
        let notifier = ChangeNotifier::new(COLLECTION, 4);
        let subscription = notifier.subscribe();

        assert!(notifier.unsubscribe(subscription.id()));
        assert!(!notifier.unsubscribe(subscription.id()));
        assert!(!notifier.unsubscribe(SubscriptionId(999)));
        assert!(subscription.try_recv().is_none());
    }
}
