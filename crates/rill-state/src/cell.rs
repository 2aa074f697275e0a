//! Shared mutable value cell with synchronous change notification.
//!
//! `ValueCell` is the stream primitive every container builds on: a hot,
//! current-value-replaying, multicast subject. New subscribers receive the
//! current value synchronously on subscription, and every `publish` notifies
//! all subscribers before it returns.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

type Callback<T> = Arc<Mutex<dyn FnMut(&T) + Send>>;

struct CellInner<T> {
    /// Current value; always equals the last published value.
    value: Mutex<T>,
    /// Subscribers in subscription order.
    subscribers: Mutex<Vec<(u64, Callback<T>)>>,
    next_id: AtomicU64,
    /// Values queued by re-entrant `publish` calls.
    pending: Mutex<VecDeque<T>>,
    /// True while a delivery pass is draining the queue.
    delivering: AtomicBool,
}

/// A shared mutable value with synchronous multicast change notification.
///
/// Cloning a `ValueCell` clones a handle to the same underlying value and
/// subscriber list.
///
/// # Delivery model
///
/// One `publish` produces at most one notification per subscriber, delivered
/// in subscription order before `publish` returns. Re-entrant `publish` calls
/// made from inside a subscriber callback are queued and drained by the
/// outermost delivery pass, so in-flight notification is never corrupted and
/// no value is lost or reordered.
///
/// # Examples
///
/// ```
/// use rill_state::ValueCell;
/// use std::sync::{Arc, Mutex};
///
/// let cell = ValueCell::new(1);
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = seen.clone();
///
/// let sub = cell.subscribe(move |v| sink.lock().unwrap().push(*v));
/// cell.publish(2);
///
/// // Replay of the current value, then the published one.
/// assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
/// drop(sub);
/// ```
pub struct ValueCell<T> {
    inner: Arc<CellInner<T>>,
}

impl<T> Clone for ValueCell<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + Send + 'static> ValueCell<T> {
    /// Create a new cell holding the given initial value.
    pub fn new(initial: T) -> Self {
        Self {
            inner: Arc::new(CellInner {
                value: Mutex::new(initial),
                subscribers: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(0),
                pending: Mutex::new(VecDeque::new()),
                delivering: AtomicBool::new(false),
            }),
        }
    }

    /// Snapshot of the current value.
    #[inline]
    pub fn value(&self) -> T {
        self.inner.value.lock().unwrap().clone()
    }

    /// Register a subscriber.
    ///
    /// The callback is invoked synchronously with the current value before
    /// `subscribe` returns, then once per subsequent published value. The
    /// returned [`Subscription`] unregisters the callback when dropped.
    pub fn subscribe<F>(&self, subscriber: F) -> Subscription
    where
        F: FnMut(&T) + Send + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let callback: Callback<T> = Arc::new(Mutex::new(subscriber));
        self.inner
            .subscribers
            .lock()
            .unwrap()
            .push((id, Arc::clone(&callback)));

        // Replay the current value to the new subscriber.
        let snapshot = self.value();
        (&mut *callback.lock().unwrap())(&snapshot);

        let weak = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner
                    .subscribers
                    .lock()
                    .unwrap()
                    .retain(|(sid, _)| *sid != id);
            }
        })
    }

    /// Store `next` as the current value and notify all subscribers.
    ///
    /// When called from inside a subscriber callback the value is queued and
    /// delivered by the outermost pass after the current notification
    /// completes.
    pub fn publish(&self, next: T) {
        self.inner.pending.lock().unwrap().push_back(next);
        if self.inner.delivering.swap(true, Ordering::AcqRel) {
            // An active pass will pick the value up from the queue.
            return;
        }
        self.drain();
    }

    /// Number of currently registered subscribers.
    #[inline]
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.lock().unwrap().len()
    }

    fn drain(&self) {
        loop {
            let next = self.inner.pending.lock().unwrap().pop_front();
            match next {
                Some(value) => {
                    *self.inner.value.lock().unwrap() = value.clone();
                    // Snapshot the subscriber list so callbacks may subscribe
                    // or unsubscribe without holding the registry lock.
                    let subscribers: Vec<Callback<T>> = self
                        .inner
                        .subscribers
                        .lock()
                        .unwrap()
                        .iter()
                        .map(|(_, cb)| Arc::clone(cb))
                        .collect();
                    for callback in subscribers {
                        (&mut *callback.lock().unwrap())(&value);
                    }
                }
                None => {
                    self.inner.delivering.store(false, Ordering::Release);
                    // A publisher may have queued a value between the empty
                    // check and the flag reset; reclaim the pass if so.
                    if self.inner.pending.lock().unwrap().is_empty()
                        || self.inner.delivering.swap(true, Ordering::AcqRel)
                    {
                        return;
                    }
                }
            }
        }
    }
}

impl<T: Clone + Send + std::fmt::Debug + 'static> std::fmt::Debug for ValueCell<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValueCell")
            .field("value", &self.value())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// RAII handle for an active subscription.
///
/// Dropping the handle unregisters the subscriber. Handles from several
/// sources can be combined with [`Subscription::merge`]; [`Subscription::detach`]
/// leaves the subscriber registered for the lifetime of its container.
pub struct Subscription {
    cancels: Vec<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub(crate) fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancels: vec![Box::new(cancel)],
        }
    }

    /// Combine two subscriptions into one handle; dropping it cancels both.
    pub fn merge(mut self, mut other: Subscription) -> Subscription {
        self.cancels.append(&mut other.cancels);
        self
    }

    /// Keep the subscriber registered forever.
    pub fn detach(mut self) {
        self.cancels.clear();
    }

    /// Cancel the subscription explicitly (equivalent to dropping it).
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        for cancel in self.cancels.drain(..) {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("handles", &self.cancels.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collector<T: Clone + Send + 'static>() -> (Arc<Mutex<Vec<T>>>, impl FnMut(&T) + Send) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        (seen, move |v: &T| sink.lock().unwrap().push(v.clone()))
    }

    #[test]
    fn test_value_returns_last_published() {
        let cell = ValueCell::new(0);
        assert_eq!(cell.value(), 0);
        cell.publish(7);
        assert_eq!(cell.value(), 7);
    }

    #[test]
    fn test_subscribe_replays_current_value() {
        let cell = ValueCell::new(42);
        let (seen, sink) = collector();
        let _sub = cell.subscribe(sink);
        assert_eq!(*seen.lock().unwrap(), vec![42]);
    }

    #[test]
    fn test_publish_notifies_before_returning() {
        let cell = ValueCell::new(0);
        let (seen, sink) = collector();
        let _sub = cell.subscribe(sink);
        cell.publish(1);
        cell.publish(2);
        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_multicast_in_subscription_order() {
        let cell = ValueCell::new(0);
        let order = Arc::new(Mutex::new(Vec::new()));
        let a = order.clone();
        let b = order.clone();
        let _sub_a = cell.subscribe(move |v| a.lock().unwrap().push(("a", *v)));
        let _sub_b = cell.subscribe(move |v| b.lock().unwrap().push(("b", *v)));
        order.lock().unwrap().clear();

        cell.publish(5);
        assert_eq!(*order.lock().unwrap(), vec![("a", 5), ("b", 5)]);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let cell = ValueCell::new(0);
        let (seen, sink) = collector();
        let sub = cell.subscribe(sink);
        assert_eq!(cell.subscriber_count(), 1);

        drop(sub);
        assert_eq!(cell.subscriber_count(), 0);
        cell.publish(1);
        assert_eq!(*seen.lock().unwrap(), vec![0]);
    }

    #[test]
    fn test_detach_keeps_subscriber() {
        let cell = ValueCell::new(0);
        let (seen, sink) = collector();
        cell.subscribe(sink).detach();
        cell.publish(1);
        assert_eq!(*seen.lock().unwrap(), vec![0, 1]);
    }

    #[test]
    fn test_reentrant_publish_is_queued() {
        let cell = ValueCell::new(0);
        let (seen, sink) = collector();
        let _log = cell.subscribe(sink);

        let reentrant = cell.clone();
        let _sub = cell.subscribe(move |v| {
            if *v == 1 {
                // Must not corrupt the in-flight pass; delivered afterwards.
                reentrant.publish(2);
            }
        });

        cell.publish(1);
        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);
        assert_eq!(cell.value(), 2);
    }

    #[test]
    fn test_subscribe_from_callback() {
        let cell = ValueCell::new(0);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let inner_seen = seen.clone();
        let handle = cell.clone();
        let _sub = cell.subscribe(move |v| {
            if *v == 1 {
                let sink = inner_seen.clone();
                handle.subscribe(move |v| sink.lock().unwrap().push(*v)).detach();
            }
        });

        cell.publish(1);
        // The late subscriber replayed the value being delivered.
        assert_eq!(*seen.lock().unwrap(), vec![1]);
    }

    #[test]
    fn test_clone_shares_state() {
        let cell = ValueCell::new(0);
        let other = cell.clone();
        cell.publish(9);
        assert_eq!(other.value(), 9);
    }

    #[test]
    fn test_merged_subscription_cancels_both() {
        let cell_a = ValueCell::new(0);
        let cell_b = ValueCell::new(0);
        let sub = cell_a.subscribe(|_| {}).merge(cell_b.subscribe(|_| {}));
        assert_eq!(cell_a.subscriber_count(), 1);
        assert_eq!(cell_b.subscriber_count(), 1);

        drop(sub);
        assert_eq!(cell_a.subscriber_count(), 0);
        assert_eq!(cell_b.subscriber_count(), 0);
    }
}
