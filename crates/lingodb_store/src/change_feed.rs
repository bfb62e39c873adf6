//! Typed change feed with explicit subscription lifecycle.
//!
//! Stores emit one [`RecordsChanged`] batch per logical change: a single
//! entry for a local insert/update/delete, or one consolidated batch for
//! everything a working-copy reload found different.
//!
//! Unlike a constructor-time callback, subscribers attach and detach
//! explicitly. Dropping (or cancelling) a [`Subscription`] unregisters it,
//! and multiple subscribers can observe the same feed independently.

use lingodb_codec::SlotRecord;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::Duration;

/// One changed entry within a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordChange<R> {
    /// The record was inserted or its body changed.
    Upserted(R),
    /// The record's slot now holds a tombstone.
    Deleted {
        /// Id of the removed record.
        id: String,
    },
}

impl<R: SlotRecord> RecordChange<R> {
    /// Returns the id of the affected record.
    pub fn id(&self) -> &str {
        match self {
            RecordChange::Upserted(record) => record.id(),
            RecordChange::Deleted { id } => id,
        }
    }
}

/// A batch of record changes emitted as one event.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordsChanged<R> {
    /// The changed entries. Never empty.
    pub entries: Vec<RecordChange<R>>,
}

impl<R> RecordsChanged<R> {
    /// Creates a batch event.
    pub fn new(entries: Vec<RecordChange<R>>) -> Self {
        Self { entries }
    }
}

struct FeedInner<E> {
    subscribers: RwLock<Vec<(u64, Sender<E>)>>,
    next_id: AtomicU64,
}

/// A change feed that fans events out to all active subscribers.
///
/// Thread-safe; events are delivered in emit order per subscriber.
pub struct ChangeFeed<E> {
    inner: Arc<FeedInner<E>>,
}

impl<E: Clone + Send + 'static> ChangeFeed<E> {
    /// Creates a feed with no subscribers.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(FeedInner {
                subscribers: RwLock::new(Vec::new()),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// Attaches a new subscriber.
    ///
    /// The returned handle buffers every event emitted after this call
    /// until it is cancelled or dropped.
    pub fn subscribe(&self) -> Subscription<E> {
        let (tx, rx) = mpsc::channel();
        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
        self.inner.subscribers.write().push((id, tx));
        Subscription {
            id,
            rx,
            feed: Arc::clone(&self.inner),
        }
    }

    /// Emits an event to all subscribers, dropping any whose receiver has
    /// disconnected.
    pub fn emit(&self, event: E) {
        let mut subscribers = self.inner.subscribers.write();
        subscribers.retain(|(_, tx)| tx.send(event.clone()).is_ok());
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.read().len()
    }
}

impl<E: Clone + Send + 'static> Default for ChangeFeed<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// A handle to one subscription on a [`ChangeFeed`].
///
/// Dropping the handle unregisters the subscriber; [`Subscription::cancel`]
/// does the same explicitly.
pub struct Subscription<E> {
    id: u64,
    rx: Receiver<E>,
    feed: Arc<FeedInner<E>>,
}

impl<E> Subscription<E> {
    /// Returns the next buffered event, if any, without blocking.
    pub fn try_next(&self) -> Option<E> {
        self.rx.try_recv().ok()
    }

    /// Blocks up to `timeout` for the next event.
    pub fn next_timeout(&self, timeout: Duration) -> Option<E> {
        self.rx.recv_timeout(timeout).ok()
    }

    /// Drains all currently buffered events.
    pub fn drain(&self) -> Vec<E> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }

    /// Cancels the subscription, unregistering it from the feed.
    pub fn cancel(self) {
        // Drop handles the unregistration.
    }
}

impl<E> Drop for Subscription<E> {
    fn drop(&mut self) {
        self.feed
            .subscribers
            .write()
            .retain(|(id, _)| *id != self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emit_and_receive() {
        let feed: ChangeFeed<u32> = ChangeFeed::new();
        let sub = feed.subscribe();

        feed.emit(7);
        assert_eq!(sub.try_next(), Some(7));
        assert_eq!(sub.try_next(), None);
    }

    #[test]
    fn multiple_subscribers_see_every_event() {
        let feed: ChangeFeed<u32> = ChangeFeed::new();
        let a = feed.subscribe();
        let b = feed.subscribe();

        feed.emit(1);
        feed.emit(2);

        assert_eq!(a.drain(), vec![1, 2]);
        assert_eq!(b.drain(), vec![1, 2]);
    }

    #[test]
    fn cancel_unregisters() {
        let feed: ChangeFeed<u32> = ChangeFeed::new();
        let sub = feed.subscribe();
        assert_eq!(feed.subscriber_count(), 1);

        sub.cancel();
        assert_eq!(feed.subscriber_count(), 0);
    }

    #[test]
    fn drop_unregisters() {
        let feed: ChangeFeed<u32> = ChangeFeed::new();
        {
            let _sub = feed.subscribe();
            assert_eq!(feed.subscriber_count(), 1);
        }
        assert_eq!(feed.subscriber_count(), 0);
    }

    #[test]
    fn late_subscriber_misses_earlier_events() {
        let feed: ChangeFeed<u32> = ChangeFeed::new();
        feed.emit(1);

        let sub = feed.subscribe();
        feed.emit(2);

        assert_eq!(sub.drain(), vec![2]);
    }

    #[test]
    fn events_keep_order() {
        let feed: ChangeFeed<u32> = ChangeFeed::new();
        let sub = feed.subscribe();
        for i in 0..100 {
            feed.emit(i);
        }
        assert_eq!(sub.drain(), (0..100).collect::<Vec<_>>());
    }
}
