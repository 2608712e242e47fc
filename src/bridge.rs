//! Change propagation between the store and the views reading from it.
//!
//! Two signals exist. The in-page [`DbUpdate`] is raised by a [`Store`](crate::store::Store)
//! after each successful write and only reaches subscribers of that store. The
//! cross-tab [`StorageEvent`](crate::storage::StorageEvent) is raised by the shared
//! [`StorageArea`](crate::storage::StorageArea) and carries the originating tab, so
//! a tab can ignore its own writes. [`ChangeListener`] merges both with a polling
//! tick for anything that slips through.
//!
//! Delivery is at-least-once with no ordering or sequence numbers: a listener
//! only learns that something changed and must re-read the snapshot.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Select, Sender};

use crate::storage::{StorageEvent, TabId};

/// Payload-less "some collection changed" signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbUpdate;

struct Subscribers<T> {
    next_id: u64,
    senders: Vec<(u64, Sender<T>)>,
}

/// Observer list fanning every published value out to all live subscriptions.
pub struct Broadcaster<T> {
    inner: Arc<Mutex<Subscribers<T>>>,
}

impl<T> Clone for Broadcaster<T> {
    fn clone(&self) -> Self {
        Broadcaster {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for Broadcaster<T> {
    fn default() -> Self {
        Broadcaster {
            inner: Arc::new(Mutex::new(Subscribers {
                next_id: 0,
                senders: Vec::new(),
            })),
        }
    }
}

impl<T> fmt::Debug for Broadcaster<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Broadcaster")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl<T> Broadcaster<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Subscription<T> {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut subs = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let id = subs.next_id;
        subs.next_id += 1;
        subs.senders.push((id, tx));

        Subscription {
            id,
            receiver: rx,
            owner: Arc::downgrade(&self.inner),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .senders
            .len()
    }
}

impl<T: Clone> Broadcaster<T> {
    /// Sends `event` to every subscriber and returns how many received it.
    pub fn publish(&self, event: T) -> usize {
        let mut subs = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        // Receivers dropped without going through Subscription::drop are pruned here.
        subs.senders.retain(|(_, tx)| tx.send(event.clone()).is_ok());
        subs.senders.len()
    }
}

/// Receiving end of a [`Broadcaster`]. Dropping it unsubscribes.
pub struct Subscription<T> {
    id: u64,
    receiver: Receiver<T>,
    owner: Weak<Mutex<Subscribers<T>>>,
}

impl<T> Subscription<T> {
    pub fn receiver(&self) -> &Receiver<T> {
        &self.receiver
    }

    pub fn try_recv(&self) -> Option<T> {
        self.receiver.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<T> {
        self.receiver.recv_timeout(timeout).ok()
    }

    /// Discards everything pending and returns how much was discarded.
    pub fn drain(&self) -> usize {
        self.receiver.try_iter().count()
    }
}

impl<T> fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("pending", &self.receiver.len())
            .finish()
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        if let Some(owner) = self.owner.upgrade() {
            let mut subs = owner.lock().unwrap_or_else(PoisonError::into_inner);
            subs.senders.retain(|(id, _)| *id != self.id);
        }
    }
}

/// Why a [`ChangeListener`] woke up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Refresh {
    /// A write from the listener's own store.
    Local,
    /// A write from another tab to a key in this application's namespace.
    Storage { key: String },
    /// The fallback poll interval elapsed.
    Poll,
}

enum Wake {
    Local(bool),
    Storage(Option<StorageEvent>),
    Tick,
}

/// A view's subscription to collection changes.
///
/// Holds both subscriptions and a polling ticker; dropping the listener tears
/// all three down.
pub struct ChangeListener {
    tab: TabId,
    prefix: String,
    _local_sub: Subscription<DbUpdate>,
    _storage_sub: Subscription<StorageEvent>,
    local: Receiver<DbUpdate>,
    storage: Receiver<StorageEvent>,
    ticker: Receiver<Instant>,
}

impl fmt::Debug for ChangeListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeListener")
            .field("tab", &self.tab)
            .field("prefix", &self.prefix)
            .finish()
    }
}

impl ChangeListener {
    pub(crate) fn new(
        tab: TabId,
        prefix: String,
        local: Subscription<DbUpdate>,
        storage: Subscription<StorageEvent>,
        poll_interval: Duration,
    ) -> Self {
        ChangeListener {
            tab,
            prefix,
            local: local.receiver().clone(),
            storage: storage.receiver().clone(),
            _local_sub: local,
            _storage_sub: storage,
            ticker: crossbeam_channel::tick(poll_interval),
        }
    }

    /// Blocks until the next refresh is due.
    pub fn wait(&mut self) -> Refresh {
        loop {
            if let Some(refresh) = self.next(None) {
                return refresh;
            }
        }
    }

    /// Like [`wait`](Self::wait) but gives up after `timeout`.
    pub fn wait_timeout(&mut self, timeout: Duration) -> Option<Refresh> {
        self.next(Some(Instant::now() + timeout))
    }

    fn accepts(&self, event: &StorageEvent) -> bool {
        event.origin != self.tab && event.key.starts_with(&self.prefix)
    }

    fn next(&mut self, deadline: Option<Instant>) -> Option<Refresh> {
        loop {
            let wake = {
                let mut sel = Select::new();
                let local = sel.recv(&self.local);
                let storage = sel.recv(&self.storage);
                sel.recv(&self.ticker);

                let oper = match deadline {
                    Some(deadline) => sel.select_deadline(deadline).ok()?,
                    None => sel.select(),
                };

                match oper.index() {
                    i if i == local => Wake::Local(oper.recv(&self.local).is_ok()),
                    i if i == storage => Wake::Storage(oper.recv(&self.storage).ok()),
                    _ => {
                        let _ = oper.recv(&self.ticker);
                        Wake::Tick
                    }
                }
            };

            match wake {
                Wake::Local(true) => {
                    self.coalesce();
                    return Some(Refresh::Local);
                }
                Wake::Storage(Some(event)) if self.accepts(&event) => {
                    self.coalesce();
                    return Some(Refresh::Storage { key: event.key });
                }
                Wake::Storage(Some(_)) => {}
                // The store or storage area is gone; only the poll remains.
                Wake::Local(false) => self.local = crossbeam_channel::never(),
                Wake::Storage(None) => self.storage = crossbeam_channel::never(),
                Wake::Tick => {
                    self.coalesce();
                    return Some(Refresh::Poll);
                }
            }
        }
    }

    /// Rapid writes collapse into one refresh since the reader sees the latest snapshot anyway.
    fn coalesce(&self) {
        while self.local.try_recv().is_ok() {}
        while self.storage.try_recv().is_ok() {}
    }
}
