//! # Dynamic listener registry with two provenance channels.
//!
//! [`ListenerRegistry`] holds the current membership of one listener family
//! from two independent sources: **explicit** registrations made by
//! application code and **discovered** registrations fed by a directory
//! watch. Broadcasts iterate an immutable [`snapshot`](ListenerRegistry::snapshot),
//! never the live maps.
//!
//! ## Architecture
//! ```text
//! add_explicit(l) / remove_explicit(h) ──┐
//!                                        ├──► Mutex<{explicit, discovered}>
//! Directory ──► Watch ──► track() loop ──┘            │
//!                                                snapshot()
//!                                                     │
//!                                                     ▼
//!                               Vec<Arc<L>> (explicit order, then handle order)
//!                                                     │
//!                                        notifier fan-out (lock released)
//! ```
//!
//! ## Rules
//! - Mutations and `snapshot()` hold the lock only for the map operation or
//!   the reference copy; listener code never runs under it.
//! - A listener mutating the registry from inside its own callback affects
//!   the **next** snapshot, not the broadcast in flight.
//! - `on_discovered` for a known handle replaces the entry (the Modified
//!   transition needs no separate API).
//! - Removal is idempotent: removing an absent entry is a no-op.
//! - After [`close`](ListenerRegistry::close) every operation is a defined
//!   no-op and `snapshot()` is empty.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::directory::{DirectoryEvent, InstanceHandle, Watch};

/// Handle returned by [`ListenerRegistry::add_explicit`], used to remove the
/// exact entry that was added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RegistrationHandle(u64);

struct Inner<L: ?Sized> {
    closed: bool,
    next_explicit: u64,
    /// Explicit entries keyed by a monotonically increasing id, so BTreeMap
    /// iteration equals insertion order and removal stays O(log n).
    explicit: BTreeMap<u64, Arc<L>>,
    /// Discovered entries keyed by the directory handle; at most one entry
    /// per handle.
    discovered: BTreeMap<InstanceHandle, Arc<L>>,
}

/// Membership container for one listener family.
///
/// Thread-safe: mutations, snapshots and the tracking loop may run
/// concurrently from independent tasks.
pub struct ListenerRegistry<L: ?Sized> {
    inner: Mutex<Inner<L>>,
}

impl<L: ?Sized + Send + Sync + 'static> ListenerRegistry<L> {
    /// Creates an empty registry.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(Inner {
                closed: false,
                next_explicit: 0,
                explicit: BTreeMap::new(),
                discovered: BTreeMap::new(),
            }),
        })
    }

    /// Inserts an explicitly-owned listener. Never fails.
    ///
    /// After `close()` the entry is not stored; the returned handle is inert.
    pub fn add_explicit(&self, listener: Arc<L>) -> RegistrationHandle {
        let mut inner = self.inner.lock().expect("registry lock poisoned");
        inner.next_explicit += 1;
        let handle = RegistrationHandle(inner.next_explicit);
        if !inner.closed {
            inner.explicit.insert(handle.0, listener);
        }
        handle
    }

    /// Removes the explicit entry for `handle`. Idempotent: a second call,
    /// or a call for a never-registered handle, is a no-op.
    pub fn remove_explicit(&self, handle: RegistrationHandle) {
        let mut inner = self.inner.lock().expect("registry lock poisoned");
        if inner.closed {
            return;
        }
        inner.explicit.remove(&handle.0);
    }

    /// Inserts or replaces the discovered entry for `handle`.
    ///
    /// Replacement covers the directory's Modified transition: the same
    /// handle, a new instance.
    pub fn on_discovered(&self, handle: InstanceHandle, listener: Arc<L>) {
        let mut inner = self.inner.lock().expect("registry lock poisoned");
        if inner.closed {
            return;
        }
        inner.discovered.insert(handle, listener);
    }

    /// Removes the discovered entry for `handle`, if present. Idempotent.
    pub fn on_discovery_removed(&self, handle: InstanceHandle) {
        let mut inner = self.inner.lock().expect("registry lock poisoned");
        if inner.closed {
            return;
        }
        inner.discovered.remove(&handle);
    }

    /// Returns an immutable point-in-time copy of the membership: explicit
    /// entries in insertion order, then discovered entries in handle order.
    ///
    /// The copy is safe to iterate while mutations proceed on the live
    /// registry; producing it only copies `Arc` references under the lock.
    pub fn snapshot(&self) -> Vec<Arc<L>> {
        let inner = self.inner.lock().expect("registry lock poisoned");
        let mut members = Vec::with_capacity(inner.explicit.len() + inner.discovered.len());
        members.extend(inner.explicit.values().cloned());
        members.extend(inner.discovered.values().cloned());
        members
    }

    /// Returns the current number of members across both provenances.
    pub fn len(&self) -> usize {
        let inner = self.inner.lock().expect("registry lock poisoned");
        inner.explicit.len() + inner.discovered.len()
    }

    /// Returns true if no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Releases the registry: drops all entries. Afterwards every mutation
    /// is a defined no-op and `snapshot()` returns an empty vec.
    pub fn close(&self) {
        let mut inner = self.inner.lock().expect("registry lock poisoned");
        inner.closed = true;
        inner.explicit.clear();
        inner.discovered.clear();
    }

    /// Spawns a loop feeding a directory watch into the discovered channel.
    ///
    /// Runs until the watch ends (directory closed) or `cancel` fires.
    /// `Appeared` and `Modified` both land in [`on_discovered`](Self::on_discovered);
    /// `Removed` lands in [`on_discovery_removed`](Self::on_discovery_removed).
    pub fn track(self: Arc<Self>, mut watch: Watch<L>, cancel: CancellationToken) -> JoinHandle<()> {
        let me = self;
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    ev = watch.recv() => match ev {
                        Some(DirectoryEvent::Appeared { handle, instance })
                        | Some(DirectoryEvent::Modified { handle, instance }) => {
                            me.on_discovered(handle, instance);
                        }
                        Some(DirectoryEvent::Removed { handle }) => {
                            me.on_discovery_removed(handle);
                        }
                        None => break,
                    }
                }
            }
        })
    }
}
