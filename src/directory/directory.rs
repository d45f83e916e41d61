//! # In-process component directory with filtered change watches.
//!
//! [`ServiceDirectory`] holds the externally-managed instances other
//! components discover at runtime: register/update/deregister on one side,
//! filtered [`Watch`]es delivering [`DirectoryEvent`]s on the other.
//!
//! ## Architecture
//! ```text
//! register(name, instance) ──► Appeared(handle, instance) ──► watch A (filter matches)
//! update(handle, instance) ──► Modified(handle, instance) ──► watch A
//! deregister(handle)       ──► Removed(handle)            ──► watch A
//!                                                         └─► watch B (filter does not match: nothing)
//! ```
//!
//! ## Rules
//! - Opening a watch **replays** currently registered matching instances as
//!   `Appeared`, so late watchers observe the same membership early ones did.
//! - Mutations never block on watchers and never invoke watcher code under
//!   the directory lock.
//! - `close()` ends every watch (receivers see end-of-stream) and turns all
//!   further mutations into no-ops. No synthetic `Removed` events are sent;
//!   consumers owning registries close those themselves.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use crate::directory::filter::ServiceFilter;
use crate::directory::watch::{DirectoryEvent, InstanceHandle, Watch};
use crate::error::DirectoryError;

struct Registration<T: ?Sized> {
    name: String,
    instance: Arc<T>,
}

struct Watcher<T: ?Sized> {
    filter: ServiceFilter,
    tx: mpsc::UnboundedSender<DirectoryEvent<T>>,
}

struct Inner<T: ?Sized> {
    closed: bool,
    next_handle: u64,
    instances: BTreeMap<InstanceHandle, Registration<T>>,
    watchers: Vec<Watcher<T>>,
}

/// Directory of named component instances with filtered change watches.
pub struct ServiceDirectory<T: ?Sized> {
    inner: Mutex<Inner<T>>,
}

impl<T: ?Sized> ServiceDirectory<T> {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                closed: false,
                next_handle: 0,
                instances: BTreeMap::new(),
                watchers: Vec::new(),
            }),
        }
    }

    /// Registers an instance under a logical name.
    ///
    /// Matching watchers receive `Appeared`. Returns the handle used for
    /// later `update`/`deregister` calls. After `close()` this is a no-op
    /// returning `None`.
    pub fn register(&self, name: impl Into<String>, instance: Arc<T>) -> Option<InstanceHandle> {
        let name = name.into();
        let mut inner = self.inner.lock().expect("directory lock poisoned");
        if inner.closed {
            return None;
        }
        inner.next_handle += 1;
        let handle = InstanceHandle(inner.next_handle);
        inner.instances.insert(
            handle,
            Registration {
                name: name.clone(),
                instance: Arc::clone(&instance),
            },
        );
        inner.notify(&name, DirectoryEvent::Appeared { handle, instance });
        Some(handle)
    }

    /// Replaces the instance registered under `handle`.
    ///
    /// Matching watchers receive `Modified` carrying the same handle. A
    /// no-op if the handle is unknown or the directory is closed.
    pub fn update(&self, handle: InstanceHandle, instance: Arc<T>) {
        let mut inner = self.inner.lock().expect("directory lock poisoned");
        if inner.closed {
            return;
        }
        let name = match inner.instances.get_mut(&handle) {
            Some(reg) => {
                reg.instance = Arc::clone(&instance);
                reg.name.clone()
            }
            None => return,
        };
        inner.notify(&name, DirectoryEvent::Modified { handle, instance });
    }

    /// Removes the instance registered under `handle`.
    ///
    /// Matching watchers receive `Removed`. A no-op if the handle is unknown
    /// or the directory is closed.
    pub fn deregister(&self, handle: InstanceHandle) {
        let mut inner = self.inner.lock().expect("directory lock poisoned");
        if inner.closed {
            return;
        }
        let name = match inner.instances.remove(&handle) {
            Some(reg) => reg.name,
            None => return,
        };
        inner.notify(&name, DirectoryEvent::Removed { handle });
    }

    /// Opens a watch for instances matching `filter`.
    ///
    /// Currently registered matching instances are replayed as `Appeared`
    /// before any live event, in handle order.
    ///
    /// # Errors
    /// - [`DirectoryError::InvalidFilter`] if the filter is malformed.
    /// - [`DirectoryError::Closed`] if the directory has been closed.
    pub fn watch(&self, filter: &ServiceFilter) -> Result<Watch<T>, DirectoryError> {
        filter.validate()?;
        let mut inner = self.inner.lock().expect("directory lock poisoned");
        if inner.closed {
            return Err(DirectoryError::Closed);
        }
        let (tx, rx) = mpsc::unbounded_channel();
        for (handle, reg) in &inner.instances {
            if filter.matches(&reg.name) {
                let _ = tx.send(DirectoryEvent::Appeared {
                    handle: *handle,
                    instance: Arc::clone(&reg.instance),
                });
            }
        }
        inner.watchers.push(Watcher {
            filter: filter.clone(),
            tx,
        });
        Ok(Watch { rx })
    }

    /// Returns the number of currently registered instances.
    pub fn len(&self) -> usize {
        self.inner.lock().expect("directory lock poisoned").instances.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Closes the directory: drops all registrations and ends every watch.
    ///
    /// Further `register`/`update`/`deregister`/`watch` calls are no-ops
    /// (mutations) or return [`DirectoryError::Closed`] (watch).
    pub fn close(&self) {
        let mut inner = self.inner.lock().expect("directory lock poisoned");
        inner.closed = true;
        inner.instances.clear();
        inner.watchers.clear();
    }
}

impl<T: ?Sized> Inner<T> {
    /// Delivers an event to every watcher whose filter matches `name`,
    /// pruning watchers whose receiving side is gone.
    fn notify(&mut self, name: &str, event: DirectoryEvent<T>) {
        self.watchers.retain(|w| !w.tx.is_closed());
        for watcher in &self.watchers {
            if watcher.filter.matches(name) {
                let _ = watcher.tx.send(event.clone());
            }
        }
    }
}

impl<T: ?Sized> Default for ServiceDirectory<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect_ready(watch: &mut Watch<str>) -> Vec<DirectoryEvent<str>> {
        let mut out = Vec::new();
        while let Ok(ev) = watch.rx.try_recv() {
            out.push(ev);
        }
        out
    }

    #[test]
    fn test_watch_replays_existing_matches() {
        let dir: ServiceDirectory<str> = ServiceDirectory::new();
        let h1 = dir.register("cloud.primary", Arc::from("one")).unwrap();
        dir.register("cloud.backup", Arc::from("two")).unwrap();

        let mut watch = dir.watch(&ServiceFilter::name("cloud.primary")).unwrap();
        let events = collect_ready(&mut watch);
        assert_eq!(events.len(), 1, "only the matching instance is replayed");
        match &events[0] {
            DirectoryEvent::Appeared { handle, instance } => {
                assert_eq!(*handle, h1);
                assert_eq!(instance.as_ref(), "one");
            }
            other => panic!("expected Appeared, got {other:?}"),
        }
    }

    #[test]
    fn test_update_and_deregister_keep_the_handle() {
        let dir: ServiceDirectory<str> = ServiceDirectory::new();
        let mut watch = dir.watch(&ServiceFilter::any()).unwrap();

        let h = dir.register("svc", Arc::from("v1")).unwrap();
        dir.update(h, Arc::from("v2"));
        dir.deregister(h);

        let events = collect_ready(&mut watch);
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], DirectoryEvent::Appeared { handle, .. } if handle == h));
        match &events[1] {
            DirectoryEvent::Modified { handle, instance } => {
                assert_eq!(*handle, h);
                assert_eq!(instance.as_ref(), "v2");
            }
            other => panic!("expected Modified, got {other:?}"),
        }
        assert!(matches!(events[2], DirectoryEvent::Removed { handle } if handle == h));
    }

    #[test]
    fn test_non_matching_watch_sees_nothing() {
        let dir: ServiceDirectory<str> = ServiceDirectory::new();
        let mut watch = dir.watch(&ServiceFilter::name("other")).unwrap();
        let h = dir.register("svc", Arc::from("v1")).unwrap();
        dir.update(h, Arc::from("v2"));
        dir.deregister(h);
        assert!(collect_ready(&mut watch).is_empty());
    }

    #[test]
    fn test_unknown_handle_is_a_noop() {
        let dir: ServiceDirectory<str> = ServiceDirectory::new();
        let mut watch = dir.watch(&ServiceFilter::any()).unwrap();
        dir.update(InstanceHandle(42), Arc::from("x"));
        dir.deregister(InstanceHandle(42));
        assert!(collect_ready(&mut watch).is_empty());
    }

    #[test]
    fn test_invalid_filter_rejected_at_watch_time() {
        let dir: ServiceDirectory<str> = ServiceDirectory::new();
        let err = dir.watch(&ServiceFilter::name("")).unwrap_err();
        assert_eq!(err.as_label(), "directory_invalid_filter");
    }

    #[tokio::test]
    async fn test_close_ends_watches_and_disables_mutations() {
        let dir: ServiceDirectory<str> = ServiceDirectory::new();
        let mut watch = dir.watch(&ServiceFilter::any()).unwrap();

        dir.close();
        assert!(dir.register("svc", Arc::from("v1")).is_none());
        assert!(matches!(
            dir.watch(&ServiceFilter::any()),
            Err(DirectoryError::Closed)
        ));
        assert!(watch.recv().await.is_none(), "watch ends after close");
    }
}
