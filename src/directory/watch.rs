//! Directory change events and the watch handle that receives them.

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;

/// Opaque key identifying one registered instance.
///
/// Stable for the lifetime of the instance: the `Modified` and `Removed`
/// events for an instance carry the same handle its `Appeared` event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstanceHandle(pub(crate) u64);

impl fmt::Display for InstanceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A change notification delivered to a [`Watch`].
///
/// The three-event contract: an instance matching the watch filter appeared,
/// was replaced in place, or went away. `Modified` is an atomic
/// remove-and-add keyed by the same handle.
pub enum DirectoryEvent<T: ?Sized> {
    /// An instance matching the filter was registered (or already existed
    /// when the watch was opened).
    Appeared {
        handle: InstanceHandle,
        instance: Arc<T>,
    },
    /// The instance registered under `handle` was replaced.
    Modified {
        handle: InstanceHandle,
        instance: Arc<T>,
    },
    /// The instance registered under `handle` was deregistered.
    Removed { handle: InstanceHandle },
}

// Hand-written impls: derived ones would require `T: Clone`/`T: Debug`,
// which trait-object instances cannot provide. Cloning only clones the `Arc`.
impl<T: ?Sized> Clone for DirectoryEvent<T> {
    fn clone(&self) -> Self {
        match self {
            DirectoryEvent::Appeared { handle, instance } => DirectoryEvent::Appeared {
                handle: *handle,
                instance: Arc::clone(instance),
            },
            DirectoryEvent::Modified { handle, instance } => DirectoryEvent::Modified {
                handle: *handle,
                instance: Arc::clone(instance),
            },
            DirectoryEvent::Removed { handle } => DirectoryEvent::Removed { handle: *handle },
        }
    }
}

impl<T: ?Sized> fmt::Debug for DirectoryEvent<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirectoryEvent::Appeared { handle, .. } => {
                f.debug_struct("Appeared").field("handle", handle).finish()
            }
            DirectoryEvent::Modified { handle, .. } => {
                f.debug_struct("Modified").field("handle", handle).finish()
            }
            DirectoryEvent::Removed { handle } => {
                f.debug_struct("Removed").field("handle", handle).finish()
            }
        }
    }
}

/// Receiving side of a directory watch.
///
/// Delivers [`DirectoryEvent`]s in registration order over an unbounded
/// channel: directory mutations never block on a slow watcher, and
/// membership events are never dropped. The watch ends (`recv` returns
/// `None`) when the directory is closed or the watch is dropped on the
/// directory side.
pub struct Watch<T: ?Sized> {
    pub(crate) rx: mpsc::UnboundedReceiver<DirectoryEvent<T>>,
}

impl<T: ?Sized> fmt::Debug for Watch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Watch").finish_non_exhaustive()
    }
}

impl<T: ?Sized> Watch<T> {
    /// Receives the next change event, or `None` once the directory is gone.
    pub async fn recv(&mut self) -> Option<DirectoryEvent<T>> {
        self.rx.recv().await
    }
}
