//! # Fault-isolated event fan-out to registered listeners.
//!
//! This module defines the two connectivity event families and their
//! notifiers. Each notifier snapshots a [`ListenerRegistry`](crate::ListenerRegistry)
//! and delivers one event to every member, isolating per-listener failures.
//!
//! ## Architecture
//! ```text
//! notify_x(args)
//!     │
//!     ├─► registry.snapshot()            (lock held only for the copy)
//!     │
//!     ├─ empty ──► debug!("no registered listeners ...")   (dropped, not an error)
//!     │
//!     └─► for listener in snapshot (in order):
//!             listener.on_x(args)  ──► panic → caught, warn!(name, event), continue
//! ```
//!
//! ## Rules
//! - **Sequential, in snapshot order**: delivery order to a single listener
//!   across emits matches call order at the notifier; no internal queueing.
//! - **Isolation**: one listener panicking never prevents delivery to the
//!   rest and never removes it from the registry.
//! - **No lock during delivery**: listeners may call back into the registry
//!   from their own handlers; the effect lands in the next snapshot.
//! - **No retry, no buffering, no reordering.**
//!
//! The per-listener catch boundary exists in exactly one place,
//! [`fan_out`], shared by both event families.

mod data_service;
mod transport;

#[cfg(feature = "logging")]
mod log_listener;

pub use data_service::{DataServiceListener, DataServiceNotifier};
pub use transport::{DataTransportListener, DataTransportNotifier, DeliveryToken};

#[cfg(feature = "logging")]
pub use log_listener::LogListener;

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;

/// Delivers one event to every member of a snapshot, catching any failure a
/// listener can produce at the call boundary.
///
/// An empty snapshot records the drop and returns; this is expected
/// steady-state, not an error.
pub(crate) async fn fan_out<L, F, Fut>(
    event: &'static str,
    members: Vec<Arc<L>>,
    name_of: impl Fn(&L) -> &'static str,
    deliver: F,
) where
    L: ?Sized,
    F: Fn(Arc<L>) -> Fut,
    Fut: Future<Output = ()>,
{
    if members.is_empty() {
        log::debug!("no registered listeners, dropping {event}");
        return;
    }
    for listener in members {
        let name = name_of(&listener);
        let fut = deliver(Arc::clone(&listener));
        if let Err(panic) = AssertUnwindSafe(fut).catch_unwind().await {
            log::warn!(
                "listener {name} failed during {event}: {}",
                panic_message(&panic)
            );
        }
    }
}

/// Extracts a printable message from a caught panic payload.
fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
