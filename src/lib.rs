//! # edgelink
//!
//! **edgelink** is a lightweight connectivity-eventing library for edge
//! gateways. It provides primitives to deliver connection-lifecycle and
//! message events to an open-ended, changing set of listeners, and to keep a
//! derived session in step with an externally-managed connection that can
//! appear, change or vanish at runtime.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  application code              ServiceDirectory (discovered instances)
//!        │                            │
//!        │ add_explicit /             │ Appeared / Modified / Removed
//!        │ remove_explicit            │ (filtered Watch)
//!        ▼                            ▼
//! ┌───────────────────────────────────────────────┐
//! │  ListenerRegistry<L>                          │
//! │  - explicit entries (insertion order)         │
//! │  - discovered entries (handle order)          │
//! │  - snapshot(): immutable copy for one emit    │
//! └───────────────────┬───────────────────────────┘
//!                     │ snapshot()
//!                     ▼
//! ┌───────────────────────────────────────────────┐
//! │  DataServiceNotifier / DataTransportNotifier  │
//! │  notify_x(args):                              │
//! │    for listener in snapshot (sequential):     │
//! │      listener.on_x(args)                      │
//! │        └─ panic → caught, logged, continue    │
//! └───────────────────────────────────────────────┘
//!
//!  ServiceDirectory ──► Watch ──► DependencyBinder ──► SessionFactory
//!                                   │                    build/teardown
//!                                   └─► CloudSession (derived resource)
//! ```
//!
//! ### Delivery rules
//! - One emit delivers to exactly the membership at the instant the snapshot
//!   was taken; concurrent add/remove lands in the next snapshot.
//! - Listeners are visited sequentially in snapshot order; a failing
//!   listener is logged and skipped, never unregistered, and never stops
//!   delivery to the rest.
//! - Emitting with no listeners records the drop and returns; not an error.
//!
//! ## Features
//! | Area              | Description                                                    | Key types / traits                                 |
//! |-------------------|----------------------------------------------------------------|----------------------------------------------------|
//! | **Membership**    | Explicit + discovered listeners, snapshots, close semantics.   | [`ListenerRegistry`], [`RegistrationHandle`]       |
//! | **Fan-out**       | Per-family notifiers with per-listener fault isolation.        | [`DataServiceNotifier`], [`DataTransportNotifier`] |
//! | **Listeners**     | The two connectivity capability sets.                          | [`DataServiceListener`], [`DataTransportListener`] |
//! | **Discovery**     | In-process directory with filtered change watches.             | [`ServiceDirectory`], [`ServiceFilter`], [`Watch`] |
//! | **Binding**       | Rebuild a derived session on every dependency transition.      | [`DependencyBinder`], [`SessionFactory`]           |
//! | **Cloud surface** | Publish capability and app-scoped sessions.                    | [`CloudConnection`], [`CloudSession`]              |
//! | **Configuration** | Loosely-typed property bag with typed getters.                 | [`Properties`], [`PropertyValue`]                  |
//!
//! ## Optional features
//! - `logging`: exports [`LogListener`], a reference listener that logs
//!   every data-service callback _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//!
//! use async_trait::async_trait;
//! use edgelink::{DataServiceListener, DataServiceNotifier};
//!
//! struct Console;
//!
//! #[async_trait]
//! impl DataServiceListener for Console {
//!     async fn on_message_arrived(&self, topic: &str, payload: &[u8], _qos: i32, _ret: bool) {
//!         println!("{topic}: {} bytes", payload.len());
//!     }
//!     fn name(&self) -> &'static str {
//!         "console"
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let notifier = DataServiceNotifier::new();
//!     let handle = notifier.registry().add_explicit(Arc::new(Console));
//!
//!     notifier
//!         .notify_message_arrived("sensors/temp", &[0x01, 0x02], 0, false)
//!         .await;
//!
//!     notifier.registry().remove_explicit(handle);
//!     notifier.close();
//! }
//! ```

mod binder;
mod cloud;
mod config;
mod directory;
mod error;
mod message;
mod notify;
mod registry;

// ---- Public re-exports ----

pub use binder::{DependencyBinder, SessionFactory};
pub use cloud::{CloudConnection, CloudSession, CloudSessionFactory};
pub use config::{Properties, PropertyValue};
pub use directory::{DirectoryEvent, InstanceHandle, ServiceDirectory, ServiceFilter, Watch};
pub use error::{BindError, DirectoryError, TransportError};
pub use message::{MetricValue, Payload};
pub use notify::{
    DataServiceListener, DataServiceNotifier, DataTransportListener, DataTransportNotifier,
    DeliveryToken,
};
pub use registry::{ListenerRegistry, RegistrationHandle};

// Optional: expose the reference logging listener (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use notify::LogListener;
