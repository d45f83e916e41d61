//! Listener membership: the registry both event families snapshot from.
//!
//! The only public API from this module is [`ListenerRegistry`] (plus its
//! [`RegistrationHandle`]), a provenance-aware membership container shared by
//! the data-service and data-transport notifiers.

mod registry;

pub use registry::{ListenerRegistry, RegistrationHandle};
