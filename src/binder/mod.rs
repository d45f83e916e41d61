//! Dynamic dependency binding: keep a derived session in step with a
//! discovered dependency.
//!
//! The public API is [`DependencyBinder`] plus the [`SessionFactory`] seam
//! it builds and tears down sessions through.

mod binder;

pub use binder::{DependencyBinder, SessionFactory};
