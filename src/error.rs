//! Error types used by the edgelink registry, binder and transport surface.
//!
//! This module defines three error enums:
//!
//! - [`TransportError`] — failures of the publish capability and connection-loss causes.
//! - [`BindError`] — failures while building or tearing down a derived session.
//! - [`DirectoryError`] — failures opening a directory watch.
//!
//! All types provide `as_label()` returning a short stable snake_case label
//! for logs and metrics.
//!
//! Listener failures during delivery are deliberately **not** represented
//! here: they are caught at the fan-out boundary, logged, and never
//! propagated to the emitter. Likewise, calling a
//! registry operation after `close()` is a defined no-op, not an error.

use thiserror::Error;

/// # Errors produced by the underlying transport.
///
/// Raised by [`CloudConnection::publish`](crate::CloudConnection::publish)
/// and carried as the cause of `on_connection_lost` notifications.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// No active connection; the publish was not attempted.
    #[error("no active connection")]
    NotConnected,

    /// The transport rejected the payload.
    #[error("payload rejected: {reason}")]
    Rejected {
        /// Why the transport refused the message.
        reason: String,
    },

    /// The link to the remote endpoint went down.
    #[error("connection lost: {reason}")]
    LinkDown {
        /// Cause reported by the transport.
        reason: String,
    },
}

impl TransportError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            TransportError::NotConnected => "transport_not_connected",
            TransportError::Rejected { .. } => "transport_rejected",
            TransportError::LinkDown { .. } => "transport_link_down",
        }
    }
}

/// # Errors produced while (re)building a derived session.
///
/// Returned by [`SessionFactory`](crate::SessionFactory)
/// implementations and surfaced by the binder transitions. Never fatal: the
/// binder stays in a resource-less state and the next Appeared/Modified
/// notification gets another attempt.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum BindError {
    /// Building the session from the bound dependency failed.
    #[error("session build failed: {reason}")]
    Build {
        /// Underlying failure message.
        reason: String,
    },

    /// Tearing down the previous session failed (best-effort cleanup).
    #[error("session teardown failed: {reason}")]
    Teardown {
        /// Underlying failure message.
        reason: String,
    },
}

impl BindError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            BindError::Build { .. } => "bind_build_failed",
            BindError::Teardown { .. } => "bind_teardown_failed",
        }
    }
}

/// # Errors produced when opening a directory watch.
///
/// Logged at setup time by the caller; the registry or binder remains usable
/// with zero discovered members until a retry succeeds.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    /// The filter is malformed and cannot be evaluated.
    #[error("invalid filter: {reason}")]
    InvalidFilter {
        /// What is wrong with the filter.
        reason: String,
    },

    /// The directory has been closed.
    #[error("directory closed")]
    Closed,
}

impl DirectoryError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            DirectoryError::InvalidFilter { .. } => "directory_invalid_filter",
            DirectoryError::Closed => "directory_closed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_stable() {
        assert_eq!(
            TransportError::NotConnected.as_label(),
            "transport_not_connected"
        );
        assert_eq!(
            BindError::Build {
                reason: "boom".into()
            }
            .as_label(),
            "bind_build_failed"
        );
        assert_eq!(DirectoryError::Closed.as_label(), "directory_closed");
    }

    #[test]
    fn test_display_includes_reason() {
        let err = TransportError::Rejected {
            reason: "payload too large".into(),
        };
        assert_eq!(err.to_string(), "payload rejected: payload too large");
    }
}
