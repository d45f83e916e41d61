//! Publish payload: raw bytes plus named metric metadata.
//!
//! [`Payload`] is the bytes-with-metadata value handed to the publish
//! capability. It carries an optional wall-clock timestamp, an ordered map of
//! named metrics and an optional raw body. The registry and notifiers treat
//! it as opaque; only the application and the transport interpret it.
//!
//! ## Example
//! ```rust
//! use edgelink::{MetricValue, Payload};
//!
//! let payload = Payload::now()
//!     .with_metric("temperature_internal", MetricValue::F32(20.5))
//!     .with_metric("error_code", MetricValue::I32(0));
//!
//! assert_eq!(payload.metric("error_code"), Some(&MetricValue::I32(0)));
//! ```

use std::collections::BTreeMap;
use std::time::SystemTime;

/// A single typed metric value attached to a [`Payload`].
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Bool(bool),
    String(String),
    Bytes(Vec<u8>),
}

/// Publish payload: optional timestamp, named metrics, optional raw body.
///
/// Metrics are kept in a `BTreeMap` so iteration order is deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload {
    timestamp: Option<SystemTime>,
    metrics: BTreeMap<String, MetricValue>,
    body: Option<Vec<u8>>,
}

impl Payload {
    /// Creates an empty payload with no timestamp.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty payload stamped with the current wall-clock time.
    pub fn now() -> Self {
        Self {
            timestamp: Some(SystemTime::now()),
            ..Self::default()
        }
    }

    /// Sets the timestamp.
    #[inline]
    pub fn with_timestamp(mut self, at: SystemTime) -> Self {
        self.timestamp = Some(at);
        self
    }

    /// Adds or replaces a named metric.
    #[inline]
    pub fn with_metric(mut self, name: impl Into<String>, value: MetricValue) -> Self {
        self.metrics.insert(name.into(), value);
        self
    }

    /// Sets the raw body bytes.
    #[inline]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Returns the timestamp, if set.
    pub fn timestamp(&self) -> Option<SystemTime> {
        self.timestamp
    }

    /// Returns the metric with the given name, if present.
    pub fn metric(&self, name: &str) -> Option<&MetricValue> {
        self.metrics.get(name)
    }

    /// Iterates over all metrics in name order.
    pub fn metrics(&self) -> impl Iterator<Item = (&str, &MetricValue)> {
        self.metrics.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the raw body, if set.
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }
}
