//! # Loosely-typed property bag with typed accessors.
//!
//! [`Properties`] is the configuration surface handed to components at
//! activation/update time: a flat map of string keys to [`PropertyValue`]s.
//! Typed getters coerce values with a caller-supplied default — a missing key
//! or a value of the wrong type falls back to the default rather than
//! failing, so a partially-broken configuration degrades instead of aborting
//! the component.
//!
//! # Example
//! ```
//! use edgelink::{Properties, PropertyValue};
//!
//! let mut props = Properties::new();
//! props.insert("publish.rate", PropertyValue::I64(5));
//! props.insert("publish.topic", PropertyValue::Str("data".into()));
//!
//! assert_eq!(props.get_i64("publish.rate", 1000), 5);
//! assert_eq!(props.get_str("publish.topic", "fallback"), "data");
//! // wrong type → default
//! assert_eq!(props.get_bool("publish.rate", true), true);
//! ```

use std::collections::HashMap;

/// A single configuration value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Str(String),
    I64(i64),
    F64(f64),
    Bool(bool),
}

/// Flat map of configuration keys to loosely-typed values.
#[derive(Debug, Clone, Default)]
pub struct Properties {
    values: HashMap<String, PropertyValue>,
}

impl Properties {
    /// Creates an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a value.
    pub fn insert(&mut self, key: impl Into<String>, value: PropertyValue) {
        self.values.insert(key.into(), value);
    }

    /// Returns the raw value for `key`, if present.
    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.values.get(key)
    }

    /// Returns the string value for `key`, or `default` if missing or not a string.
    pub fn get_str<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        match self.values.get(key) {
            Some(PropertyValue::Str(s)) => s,
            _ => default,
        }
    }

    /// Returns the integer value for `key`, or `default` if missing or not an integer.
    pub fn get_i64(&self, key: &str, default: i64) -> i64 {
        match self.values.get(key) {
            Some(PropertyValue::I64(v)) => *v,
            _ => default,
        }
    }

    /// Returns the float value for `key`, or `default` if missing or not a float.
    pub fn get_f64(&self, key: &str, default: f64) -> f64 {
        match self.values.get(key) {
            Some(PropertyValue::F64(v)) => *v,
            _ => default,
        }
    }

    /// Returns the boolean value for `key`, or `default` if missing or not a boolean.
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.values.get(key) {
            Some(PropertyValue::Bool(v)) => *v,
            _ => default,
        }
    }
}

impl FromIterator<(String, PropertyValue)> for Properties {
    fn from_iter<T: IntoIterator<Item = (String, PropertyValue)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_falls_back_to_default() {
        let props = Properties::new();
        assert_eq!(props.get_i64("publish.rate", 1000), 1000);
        assert_eq!(props.get_str("mode", "Program"), "Program");
        assert!(!props.get_bool("publish.retain", false));
    }

    #[test]
    fn test_wrong_type_falls_back_to_default() {
        let mut props = Properties::new();
        props.insert("publish.rate", PropertyValue::Str("fast".into()));
        assert_eq!(props.get_i64("publish.rate", 1000), 1000);
    }

    #[test]
    fn test_present_value_wins() {
        let mut props = Properties::new();
        props.insert("program.setPoint", PropertyValue::F64(20.5));
        props.insert("publish.retain", PropertyValue::Bool(true));
        assert_eq!(props.get_f64("program.setPoint", 15.0), 20.5);
        assert!(props.get_bool("publish.retain", false));
    }
}
