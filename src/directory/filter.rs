//! Filters selecting directory instances by their logical name.

use crate::error::DirectoryError;

/// Filter expressed over instance attributes.
///
/// Only the logical-name equality form is needed by the components in this
/// crate; [`ServiceFilter::any`] matches every registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceFilter {
    kind: FilterKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum FilterKind {
    Any,
    Name(String),
}

impl ServiceFilter {
    /// Matches every registered instance.
    pub fn any() -> Self {
        Self {
            kind: FilterKind::Any,
        }
    }

    /// Matches instances whose logical name equals `name` exactly.
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            kind: FilterKind::Name(name.into()),
        }
    }

    /// Checks the filter is well-formed.
    ///
    /// Validation happens when a watch is opened, not at construction, so a
    /// filter built from not-yet-validated configuration can exist without
    /// being usable.
    pub(crate) fn validate(&self) -> Result<(), DirectoryError> {
        match &self.kind {
            FilterKind::Any => Ok(()),
            FilterKind::Name(name) if name.is_empty() => Err(DirectoryError::InvalidFilter {
                reason: "empty logical name".to_string(),
            }),
            FilterKind::Name(_) => Ok(()),
        }
    }

    /// Returns true if a registration with `name` matches this filter.
    pub fn matches(&self, name: &str) -> bool {
        match &self.kind {
            FilterKind::Any => true,
            FilterKind::Name(wanted) => wanted == name,
        }
    }
}
