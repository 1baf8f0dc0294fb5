//! Validation errors for item write inputs.

use thiserror::Error;

/// Errors raised while validating create/update inputs or parsing identifiers.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ItemError {
    /// A field required on create was absent.
    #[error("Missing required field: {field}")]
    MissingField {
        /// Wire name of the missing field
        field: &'static str,
    },

    /// A dimension was zero or negative.
    #[error("Field {field} must be positive, got {value}")]
    NonPositive {
        /// Wire name of the offending field
        field: &'static str,
        /// The rejected value
        value: i64,
    },

    /// An identifier string was not a valid UUID.
    #[error("Invalid item id: {value}")]
    InvalidId {
        /// The string that failed to parse
        value: String,
    },
}

impl ItemError {
    /// Every item error is a client-side validation failure.
    pub fn is_validation_error(&self) -> bool {
        true
    }

    /// Check if this error is about a malformed identifier.
    pub fn is_invalid_id(&self) -> bool {
        matches!(self, ItemError::InvalidId { .. })
    }

    /// The wire field this error refers to, if any.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ItemError::MissingField { field } | ItemError::NonPositive { field, .. } => {
                Some(field)
            }
            ItemError::InvalidId { .. } => None,
        }
    }
}

impl From<ItemError> for crate::Error {
    fn from(err: ItemError) -> Self {
        crate::Error::Item(err)
    }
}
