//! Errors raised while parsing list query parameters.

use thiserror::Error;

/// Errors from the filter engine.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    /// A query parameter was not an integer, or `limit` was negative.
    #[error("Invalid value for query parameter {name}: {value:?}")]
    InvalidParameter {
        /// Wire name of the parameter
        name: &'static str,
        /// The raw value supplied by the client
        value: String,
    },
}

impl FilterError {
    /// Every filter error is caused by client input.
    pub fn is_validation_error(&self) -> bool {
        true
    }

    /// The parameter this error refers to.
    pub fn parameter(&self) -> &'static str {
        match self {
            FilterError::InvalidParameter { name, .. } => name,
        }
    }
}

impl From<FilterError> for crate::Error {
    fn from(err: FilterError) -> Self {
        crate::Error::Filter(err)
    }
}
