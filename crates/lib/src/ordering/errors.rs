//! Errors raised while planning depth assignments.

use thiserror::Error;

/// Errors from the ordering engine.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderingError {
    /// Placing or shifting an item would move it past `i64::MAX`.
    #[error("Depth overflow: no depth above {depth}")]
    DepthOverflow {
        /// The depth that could not be incremented
        depth: i64,
    },
}

impl OrderingError {
    /// Check if this error is a depth overflow.
    pub fn is_overflow(&self) -> bool {
        matches!(self, OrderingError::DepthOverflow { .. })
    }

    /// Overflow is caused by the requested depth, so it is reported as invalid input.
    pub fn is_validation_error(&self) -> bool {
        self.is_overflow()
    }
}

impl From<OrderingError> for crate::Error {
    fn from(err: OrderingError) -> Self {
        crate::Error::Ordering(err)
    }
}
