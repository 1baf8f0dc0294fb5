//! Store error types.
//!
//! Structured errors for item storage, shared by the in-memory and SQL
//! backends.

use thiserror::Error;

use crate::item::ItemId;

/// Errors that can occur during store operations.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Existing variants will not be removed in minor versions
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum BackendError {
    /// No item with this identifier exists.
    #[error("Item not found: {id}")]
    ItemNotFound {
        /// The identifier that was looked up
        id: ItemId,
    },

    /// An item with this identifier already exists.
    #[error("Item already exists: {id}")]
    DuplicateItem {
        /// The identifier that collided
        id: ItemId,
    },

    /// A staged depth shift no longer matches stored state.
    ///
    /// Raised before any part of the batch is applied.
    #[error("Stale batch for item {id}: expected depth {expected}, found {found:?}")]
    StaleBatch {
        /// Item the shift referred to
        id: ItemId,
        /// Depth the batch expected the item to hold
        expected: i64,
        /// Depth actually stored, or `None` if the item is gone
        found: Option<i64>,
    },

    /// A write would leave two items on the same depth.
    #[error("Depth {depth} is already occupied")]
    DepthConflict {
        /// The contested depth
        depth: i64,
    },

    /// SQL driver error.
    #[cfg(any(feature = "sqlite", feature = "postgres"))]
    #[error("SQL error: {reason}")]
    SqlxError {
        /// Context and driver message
        reason: String,
        /// The underlying sqlx error, when there is one
        #[source]
        source: Option<sqlx::Error>,
    },

    /// Serialization failed.
    #[error("Serialization failed")]
    SerializationFailed {
        /// The underlying serialization error
        #[source]
        source: serde_json::Error,
    },

    /// Deserialization failed.
    #[error("Deserialization failed")]
    DeserializationFailed {
        /// The underlying deserialization error
        #[source]
        source: serde_json::Error,
    },

    /// File I/O error.
    #[error("File I/O error")]
    FileIo {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Persisted file uses a format version this build cannot read.
    #[error("Unsupported persistence version {found}; expected {expected}")]
    UnsupportedVersion {
        /// Version found in the file
        found: u8,
        /// Version this build writes
        expected: u8,
    },
}

impl BackendError {
    /// Check if this error indicates an item was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, BackendError::ItemNotFound { .. })
    }

    /// Check if the store rejected or failed a write.
    ///
    /// Everything except a plain lookup miss counts as a store failure.
    pub fn is_store_failure(&self) -> bool {
        !self.is_not_found()
    }

    /// Check if this error guards the depth-uniqueness invariant.
    pub fn is_integrity_error(&self) -> bool {
        matches!(
            self,
            BackendError::StaleBatch { .. }
                | BackendError::DepthConflict { .. }
                | BackendError::DuplicateItem { .. }
        )
    }

    /// Check if this error is related to I/O or (de)serialization.
    pub fn is_io_error(&self) -> bool {
        matches!(
            self,
            BackendError::FileIo { .. }
                | BackendError::SerializationFailed { .. }
                | BackendError::DeserializationFailed { .. }
                | BackendError::UnsupportedVersion { .. }
        )
    }

    /// The item identifier this error refers to, if any.
    pub fn item_id(&self) -> Option<&ItemId> {
        match self {
            BackendError::ItemNotFound { id }
            | BackendError::DuplicateItem { id }
            | BackendError::StaleBatch { id, .. } => Some(id),
            _ => None,
        }
    }
}

impl From<BackendError> for crate::Error {
    fn from(err: BackendError) -> Self {
        crate::Error::Backend(err)
    }
}
