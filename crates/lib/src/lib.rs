//!
//! Stratum: placed items on a canvas with a strict, unique depth order.
//! This library provides the engine that keeps that order consistent under
//! concurrent writes, together with the stores it runs on.
//!
//! ## Core Concepts
//!
//! * **Items (`item::PlacedItem`)**: The single entity. Each item has a position, a size, and a
//!   `depth` that no other item shares.
//! * **Stores (`backend::ItemStore`)**: Pluggable persistence for items: in memory (with JSON
//!   snapshots) or SQL via sqlx (SQLite, PostgreSQL).
//! * **Ordering (`ordering`)**: Decides every depth value. Placing an item on an occupied depth
//!   shifts the contiguous run of items above it by one, stopping at the first gap.
//! * **Filtering (`filter::ListQuery`)**: Bounds, exact size filters, depth ordering and the
//!   clamped result limit applied to list reads.
//! * **Engine (`Engine`)**: Ties the above together behind a reader-writer guard so that each
//!   cascade is committed as one unit.

pub mod backend;
pub mod clock;
pub mod constants;
pub mod engine;
pub mod filter;
pub mod item;
pub mod ordering;

/// Re-export the `Engine` handle for easier access.
pub use engine::Engine;

/// Re-export time provider types.
pub use clock::{Clock, SystemClock, Timestamp};
#[cfg(any(test, feature = "testing"))]
pub use clock::FixedClock;

/// Re-export the item types used by every caller.
pub use item::{ItemId, PlacedItem};

/// Result type used throughout the Stratum library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the Stratum library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Structured validation errors from the item module
    #[error(transparent)]
    Item(item::ItemError),

    /// Structured query parameter errors from the filter module
    #[error(transparent)]
    Filter(filter::FilterError),

    /// Structured depth planning errors from the ordering module
    #[error(transparent)]
    Ordering(ordering::OrderingError),

    /// Structured store errors from the backend module
    #[error(transparent)]
    Backend(backend::BackendError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Item(_) => "item",
            Error::Filter(_) => "filter",
            Error::Ordering(_) => "ordering",
            Error::Backend(_) => "backend",
        }
    }

    /// Check if this error indicates an item was not found.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Backend(backend_err) => backend_err.is_not_found(),
            _ => false,
        }
    }

    /// Check if this error was caused by invalid client input.
    pub fn is_validation_error(&self) -> bool {
        match self {
            Error::Item(item_err) => item_err.is_validation_error(),
            Error::Filter(filter_err) => filter_err.is_validation_error(),
            Error::Ordering(ordering_err) => ordering_err.is_validation_error(),
            _ => false,
        }
    }

    /// Check if the store failed or refused a write.
    ///
    /// Everything that is neither "not found" nor a validation error lands here.
    pub fn is_store_failure(&self) -> bool {
        match self {
            Error::Backend(backend_err) => backend_err.is_store_failure(),
            _ => false,
        }
    }

    /// Check if this error indicates a data integrity issue.
    pub fn is_integrity_error(&self) -> bool {
        match self {
            Error::Backend(backend_err) => backend_err.is_integrity_error(),
            _ => false,
        }
    }

    /// Check if this error is I/O related.
    pub fn is_io_error(&self) -> bool {
        match self {
            Error::Backend(backend_err) => backend_err.is_io_error(),
            _ => false,
        }
    }
}
