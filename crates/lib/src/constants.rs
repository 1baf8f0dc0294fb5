//! Fixed limits and boundary values shared across the crate.

/// Result size used by list queries that pass `limit = 0` or omit it.
pub const DEFAULT_LIST_LIMIT: usize = 10;

/// Upper bound for the result size of a single list query.
pub const MAX_LIST_LIMIT: usize = 500;

/// Depth given to the first item created without an explicit depth.
///
/// This is a fixed boundary value, not `-1 + 1`.
pub const EMPTY_STORE_DEPTH: i64 = 0;
