//! Reader-writer guard over the depth ordering of one engine.

use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Serializes every depth-changing write against all other operations.
///
/// Writers hold the exclusive side for the whole plan-and-commit sequence;
/// readers share the other side for fetch, filter and sort. The lock is fair,
/// so a waiting writer is not starved by a steady stream of readers.
/// Acquisition has no timeout.
#[derive(Debug, Default)]
pub struct DepthGuard {
    lock: RwLock<()>,
}

impl DepthGuard {
    /// An unlocked guard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared access for reads.
    pub async fn read(&self) -> RwLockReadGuard<'_, ()> {
        self.lock.read().await
    }

    /// Exclusive access for writes.
    pub async fn write(&self) -> RwLockWriteGuard<'_, ()> {
        self.lock.write().await
    }
}
