//! Storage backends for placed items
//!
//! This module defines the [`ItemStore`] trait, the contract the engine uses to
//! read and persist items, together with the [`WriteBatch`] unit in which all
//! depth writes are committed.
//!
//! The engine is the only component that decides depth values. A store never
//! reorders anything on its own: it answers lookups, and applies a fully
//! planned batch (the cascade of [`DepthShift`]s plus the triggering write) as
//! one atomic unit, so no reader can ever observe a half-applied cascade.

use std::any::Any;

use async_trait::async_trait;

use crate::Result;
use crate::clock::Timestamp;
use crate::item::{ItemId, ItemPatch, PlacedItem};

pub mod database;
pub mod errors;

pub use errors::BackendError;

/// One +1 relocation staged by the cascade.
///
/// `from` is the depth the engine observed when planning; stores refuse to
/// apply a shift whose item no longer sits there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthShift {
    pub id: ItemId,
    pub from: i64,
    pub to: i64,
}

/// The item write that triggered a cascade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemWrite {
    /// Store a brand-new item.
    Insert(PlacedItem),
    /// Overwrite an existing item with its merged state.
    Replace(PlacedItem),
}

impl ItemWrite {
    /// The item as it will be stored.
    pub fn item(&self) -> &PlacedItem {
        match self {
            ItemWrite::Insert(item) | ItemWrite::Replace(item) => item,
        }
    }

    /// Consume the write, returning the item.
    pub fn into_item(self) -> PlacedItem {
        match self {
            ItemWrite::Insert(item) | ItemWrite::Replace(item) => item,
        }
    }
}

/// Every store mutation produced by one logical create or update.
///
/// Shifts are listed in cascade order (ascending `from`). Applying them in
/// reverse order, after moving the triggering item out of the way, never puts
/// two rows on the same depth, which lets stores with a unique depth index
/// apply the batch without deferring constraint checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteBatch {
    pub shifts: Vec<DepthShift>,
    pub write: ItemWrite,
}

impl WriteBatch {
    /// Batch with no displaced items.
    pub fn single(write: ItemWrite) -> Self {
        Self {
            shifts: Vec::new(),
            write,
        }
    }

    /// Number of items displaced by the cascade.
    pub fn displaced(&self) -> usize {
        self.shifts.len()
    }
}

/// Persistence contract consumed by the engine.
///
/// Implementations must be `Send + Sync` so a single store can be shared by
/// every request task, and implement `Any` so callers can downcast to a
/// concrete backend (the server does this to save an in-memory store on
/// shutdown).
///
/// Stores may use internal locking for their own consistency, but the
/// ordering invariant across items is protected by the engine's guard, not by
/// the store.
#[async_trait]
pub trait ItemStore: Send + Sync + Any {
    /// Store a new item as-is.
    ///
    /// Fails with [`BackendError::DuplicateItem`] if the id already exists.
    async fn create(&self, item: PlacedItem) -> Result<PlacedItem>;

    /// Apply the present fields of `patch` to a stored item.
    ///
    /// Fails with [`BackendError::ItemNotFound`] if `id` is unknown.
    async fn update(
        &self,
        id: &ItemId,
        patch: &ItemPatch,
        updated_at: Timestamp,
    ) -> Result<PlacedItem>;

    /// Remove an item.
    ///
    /// Fails with [`BackendError::ItemNotFound`] if nothing was removed.
    async fn delete(&self, id: &ItemId) -> Result<()>;

    /// Point lookup.
    async fn get(&self, id: &ItemId) -> Result<Option<PlacedItem>>;

    /// Every stored item, in no particular order.
    async fn list(&self) -> Result<Vec<PlacedItem>>;

    /// Items with `depth >= threshold`, ascending by depth.
    ///
    /// The default implementation filters [`ItemStore::list`]; backends with
    /// an ordered index should override it.
    async fn list_from(&self, threshold: i64) -> Result<Vec<PlacedItem>> {
        let mut items: Vec<PlacedItem> = self
            .list()
            .await?
            .into_iter()
            .filter(|item| item.depth >= threshold)
            .collect();
        items.sort_by_key(|item| item.depth);
        Ok(items)
    }

    /// The item holding the greatest depth, if any.
    async fn max_by_depth(&self) -> Result<Option<PlacedItem>> {
        Ok(self.list().await?.into_iter().max_by_key(|item| item.depth))
    }

    /// Number of stored items.
    async fn count(&self) -> Result<usize> {
        Ok(self.list().await?.len())
    }

    /// Apply a planned batch atomically and return the triggering item as stored.
    ///
    /// Either every shift and the triggering write become visible, or none
    /// do. A batch whose shifts do not match stored depths is rejected with
    /// [`BackendError::StaleBatch`].
    async fn commit(&self, batch: WriteBatch) -> Result<PlacedItem>;

    /// Returns a reference to the store as a dynamic `Any` type.
    fn as_any(&self) -> &dyn Any;
}
