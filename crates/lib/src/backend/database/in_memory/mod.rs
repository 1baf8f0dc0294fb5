//! In-memory store implementation
//!
//! Items live in a `HashMap` keyed by id, mirrored by a `BTreeMap` from depth
//! to id. The ordered index answers `list_from` and `max_by_depth` without a
//! scan and doubles as the uniqueness check for every write.

mod persistence;

use std::any::Any;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::Result;
use crate::backend::errors::BackendError;
use crate::backend::{ItemStore, ItemWrite, WriteBatch};
use crate::clock::Timestamp;
use crate::item::{ItemId, ItemPatch, PlacedItem};

/// Items plus their depth index. Both maps are always updated together.
#[derive(Debug, Default)]
pub(crate) struct MemoryState {
    pub(crate) items: HashMap<ItemId, PlacedItem>,
    pub(crate) by_depth: BTreeMap<i64, ItemId>,
}

impl MemoryState {
    /// Rebuild state from a flat list, rejecting duplicate ids or depths.
    pub(crate) fn from_items(items: Vec<PlacedItem>) -> Result<Self> {
        let mut state = Self::default();
        for item in items {
            state.check_insert(&item)?;
            state.insert(item);
        }
        Ok(state)
    }

    fn check_insert(&self, item: &PlacedItem) -> Result<()> {
        if self.items.contains_key(&item.id) {
            return Err(BackendError::DuplicateItem { id: item.id }.into());
        }
        if self.by_depth.contains_key(&item.depth) {
            return Err(BackendError::DepthConflict { depth: item.depth }.into());
        }
        Ok(())
    }

    fn insert(&mut self, item: PlacedItem) {
        self.by_depth.insert(item.depth, item.id);
        self.items.insert(item.id, item);
    }

    fn remove(&mut self, id: &ItemId) -> Option<PlacedItem> {
        let item = self.items.remove(id)?;
        self.by_depth.remove(&item.depth);
        Some(item)
    }

    /// Verify a batch against current state without touching it.
    fn check_batch(&self, batch: &WriteBatch) -> Result<()> {
        let target = batch.write.item();
        let mut vacated: HashSet<i64> = HashSet::with_capacity(batch.shifts.len() + 1);

        match &batch.write {
            ItemWrite::Insert(item) => {
                if self.items.contains_key(&item.id) {
                    return Err(BackendError::DuplicateItem { id: item.id }.into());
                }
            }
            ItemWrite::Replace(item) => match self.items.get(&item.id) {
                Some(current) => {
                    vacated.insert(current.depth);
                }
                None => return Err(BackendError::ItemNotFound { id: item.id }.into()),
            },
        }

        for shift in &batch.shifts {
            let found = self.items.get(&shift.id).map(|item| item.depth);
            if shift.id == target.id || found != Some(shift.from) {
                return Err(BackendError::StaleBatch {
                    id: shift.id,
                    expected: shift.from,
                    found,
                }
                .into());
            }
            vacated.insert(shift.from);
        }

        let mut claimed: HashSet<i64> = HashSet::with_capacity(batch.shifts.len() + 1);
        let destinations = batch
            .shifts
            .iter()
            .map(|shift| shift.to)
            .chain(std::iter::once(target.depth));
        for depth in destinations {
            let occupied = self.by_depth.contains_key(&depth) && !vacated.contains(&depth);
            if occupied || !claimed.insert(depth) {
                return Err(BackendError::DepthConflict { depth }.into());
            }
        }
        Ok(())
    }

    fn apply_batch(&mut self, batch: WriteBatch) -> PlacedItem {
        let target = batch.write.into_item();
        self.remove(&target.id);

        for shift in batch.shifts.iter().rev() {
            if let Some(item) = self.items.get_mut(&shift.id) {
                item.depth = shift.to;
                self.by_depth.remove(&shift.from);
                self.by_depth.insert(shift.to, shift.id);
            }
        }

        self.insert(target.clone());
        target
    }
}

/// A store that keeps all items in process memory.
///
/// Suitable for tests, development, and deployments that snapshot state to a
/// JSON file via [`InMemory::save_to_file`] / [`InMemory::load_from_file`].
#[derive(Debug, Default)]
pub struct InMemory {
    pub(crate) state: RwLock<MemoryState>,
}

impl InMemory {
    /// Creates a new, empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Saves every stored item to `path` as JSON.
    pub async fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        persistence::save_to_file(self, path).await
    }

    /// Loads a store previously written by [`InMemory::save_to_file`].
    ///
    /// A missing file yields an empty store.
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        persistence::load_from_file(path).await
    }
}

#[async_trait]
impl ItemStore for InMemory {
    async fn create(&self, item: PlacedItem) -> Result<PlacedItem> {
        let mut state = self.state.write().await;
        state.check_insert(&item)?;
        state.insert(item.clone());
        Ok(item)
    }

    async fn update(
        &self,
        id: &ItemId,
        patch: &ItemPatch,
        updated_at: Timestamp,
    ) -> Result<PlacedItem> {
        let mut state = self.state.write().await;
        let current = state
            .items
            .get(id)
            .ok_or(BackendError::ItemNotFound { id: *id })?;
        let merged = current.merged(patch, updated_at);

        if merged.depth != current.depth
            && let Some(holder) = state.by_depth.get(&merged.depth)
            && holder != id
        {
            return Err(BackendError::DepthConflict {
                depth: merged.depth,
            }
            .into());
        }

        state.remove(id);
        state.insert(merged.clone());
        Ok(merged)
    }

    async fn delete(&self, id: &ItemId) -> Result<()> {
        let mut state = self.state.write().await;
        state
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| BackendError::ItemNotFound { id: *id }.into())
    }

    async fn get(&self, id: &ItemId) -> Result<Option<PlacedItem>> {
        let state = self.state.read().await;
        Ok(state.items.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<PlacedItem>> {
        let state = self.state.read().await;
        Ok(state.items.values().cloned().collect())
    }

    async fn list_from(&self, threshold: i64) -> Result<Vec<PlacedItem>> {
        let state = self.state.read().await;
        Ok(state
            .by_depth
            .range(threshold..)
            .filter_map(|(_, id)| state.items.get(id).cloned())
            .collect())
    }

    async fn max_by_depth(&self) -> Result<Option<PlacedItem>> {
        let state = self.state.read().await;
        Ok(state
            .by_depth
            .last_key_value()
            .and_then(|(_, id)| state.items.get(id).cloned()))
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.state.read().await.items.len())
    }

    async fn commit(&self, batch: WriteBatch) -> Result<PlacedItem> {
        let mut state = self.state.write().await;
        if let Err(e) = state.check_batch(&batch) {
            tracing::warn!(error = %e, "Rejected write batch");
            return Err(e);
        }
        Ok(state.apply_batch(batch))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
