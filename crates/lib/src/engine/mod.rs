//! The public entry point for reading and writing placed items.
//!
//! An [`Engine`] owns a store, a clock and a [`DepthGuard`]. Every write takes
//! the guard exclusively, plans its depth cascade against the store and commits
//! the resulting [`WriteBatch`](crate::backend::WriteBatch) before letting go,
//! so no other operation ever sees two items on the same depth. Reads share the
//! guard for fetch, filter and sort.
//!
//! Engines are cheap to clone; clones share the same store and guard. Separate
//! engines opened on separate stores do not interfere with each other.
//!
//! # Example
//!
//! ```
//! # #[tokio::main]
//! # async fn main() -> stratum::Result<()> {
//! use stratum::{Engine, backend::database::InMemory, filter::ListQuery};
//! use stratum::item::CreateItemRequest;
//!
//! let engine = Engine::open(Box::new(InMemory::new()));
//! let first = engine
//!     .create_item(CreateItemRequest {
//!         name: Some("first".into()),
//!         position_x: Some(0),
//!         position_y: Some(0),
//!         width: Some(10),
//!         height: Some(10),
//!         ..Default::default()
//!     })
//!     .await?;
//! assert_eq!(first.depth, 0);
//!
//! let listed = engine.list(ListQuery::new()).await?;
//! assert_eq!(listed, vec![first]);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use crate::Result;
use crate::backend::{BackendError, ItemStore, ItemWrite, WriteBatch};
use crate::clock::{Clock, SystemClock};
use crate::filter::{ListParams, ListQuery};
use crate::item::{CreateItemRequest, ItemId, ItemPatch, NewItem, PlacedItem, UpdateItemRequest};
use crate::ordering;

mod guard;

pub use guard::DepthGuard;

struct EngineInner {
    store: Box<dyn ItemStore>,
    clock: Arc<dyn Clock>,
    guard: DepthGuard,
}

/// Handle to a depth-ordered item collection.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("clock", &self.inner.clock)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Open an engine over `store`, stamping items with the system clock.
    pub fn open(store: Box<dyn ItemStore>) -> Self {
        Self::open_with_clock(store, Arc::new(SystemClock))
    }

    /// Open an engine with a custom clock.
    pub fn open_with_clock(store: Box<dyn ItemStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                store,
                clock,
                guard: DepthGuard::new(),
            }),
        }
    }

    /// The underlying store.
    ///
    /// Writing through the store directly bypasses the guard and the cascade.
    pub fn store(&self) -> &dyn ItemStore {
        self.inner.store.as_ref()
    }

    /// The clock used for item timestamps.
    pub fn clock(&self) -> &dyn Clock {
        self.inner.clock.as_ref()
    }

    /// Validate a create request and store the item.
    pub async fn create_item(&self, request: CreateItemRequest) -> Result<PlacedItem> {
        let new = request.validate()?;
        self.create(new).await
    }

    /// Store a new item, cascading any item already on its depth.
    ///
    /// Without an explicit depth the item goes on top of the stack.
    #[tracing::instrument(skip(self, new), fields(name = %new.name))]
    pub async fn create(&self, new: NewItem) -> Result<PlacedItem> {
        new.validate()?;
        let store = self.store();
        let _write = self.inner.guard.write().await;

        let depth = match new.depth {
            Some(depth) => depth,
            None => {
                let max = store.max_by_depth().await?.map(|item| item.depth);
                ordering::next_depth(max)?
            }
        };

        let now = self.inner.clock.now_millis();
        let item = PlacedItem::from_new(ItemId::generate(), new, depth, now);
        let batch = ordering::stage(store, ItemWrite::Insert(item)).await?;
        let displaced = batch.displaced();
        let created = store.commit(batch).await?;

        tracing::info!(id = %created.id, depth = created.depth, displaced, "Created item");
        Ok(created)
    }

    /// Validate an update request and apply it.
    pub async fn update_item(&self, id: &ItemId, request: UpdateItemRequest) -> Result<PlacedItem> {
        let patch = request.validate()?;
        self.update(id, patch).await
    }

    /// Merge `patch` into the stored item and relocate it if its depth changed.
    ///
    /// A merged depth equal to the stored one is already held by this item
    /// alone, so no cascade is planned for it. `updated_at` advances either way.
    #[tracing::instrument(skip(self, patch))]
    pub async fn update(&self, id: &ItemId, patch: ItemPatch) -> Result<PlacedItem> {
        patch.validate()?;
        let store = self.store();
        let _write = self.inner.guard.write().await;

        let current = store
            .get(id)
            .await?
            .ok_or(BackendError::ItemNotFound { id: *id })?;
        let merged = current.merged(&patch, self.inner.clock.now_millis());

        let batch = if merged.depth == current.depth {
            WriteBatch::single(ItemWrite::Replace(merged))
        } else {
            ordering::stage(store, ItemWrite::Replace(merged)).await?
        };
        let displaced = batch.displaced();
        let updated = store.commit(batch).await?;

        tracing::info!(
            id = %updated.id,
            from = current.depth,
            to = updated.depth,
            displaced,
            "Updated item"
        );
        Ok(updated)
    }

    /// Remove an item. Never cascades.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: &ItemId) -> Result<()> {
        let _write = self.inner.guard.write().await;
        self.store().delete(id).await?;
        tracing::info!(%id, "Deleted item");
        Ok(())
    }

    /// Fetch a single item.
    pub async fn get(&self, id: &ItemId) -> Result<PlacedItem> {
        let _read = self.inner.guard.read().await;
        self.store()
            .get(id)
            .await?
            .ok_or_else(|| BackendError::ItemNotFound { id: *id }.into())
    }

    /// Parse raw query parameters and run the list query.
    pub async fn list_items(&self, params: &ListParams) -> Result<Vec<PlacedItem>> {
        let query = params.parse()?;
        self.list(query).await
    }

    /// Items matching `query`, ascending by depth, at most `query.effective_limit()`.
    #[tracing::instrument(skip(self), level = "debug")]
    pub async fn list(&self, query: ListQuery) -> Result<Vec<PlacedItem>> {
        let _read = self.inner.guard.read().await;
        let candidates = self.store().list().await?;
        Ok(query.apply(candidates))
    }

    /// Number of stored items.
    pub async fn count(&self) -> Result<usize> {
        let _read = self.inner.guard.read().await;
        self.store().count().await
    }
}
