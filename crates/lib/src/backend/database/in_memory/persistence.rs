//! JSON snapshots for the in-memory store.
//!
//! The file holds a format version and the flat list of items; the depth
//! index is rebuilt on load, which also re-checks depth uniqueness so a
//! hand-edited file cannot smuggle in a collision.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::{InMemory, MemoryState};
use crate::{Error, Result, backend::errors::BackendError, item::PlacedItem};

/// The current persistence file format version.
const PERSISTENCE_VERSION: u8 = 1;

#[derive(Serialize, Deserialize)]
struct Snapshot {
    #[serde(rename = "_v")]
    version: u8,
    items: Vec<PlacedItem>,
}

/// Write every stored item to `path`, ordered by depth for readable diffs.
pub(crate) async fn save_to_file<P: AsRef<Path>>(store: &InMemory, path: P) -> Result<()> {
    let items: Vec<PlacedItem> = {
        let state = store.state.read().await;
        state
            .by_depth
            .values()
            .filter_map(|id| state.items.get(id).cloned())
            .collect()
    };
    let count = items.len();

    let snapshot = Snapshot {
        version: PERSISTENCE_VERSION,
        items,
    };
    let json = serde_json::to_string_pretty(&snapshot)
        .map_err(|e| -> Error { BackendError::SerializationFailed { source: e }.into() })?;
    tokio::fs::write(path.as_ref(), json)
        .await
        .map_err(|e| -> Error { BackendError::FileIo { source: e }.into() })?;

    tracing::info!(count, path = %path.as_ref().display(), "Saved in-memory store");
    Ok(())
}

/// Load a snapshot from `path`; a missing file yields an empty store.
pub(crate) async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<InMemory> {
    let json = match tokio::fs::read_to_string(path.as_ref()).await {
        Ok(json) => json,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(InMemory::new()),
        Err(e) => return Err(BackendError::FileIo { source: e }.into()),
    };

    let snapshot: Snapshot = serde_json::from_str(&json)
        .map_err(|e| -> Error { BackendError::DeserializationFailed { source: e }.into() })?;
    if snapshot.version != PERSISTENCE_VERSION {
        return Err(BackendError::UnsupportedVersion {
            found: snapshot.version,
            expected: PERSISTENCE_VERSION,
        }
        .into());
    }

    let state = MemoryState::from_items(snapshot.items)?;
    Ok(InMemory {
        state: RwLock::new(state),
    })
}
