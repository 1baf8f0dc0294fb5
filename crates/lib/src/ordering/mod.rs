//! Depth assignment and collision cascade planning.
//!
//! Every depth value written to a store is decided here. Placing an item at a
//! depth `d` that is already taken bumps the holder to `d + 1`; if that depth is
//! also taken its holder moves to `d + 2`, and so on. Only the unbroken run of
//! occupied depths starting exactly at `d` moves. The first gap absorbs the
//! shift, and everything above it stays where it is.
//!
//! ```text
//! depths {1, 2, 4}, insert at 2  ->  new=2, 2->3, 4 untouched
//! depths {1, 2, 3}, insert at 2  ->  new=2, 2->3, 3->4
//! ```
//!
//! Planning is pure: [`plan_cascade`] turns a sorted candidate list into the
//! list of [`DepthShift`]s, and [`stage`] wraps that into a [`WriteBatch`] the
//! store commits atomically.

use crate::Result;
use crate::backend::{DepthShift, ItemStore, ItemWrite, WriteBatch};
use crate::constants::EMPTY_STORE_DEPTH;
use crate::item::{ItemId, PlacedItem};

pub mod errors;

pub use errors::OrderingError;

/// Depth for an item created without an explicit one.
///
/// One above the current maximum, or [`EMPTY_STORE_DEPTH`] when the store holds
/// nothing.
pub fn next_depth(max_depth: Option<i64>) -> std::result::Result<i64, OrderingError> {
    match max_depth {
        None => Ok(EMPTY_STORE_DEPTH),
        Some(depth) => depth
            .checked_add(1)
            .ok_or(OrderingError::DepthOverflow { depth }),
    }
}

/// Compute the shifts needed to free `target` for the item `exclude`.
///
/// `candidates` must be sorted ascending by depth. Items below `target` and the
/// excluded item itself are ignored. The scan stops at the first candidate
/// that breaks the contiguous run, since the cursor only grows and a later
/// candidate can never match it again.
pub fn plan_cascade(
    candidates: &[PlacedItem],
    target: i64,
    exclude: Option<&ItemId>,
) -> std::result::Result<Vec<DepthShift>, OrderingError> {
    let mut shifts = Vec::new();
    let mut cursor = target;

    for item in candidates {
        if item.depth < target || Some(&item.id) == exclude {
            continue;
        }
        if item.depth != cursor {
            break;
        }
        let to = cursor
            .checked_add(1)
            .ok_or(OrderingError::DepthOverflow { depth: cursor })?;
        shifts.push(DepthShift {
            id: item.id,
            from: cursor,
            to,
        });
        cursor = to;
    }

    Ok(shifts)
}

/// Read the collision candidates for `write` and build the batch that places it.
///
/// For a replace, the item's own stored row is excluded from the candidates so
/// it never displaces itself.
pub async fn stage(store: &dyn ItemStore, write: ItemWrite) -> Result<WriteBatch> {
    let target = write.item();
    let exclude = match &write {
        ItemWrite::Insert(_) => None,
        ItemWrite::Replace(item) => Some(&item.id),
    };

    let candidates = store.list_from(target.depth).await?;
    let shifts = plan_cascade(&candidates, target.depth, exclude)?;

    tracing::debug!(
        id = %target.id,
        depth = target.depth,
        candidates = candidates.len(),
        displaced = shifts.len(),
        "Planned depth cascade"
    );

    Ok(WriteBatch { shifts, write })
}
