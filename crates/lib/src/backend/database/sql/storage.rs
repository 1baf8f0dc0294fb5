//! Item storage operations for SQL backends.

use sqlx::{Any, Executor};

use crate::Result;
use crate::backend::errors::BackendError;
use crate::backend::{ItemWrite, WriteBatch};
use crate::clock::Timestamp;
use crate::item::{ItemId, ItemPatch, PlacedItem, Position, Size};

use super::{SqlxBackend, SqlxResultExt};

/// Column tuple as selected by every item query.
type ItemRow = (String, String, i64, i64, i64, i64, i64, i64, i64);

fn parse_row_id(raw: &str) -> Result<ItemId> {
    raw.parse::<ItemId>().map_err(|_| {
        BackendError::SqlxError {
            reason: format!("Corrupt item id in row: {raw}"),
            source: None,
        }
        .into()
    })
}

fn row_to_item(row: ItemRow) -> Result<PlacedItem> {
    let (id, name, x, y, depth, width, height, created_at, updated_at) = row;
    Ok(PlacedItem {
        id: parse_row_id(&id)?,
        name,
        position: Position { x, y },
        depth,
        size: Size { width, height },
        created_at,
        updated_at,
    })
}

fn rows_to_items(rows: Vec<ItemRow>) -> Result<Vec<PlacedItem>> {
    rows.into_iter().map(row_to_item).collect()
}

async fn find<'e, E>(executor: E, id: &ItemId) -> Result<Option<PlacedItem>>
where
    E: Executor<'e, Database = Any>,
{
    let row: Option<ItemRow> = sqlx::query_as(
        "SELECT id, name, position_x, position_y, depth, width, height, created_at, updated_at
         FROM items WHERE id = $1",
    )
    .bind(id.to_string())
    .fetch_optional(executor)
    .await
    .sql_context("Failed to get item")?;

    row.map(row_to_item).transpose()
}

async fn holder_of<'e, E>(executor: E, depth: i64) -> Result<Option<ItemId>>
where
    E: Executor<'e, Database = Any>,
{
    let row: Option<(String,)> = sqlx::query_as("SELECT id FROM items WHERE depth = $1")
        .bind(depth)
        .fetch_optional(executor)
        .await
        .sql_context("Failed to look up depth")?;

    row.map(|(id,)| parse_row_id(&id)).transpose()
}

async fn insert_row<'e, E>(executor: E, item: &PlacedItem) -> Result<()>
where
    E: Executor<'e, Database = Any>,
{
    sqlx::query(
        "INSERT INTO items
            (id, name, position_x, position_y, depth, width, height, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
    )
    .bind(item.id.to_string())
    .bind(item.name.clone())
    .bind(item.position.x)
    .bind(item.position.y)
    .bind(item.depth)
    .bind(item.size.width)
    .bind(item.size.height)
    .bind(item.created_at)
    .bind(item.updated_at)
    .execute(executor)
    .await
    .sql_context("Failed to insert item")?;
    Ok(())
}

/// Insert a new row, rejecting a taken id or depth.
pub async fn create(backend: &SqlxBackend, item: PlacedItem) -> Result<PlacedItem> {
    let mut tx = backend
        .pool()
        .begin()
        .await
        .sql_context("Failed to begin transaction")?;

    if find(&mut *tx, &item.id).await?.is_some() {
        return Err(BackendError::DuplicateItem { id: item.id }.into());
    }
    if holder_of(&mut *tx, item.depth).await?.is_some() {
        return Err(BackendError::DepthConflict { depth: item.depth }.into());
    }
    insert_row(&mut *tx, &item).await?;

    tx.commit().await.sql_context("Failed to commit create")?;
    Ok(item)
}

/// Merge `patch` into the stored row.
pub async fn update(
    backend: &SqlxBackend,
    id: &ItemId,
    patch: &ItemPatch,
    updated_at: Timestamp,
) -> Result<PlacedItem> {
    let mut tx = backend
        .pool()
        .begin()
        .await
        .sql_context("Failed to begin transaction")?;

    let current = find(&mut *tx, id)
        .await?
        .ok_or(BackendError::ItemNotFound { id: *id })?;
    let merged = current.merged(patch, updated_at);

    if merged.depth != current.depth
        && let Some(holder) = holder_of(&mut *tx, merged.depth).await?
        && holder != *id
    {
        return Err(BackendError::DepthConflict {
            depth: merged.depth,
        }
        .into());
    }

    sqlx::query(
        "UPDATE items
         SET name = $1, position_x = $2, position_y = $3, depth = $4,
             width = $5, height = $6, updated_at = $7
         WHERE id = $8",
    )
    .bind(merged.name.clone())
    .bind(merged.position.x)
    .bind(merged.position.y)
    .bind(merged.depth)
    .bind(merged.size.width)
    .bind(merged.size.height)
    .bind(merged.updated_at)
    .bind(id.to_string())
    .execute(&mut *tx)
    .await
    .sql_context("Failed to update item")?;

    tx.commit().await.sql_context("Failed to commit update")?;
    Ok(merged)
}

/// Delete a row by id.
pub async fn delete(backend: &SqlxBackend, id: &ItemId) -> Result<()> {
    let result = sqlx::query("DELETE FROM items WHERE id = $1")
        .bind(id.to_string())
        .execute(backend.pool())
        .await
        .sql_context("Failed to delete item")?;

    if result.rows_affected() == 0 {
        return Err(BackendError::ItemNotFound { id: *id }.into());
    }
    Ok(())
}

/// Point lookup.
pub async fn get(backend: &SqlxBackend, id: &ItemId) -> Result<Option<PlacedItem>> {
    find(backend.pool(), id).await
}

/// All rows.
pub async fn list(backend: &SqlxBackend) -> Result<Vec<PlacedItem>> {
    let rows: Vec<ItemRow> = sqlx::query_as(
        "SELECT id, name, position_x, position_y, depth, width, height, created_at, updated_at
         FROM items",
    )
    .fetch_all(backend.pool())
    .await
    .sql_context("Failed to list items")?;

    rows_to_items(rows)
}

/// Rows with `depth >= threshold`, ascending.
pub async fn list_from(backend: &SqlxBackend, threshold: i64) -> Result<Vec<PlacedItem>> {
    let rows: Vec<ItemRow> = sqlx::query_as(
        "SELECT id, name, position_x, position_y, depth, width, height, created_at, updated_at
         FROM items WHERE depth >= $1 ORDER BY depth ASC",
    )
    .bind(threshold)
    .fetch_all(backend.pool())
    .await
    .sql_context("Failed to list items by depth")?;

    rows_to_items(rows)
}

/// Row with the greatest depth.
pub async fn max_by_depth(backend: &SqlxBackend) -> Result<Option<PlacedItem>> {
    let row: Option<ItemRow> = sqlx::query_as(
        "SELECT id, name, position_x, position_y, depth, width, height, created_at, updated_at
         FROM items ORDER BY depth DESC LIMIT 1",
    )
    .fetch_optional(backend.pool())
    .await
    .sql_context("Failed to find max depth")?;

    row.map(row_to_item).transpose()
}

/// Number of rows.
pub async fn count(backend: &SqlxBackend) -> Result<usize> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM items")
        .fetch_one(backend.pool())
        .await
        .sql_context("Failed to count items")?;
    Ok(count.max(0) as usize)
}

/// Apply a cascade batch in a single transaction.
///
/// The triggering row is removed first (on replace), shifts are applied from
/// the highest depth down, then the row is written at its target depth. At no
/// point do two rows share a depth, so the unique index never fires for a
/// well-formed batch. Any error drops the transaction, rolling back every step.
pub async fn commit(backend: &SqlxBackend, batch: WriteBatch) -> Result<PlacedItem> {
    let mut tx = backend
        .pool()
        .begin()
        .await
        .sql_context("Failed to begin transaction")?;

    let target = batch.write.item();
    match &batch.write {
        ItemWrite::Insert(item) => {
            if find(&mut *tx, &item.id).await?.is_some() {
                return Err(BackendError::DuplicateItem { id: item.id }.into());
            }
        }
        ItemWrite::Replace(item) => {
            if find(&mut *tx, &item.id).await?.is_none() {
                return Err(BackendError::ItemNotFound { id: item.id }.into());
            }
            sqlx::query("DELETE FROM items WHERE id = $1")
                .bind(item.id.to_string())
                .execute(&mut *tx)
                .await
                .sql_context("Failed to detach item for replace")?;
        }
    }

    for shift in &batch.shifts {
        let found = find(&mut *tx, &shift.id).await?.map(|item| item.depth);
        if shift.id == target.id || found != Some(shift.from) {
            tracing::warn!(id = %shift.id, expected = shift.from, ?found, "Rejected stale batch");
            return Err(BackendError::StaleBatch {
                id: shift.id,
                expected: shift.from,
                found,
            }
            .into());
        }
    }

    for shift in batch.shifts.iter().rev() {
        if holder_of(&mut *tx, shift.to).await?.is_some() {
            return Err(BackendError::DepthConflict { depth: shift.to }.into());
        }
        sqlx::query("UPDATE items SET depth = $1 WHERE id = $2")
            .bind(shift.to)
            .bind(shift.id.to_string())
            .execute(&mut *tx)
            .await
            .sql_context("Failed to shift item depth")?;
    }

    if holder_of(&mut *tx, target.depth).await?.is_some() {
        return Err(BackendError::DepthConflict {
            depth: target.depth,
        }
        .into());
    }
    insert_row(&mut *tx, target).await?;

    tx.commit().await.sql_context("Failed to commit batch")?;
    Ok(batch.write.into_item())
}
