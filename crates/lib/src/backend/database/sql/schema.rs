//! SQL schema definitions.
//!
//! The schema is portable between SQLite and PostgreSQL. Its version is
//! recorded in `schema_version`, and a database stamped with any other version
//! is refused.

use crate::Result;
use crate::backend::errors::BackendError;

use super::{SqlxBackend, SqlxResultExt};

/// Current schema version.
pub const SCHEMA_VERSION: i64 = 1;

/// SQL statements to create the schema tables.
pub const CREATE_TABLES: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS schema_version (
        version BIGINT PRIMARY KEY
    )",
    // One row per placed item; timestamps are epoch milliseconds
    "CREATE TABLE IF NOT EXISTS items (
        id TEXT PRIMARY KEY NOT NULL,
        name TEXT NOT NULL,
        position_x BIGINT NOT NULL,
        position_y BIGINT NOT NULL,
        depth BIGINT NOT NULL,
        width BIGINT NOT NULL,
        height BIGINT NOT NULL,
        created_at BIGINT NOT NULL,
        updated_at BIGINT NOT NULL
    )",
];

/// SQL statements to create indexes.
pub const CREATE_INDEXES: &[&str] = &[
    // Depth uniqueness, and ordered scans for list_from / max_by_depth
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_items_depth ON items(depth)",
];

/// Initialize the database schema.
///
/// Creates tables and indexes if they don't exist. Fails if the stored schema
/// version differs from [`SCHEMA_VERSION`].
pub async fn initialize(backend: &SqlxBackend) -> Result<()> {
    let pool = backend.pool();

    for statement in CREATE_TABLES {
        sqlx::query(statement)
            .execute(pool)
            .await
            .sql_context(&format!("Schema creation failed for `{statement}`"))?;
    }

    let row: Option<(i64,)> = sqlx::query_as("SELECT version FROM schema_version")
        .fetch_optional(pool)
        .await
        .sql_context("Failed to check schema version")?;

    match row {
        None => {
            sqlx::query("INSERT INTO schema_version (version) VALUES ($1)")
                .bind(SCHEMA_VERSION)
                .execute(pool)
                .await
                .sql_context("Failed to record schema version")?;
        }
        Some((SCHEMA_VERSION,)) => {}
        Some((stored,)) => {
            return Err(BackendError::SqlxError {
                reason: format!(
                    "Unsupported schema version {stored}, expected {SCHEMA_VERSION}"
                ),
                source: None,
            }
            .into());
        }
    }

    for statement in CREATE_INDEXES {
        sqlx::query(statement)
            .execute(pool)
            .await
            .sql_context(&format!("Index creation failed for `{statement}`"))?;
    }

    Ok(())
}
