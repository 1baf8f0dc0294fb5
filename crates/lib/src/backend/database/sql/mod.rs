//! SQL-based store implementations.
//!
//! This module provides SQL stores implementing [`ItemStore`], keeping items
//! in a relational table whose `depth` column carries a UNIQUE index, so the
//! database itself refuses any write that would break depth uniqueness.
//!
//! ## Available Backends
//!
//! - **SQLite** (feature: `sqlite`): Embedded database
//! - **PostgreSQL** (feature: `postgres`): PostgreSQL database
//!
//! ## Architecture
//!
//! The SQL store uses sqlx with `AnyPool` for multi-database support. A
//! cascade commit runs inside one transaction, see [`storage::commit`].
//!
//! ## Schema
//!
//! The schema is defined in the [`schema`] module and initialized when
//! connecting.

mod storage;

/// Schema definition and version check.
pub mod schema;

use std::any::Any;
#[cfg(feature = "postgres")]
use std::time::Duration;

use async_trait::async_trait;
use sqlx::AnyPool;
#[cfg(feature = "postgres")]
use sqlx::{Connection, Executor};
use sqlx::any::AnyPoolOptions;

use crate::Result;
use crate::backend::errors::BackendError;
use crate::backend::{ItemStore, WriteBatch};
use crate::clock::Timestamp;
use crate::item::{ItemId, ItemPatch, PlacedItem};

/// Extension trait for sqlx Result types to simplify error handling.
///
/// Converts sqlx errors to `BackendError::SqlxError` with a context message.
pub(crate) trait SqlxResultExt<T> {
    /// Convert sqlx error to BackendError with context message.
    fn sql_context(self, context: &str) -> Result<T>;
}

impl<T> SqlxResultExt<T> for std::result::Result<T, sqlx::Error> {
    fn sql_context(self, context: &str) -> Result<T> {
        self.map_err(|e| {
            BackendError::SqlxError {
                reason: format!("{context}: {e}"),
                source: Some(e),
            }
            .into()
        })
    }
}

/// Database backend kind for SQL dialect selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbKind {
    /// SQLite database
    Sqlite,
    /// PostgreSQL database
    Postgres,
}

/// SQL store implementing [`ItemStore`] using sqlx.
///
/// Supports both SQLite and PostgreSQL through sqlx's `AnyPool`, which
/// handles connection pooling and thread safety.
///
/// # Test Isolation
///
/// For PostgreSQL, each store can use its own schema so parallel tests do not
/// see each other's rows. Use [`SqlxBackend::connect_postgres_isolated`].
pub struct SqlxBackend {
    pool: AnyPool,
    kind: DbKind,
}

impl SqlxBackend {
    /// Get a reference to the underlying pool.
    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// Get the database kind.
    pub fn kind(&self) -> DbKind {
        self.kind
    }

    /// Check if this backend is using SQLite.
    pub fn is_sqlite(&self) -> bool {
        self.kind == DbKind::Sqlite
    }

    /// Check if this backend is using PostgreSQL.
    pub fn is_postgres(&self) -> bool {
        self.kind == DbKind::Postgres
    }

    /// Wrap a connected pool, bringing its schema up to date.
    async fn initialized(pool: AnyPool, kind: DbKind) -> Result<Self> {
        let backend = Self { pool, kind };
        schema::initialize(&backend).await?;
        tracing::info!(?kind, "Opened SQL item store");
        Ok(backend)
    }
}

/// Pool size for both dialects outside test isolation.
const POOL_SIZE: u32 = 5;

#[cfg(feature = "sqlite")]
const SQLITE_FILE_PRAGMAS: &str = "PRAGMA journal_mode = WAL;
     PRAGMA synchronous = NORMAL;
     PRAGMA busy_timeout = 5000;";

#[cfg(feature = "sqlite")]
const SQLITE_MEMORY_PRAGMAS: &str = "PRAGMA busy_timeout = 5000;";

#[cfg(feature = "sqlite")]
impl SqlxBackend {
    /// Open (or create) a SQLite database file.
    pub async fn open_sqlite<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        Self::connect_sqlite(&format!("sqlite:{}?mode=rwc", path.as_ref().display())).await
    }

    /// Connect to SQLite with a `sqlite:` URL, e.g. `sqlite:./stratum.db`.
    pub async fn connect_sqlite(url: &str) -> Result<Self> {
        sqlx::any::install_default_drivers();

        let in_memory = url.contains("mode=memory");
        let mut options = AnyPoolOptions::new().max_connections(POOL_SIZE);
        if in_memory {
            // The shared-cache database lives only while a connection is open
            options = options
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }
        let pool = options
            .connect(url)
            .await
            .sql_context("Failed to connect to SQLite")?;

        let pragmas = if in_memory {
            SQLITE_MEMORY_PRAGMAS
        } else {
            SQLITE_FILE_PRAGMAS
        };
        sqlx::query(pragmas)
            .execute(&pool)
            .await
            .sql_context("Failed to configure SQLite")?;

        Self::initialized(pool, DbKind::Sqlite).await
    }

    /// A fresh private in-memory database per call.
    pub async fn sqlite_in_memory() -> Result<Self> {
        let name = uuid::Uuid::new_v4().simple();
        Self::connect_sqlite(&format!("sqlite:file:stratum_{name}?mode=memory&cache=shared")).await
    }
}

#[cfg(feature = "postgres")]
impl SqlxBackend {
    /// Connect to PostgreSQL using the default (public) schema.
    pub async fn connect_postgres(url: &str) -> Result<Self> {
        Self::connect_postgres_in(url, None).await
    }

    /// Connect to PostgreSQL inside a new, uniquely named schema.
    ///
    /// Every pooled connection has its `search_path` pinned to that schema,
    /// so parallel test stores never see each other's rows.
    pub async fn connect_postgres_isolated(url: &str) -> Result<Self> {
        let schema = format!("stratum_test_{}", uuid::Uuid::new_v4().simple());
        Self::connect_postgres_in(url, Some(schema)).await
    }

    async fn connect_postgres_in(url: &str, schema: Option<String>) -> Result<Self> {
        sqlx::any::install_default_drivers();

        let options = match schema {
            None => AnyPoolOptions::new().max_connections(POOL_SIZE),
            Some(schema) => {
                create_postgres_schema(url, &schema).await?;
                AnyPoolOptions::new()
                    .max_connections(2)
                    .acquire_timeout(Duration::from_secs(30))
                    .after_connect(move |conn, _meta| {
                        let set_path = format!("SET search_path TO {schema}");
                        Box::pin(async move {
                            conn.execute(set_path.as_str()).await?;
                            Ok(())
                        })
                    })
            }
        };
        let pool = options
            .connect(url)
            .await
            .sql_context("Failed to connect to PostgreSQL")?;

        Self::initialized(pool, DbKind::Postgres).await
    }
}

#[cfg(feature = "postgres")]
async fn create_postgres_schema(url: &str, schema: &str) -> Result<()> {
    let mut conn = sqlx::AnyConnection::connect(url)
        .await
        .sql_context("Failed to connect to PostgreSQL")?;
    conn.execute(format!("CREATE SCHEMA IF NOT EXISTS {schema}").as_str())
        .await
        .sql_context(&format!("Failed to create schema {schema}"))?;
    conn.close()
        .await
        .sql_context("Failed to close schema setup connection")
}

#[async_trait]
impl ItemStore for SqlxBackend {
    async fn create(&self, item: PlacedItem) -> Result<PlacedItem> {
        storage::create(self, item).await
    }

    async fn update(
        &self,
        id: &ItemId,
        patch: &ItemPatch,
        updated_at: Timestamp,
    ) -> Result<PlacedItem> {
        storage::update(self, id, patch, updated_at).await
    }

    async fn delete(&self, id: &ItemId) -> Result<()> {
        storage::delete(self, id).await
    }

    async fn get(&self, id: &ItemId) -> Result<Option<PlacedItem>> {
        storage::get(self, id).await
    }

    async fn list(&self) -> Result<Vec<PlacedItem>> {
        storage::list(self).await
    }

    async fn list_from(&self, threshold: i64) -> Result<Vec<PlacedItem>> {
        storage::list_from(self, threshold).await
    }

    async fn max_by_depth(&self) -> Result<Option<PlacedItem>> {
        storage::max_by_depth(self).await
    }

    async fn count(&self) -> Result<usize> {
        storage::count(self).await
    }

    async fn commit(&self, batch: WriteBatch) -> Result<PlacedItem> {
        storage::commit(self, batch).await
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(feature = "sqlite")]
/// Convenience type alias for SQLite backend using sqlx.
pub type Sqlite = SqlxBackend;

#[cfg(feature = "postgres")]
/// Convenience type alias for PostgreSQL backend using sqlx.
pub type Postgres = SqlxBackend;
