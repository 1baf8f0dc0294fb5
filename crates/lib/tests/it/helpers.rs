use std::collections::HashSet;

use stratum::{
    Engine, PlacedItem,
    backend::{ItemStore, database::InMemory},
    filter::ListQuery,
    item::{ItemId, NewItem, Position, Size},
};

/// Creates a test store based on TEST_BACKEND env var.
///
/// Supported values:
/// - "inmemory" or unset: InMemory store (default)
/// - "sqlite": SQLite in-memory store (requires `sqlite` feature)
/// - "postgres": PostgreSQL store (requires `postgres` feature and TEST_POSTGRES_URL)
///
/// # Example
/// ```bash
/// # Run tests with InMemory (default)
/// cargo test
///
/// # Run tests with SQLite
/// TEST_BACKEND=sqlite cargo test --features sqlite
///
/// # Run tests with PostgreSQL
/// TEST_BACKEND=postgres TEST_POSTGRES_URL="postgres://localhost/stratum_test" \
///   cargo test --features postgres
/// ```
pub async fn test_backend() -> Box<dyn ItemStore> {
    match std::env::var("TEST_BACKEND").as_deref() {
        Ok("sqlite") => {
            #[cfg(feature = "sqlite")]
            {
                use stratum::backend::database::Sqlite;
                Box::new(
                    Sqlite::sqlite_in_memory()
                        .await
                        .expect("Failed to create SQLite store"),
                )
            }
            #[cfg(not(feature = "sqlite"))]
            {
                panic!("TEST_BACKEND=sqlite requires the 'sqlite' feature to be enabled")
            }
        }
        Ok("postgres") => {
            #[cfg(feature = "postgres")]
            {
                use stratum::backend::database::Postgres;
                let url = std::env::var("TEST_POSTGRES_URL")
                    .unwrap_or_else(|_| "postgres://localhost/stratum_test".to_string());
                Box::new(
                    Postgres::connect_postgres_isolated(&url)
                        .await
                        .expect("Failed to connect to PostgreSQL"),
                )
            }
            #[cfg(not(feature = "postgres"))]
            {
                panic!("TEST_BACKEND=postgres requires the 'postgres' feature to be enabled")
            }
        }
        Ok("inmemory") | Ok("") | Err(_) => Box::new(InMemory::new()),
        Ok(other) => {
            panic!("Unknown TEST_BACKEND value: {other}. Supported: inmemory, sqlite, postgres")
        }
    }
}

/// Engine over a fresh [`test_backend`].
pub async fn test_engine() -> Engine {
    Engine::open(test_backend().await)
}

/// A valid create input named `name` at `(x, y)` with a 100x100 size.
pub fn new_item(name: &str, x: i64, y: i64) -> NewItem {
    NewItem::new(
        name,
        Position { x, y },
        Size {
            width: 100,
            height: 100,
        },
    )
    .expect("valid test item")
}

/// A fully materialized item, for exercising stores directly.
pub fn placed(name: &str, depth: i64) -> PlacedItem {
    PlacedItem::from_new(ItemId::generate(), new_item(name, 0, 0), depth, 1_000)
}

/// Create one item per depth, returning them in the given order.
pub async fn create_at_depths(engine: &Engine, depths: &[i64]) -> Vec<PlacedItem> {
    let mut items = Vec::with_capacity(depths.len());
    for &depth in depths {
        let item = engine
            .create(new_item(&format!("d{depth}"), 0, 0).with_depth(depth))
            .await
            .expect("Failed to create item");
        items.push(item);
    }
    items
}

/// Current depth of `id`.
pub async fn depth_of(engine: &Engine, id: &ItemId) -> i64 {
    engine.get(id).await.expect("Failed to get item").depth
}

/// Every item, ascending by depth, asserting depth uniqueness on the way.
pub async fn assert_unique_depths(engine: &Engine) -> Vec<i64> {
    let items = engine
        .list(ListQuery::new().with_limit(500))
        .await
        .expect("Failed to list items");
    let depths: Vec<i64> = items.iter().map(|i| i.depth).collect();
    let unique: HashSet<i64> = depths.iter().copied().collect();
    assert_eq!(unique.len(), depths.len(), "duplicate depths in {depths:?}");
    depths
}
