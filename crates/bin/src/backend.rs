//! Store creation and utility functions.

use std::path::{Path, PathBuf};

use stratum::backend::{
    ItemStore,
    database::{InMemory, Postgres, Sqlite},
};

use crate::cli::{Backend, ServeArgs};

/// SQLite database file inside the data directory.
pub const SQLITE_FILE: &str = "stratum.db";

/// JSON snapshot file inside the data directory.
pub const SNAPSHOT_FILE: &str = "stratum.json";

/// Resolve the data directory, defaulting to the working directory.
pub fn data_dir(args: &ServeArgs) -> PathBuf {
    args.data_dir.clone().unwrap_or_else(|| PathBuf::from("."))
}

/// Path of the in-memory snapshot for `data_dir`.
pub fn snapshot_path(data_dir: &Path) -> PathBuf {
    data_dir.join(SNAPSHOT_FILE)
}

/// Redact credentials from a PostgreSQL connection URL for safe logging
pub fn redact_postgres_url(url: &str) -> String {
    if let Ok(parsed) = url::Url::parse(url) {
        let mut redacted = parsed.clone();
        if !parsed.username().is_empty() {
            let _ = redacted.set_username("***");
        }
        if parsed.password().is_some() {
            let _ = redacted.set_password(Some("***"));
        }
        redacted.to_string()
    } else {
        "postgres://***@<unparsable-url>".to_string()
    }
}

/// Create the item store selected by the serve arguments.
pub async fn create_store(
    args: &ServeArgs,
) -> Result<Box<dyn ItemStore>, Box<dyn std::error::Error>> {
    let data_dir = data_dir(args);

    // Ensure data directory exists
    tokio::fs::create_dir_all(&data_dir).await?;

    match args.backend {
        Backend::Sqlite => {
            let db_path = data_dir.join(SQLITE_FILE);
            tracing::info!("Using SQLite store at {}", db_path.display());
            Ok(Box::new(Sqlite::open_sqlite(&db_path).await?))
        }
        Backend::Postgres => {
            let url = args
                .postgres_url
                .as_ref()
                .ok_or("PostgreSQL backend requires --postgres-url or STRATUM_POSTGRES_URL")?;

            let display_url = redact_postgres_url(url);
            tracing::info!("Connecting to PostgreSQL store at {}", display_url);

            match Postgres::connect_postgres(url).await {
                Ok(store) => {
                    tracing::info!("Connected to PostgreSQL successfully");
                    Ok(Box::new(store))
                }
                Err(e) => {
                    Err(format!("Failed to connect to PostgreSQL at {}: {}", display_url, e).into())
                }
            }
        }
        Backend::Inmemory => {
            let json_path = snapshot_path(&data_dir);
            tracing::info!(
                "Using in-memory store with persistence at {}",
                json_path.display()
            );
            // A missing file loads as an empty store; a corrupt one is an error
            // rather than being silently replaced on the next save.
            let store = InMemory::load_from_file(&json_path).await?;
            tracing::info!(items = store.count().await?, "Loaded in-memory store");
            Ok(Box::new(store))
        }
    }
}
