//! CLI argument definitions for the Stratum binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Storage backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// SQLite database (default, production-ready)
    Sqlite,
    /// PostgreSQL database (for shared deployments)
    Postgres,
    /// In-memory with JSON persistence (for development and ephemeral deployments)
    Inmemory,
}

/// Stratum placed-item server
#[derive(Parser, Debug)]
#[command(name = "stratum")]
#[command(about = "Stratum: depth-ordered placed items - HTTP server and client")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the Stratum server
    Serve(ServeArgs),
    /// Check health of a running Stratum server
    Health(HealthArgs),
    /// List items from a running Stratum server
    List(ListArgs),
}

/// Arguments for the serve command
#[derive(clap::Args, Debug)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(short, long, default_value_t = 3000, env = "STRATUM_PORT")]
    pub port: u16,

    /// Bind address
    #[arg(long, default_value = "0.0.0.0", env = "STRATUM_HOST")]
    pub host: String,

    /// Storage backend to use
    #[arg(short, long, default_value = "sqlite", env = "STRATUM_BACKEND")]
    pub backend: Backend,

    /// Data directory for storage files.
    /// For SQLite: stores stratum.db
    /// For InMemory: stores stratum.json
    #[arg(short = 'D', long, env = "STRATUM_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// PostgreSQL connection URL (required when backend=postgres)
    #[arg(long, env = "STRATUM_POSTGRES_URL")]
    pub postgres_url: Option<String>,
}

/// Arguments for the health command
#[derive(clap::Args, Debug)]
pub struct HealthArgs {
    /// Base URL of the server to check
    #[arg(short, long, default_value = "http://127.0.0.1:3000", env = "STRATUM_URL")]
    pub url: String,

    /// Timeout in seconds
    #[arg(short, long, default_value_t = 5)]
    pub timeout: u64,
}

/// Arguments for the list command
#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Base URL of the server to query
    #[arg(short, long, default_value = "http://127.0.0.1:3000", env = "STRATUM_URL")]
    pub url: String,

    /// Maximum number of items (0 = server default, capped at 500)
    #[arg(short, long)]
    pub limit: Option<u64>,

    /// Only items whose x offset lies within [0, MAX_X]
    #[arg(long)]
    pub max_x: Option<i64>,

    /// Only items whose y offset lies within [0, MAX_Y]
    #[arg(long)]
    pub max_y: Option<i64>,

    /// Only items with exactly this width
    #[arg(long)]
    pub width: Option<i64>,

    /// Only items with exactly this height
    #[arg(long)]
    pub height: Option<i64>,

    /// Print the raw JSON response instead of a table
    #[arg(long)]
    pub json: bool,

    /// Timeout in seconds
    #[arg(short, long, default_value_t = 5)]
    pub timeout: u64,
}
