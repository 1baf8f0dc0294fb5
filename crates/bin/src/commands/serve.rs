//! Serve command - runs the Stratum HTTP server.

use std::path::Path;

use stratum::{Engine, backend::database::InMemory};
use tokio::signal::unix::{SignalKind, signal};

use crate::api;
use crate::backend::{create_store, data_dir, snapshot_path};
use crate::cli::ServeArgs;

/// Run the Stratum server
pub async fn run(args: &ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    // Create the storage backend
    let store = create_store(args).await?;
    let engine = Engine::open(store);
    let item_count = engine.count().await?;
    tracing::info!(items = item_count, backend = ?args.backend, "Engine ready");

    // Bind server
    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;

    // Print startup message
    println!("Stratum server listening on http://{local_addr}");
    println!();
    println!("Available endpoints:");
    println!("  GET    /health          - Health check");
    println!("  POST   /api/items       - Create an item");
    println!("  GET    /api/items       - List items (limit, maxX, maxY, width, height)");
    println!("  GET    /api/items/{{id}}  - Fetch an item");
    println!("  PATCH  /api/items/{{id}}  - Update an item");
    println!("  DELETE /api/items/{{id}}  - Delete an item");
    println!();
    println!("Press Ctrl+C to shutdown");

    serve_until(listener, engine, &snapshot_path(&data_dir(args)), shutdown_signal()).await?;

    println!("Server shut down");
    Ok(())
}

/// Serve `engine` until `shutdown` resolves and in-flight requests drain, then
/// write the in-memory snapshot if the engine runs on [`InMemory`].
async fn serve_until(
    listener: tokio::net::TcpListener,
    engine: Engine,
    snapshot: &Path,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    axum::serve(listener, api::router(engine.clone()))
        .with_graceful_shutdown(shutdown)
        .await?;

    if let Some(in_memory) = engine.store().as_any().downcast_ref::<InMemory>() {
        match in_memory.save_to_file(snapshot).await {
            Ok(()) => {
                tracing::info!("Items saved to {}", snapshot.display());
                println!("\nItems saved successfully");
            }
            Err(e) => {
                tracing::error!("Failed to save items: {e:?}");
                eprintln!("Failed to save items: {e:?}");
            }
        }
    }
    Ok(())
}

/// Resolve on SIGTERM or SIGINT.
async fn shutdown_signal() {
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(e) => {
            tracing::warn!("Failed to set up SIGTERM handler: {e}");
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Received SIGINT, initiating graceful shutdown...");
            return;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => tracing::info!("Received SIGTERM, initiating graceful shutdown..."),
        _ = tokio::signal::ctrl_c() => tracing::info!("Received SIGINT, initiating graceful shutdown..."),
    }
}
