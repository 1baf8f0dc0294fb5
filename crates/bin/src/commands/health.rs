//! Health check command - checks a running Stratum server.

use std::time::Duration;

use crate::cli::HealthArgs;

/// Normalize a base URL (with or without `/health`) to the health endpoint.
fn health_url(base: &str) -> String {
    let base = base.trim_end_matches('/');
    if base.ends_with("/health") {
        base.to_string()
    } else {
        format!("{base}/health")
    }
}

/// Run the health check command
pub async fn run(args: &HealthArgs) -> Result<(), Box<dyn std::error::Error>> {
    let url = health_url(&args.url);
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(args.timeout))
        .build()?;

    match client.get(&url).send().await {
        Ok(response) if response.status().is_success() => {
            let body: serde_json::Value = response.json().await?;
            let status = body.get("status").and_then(|s| s.as_str()).unwrap_or("");
            if status == "healthy" {
                let items = body.get("items").and_then(|n| n.as_u64()).unwrap_or(0);
                println!("healthy: {items} items");
                Ok(())
            } else {
                eprintln!("unhealthy: server returned status {status:?}");
                std::process::exit(1);
            }
        }
        Ok(response) => {
            eprintln!("unhealthy: server returned HTTP status {}", response.status());
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("unhealthy: failed to connect to {url}: {e}");
            std::process::exit(1);
        }
    }
}
