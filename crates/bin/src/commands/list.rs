//! List command - queries the items of a running Stratum server.

use std::time::Duration;

use stratum::PlacedItem;
use url::Url;

use crate::cli::ListArgs;
use crate::output::{OutputFormat, print_table};

/// Run the `list` command
pub async fn run(args: &ListArgs, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let url = list_url(args)?;
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(args.timeout))
        .build()?;

    let response = client.get(url.clone()).send().await?;
    let status = response.status();
    if !status.is_success() {
        let body: serde_json::Value = response.json().await.unwrap_or_default();
        let message = body
            .get("error")
            .and_then(|e| e.as_str())
            .unwrap_or("no error message");
        return Err(format!("{url} returned HTTP {status}: {message}").into());
    }

    match format {
        OutputFormat::Human => {
            let items: Vec<PlacedItem> = response.json().await?;
            if items.is_empty() {
                println!("No items found.");
                return Ok(());
            }
            print_table(
                &["DEPTH", "ID", "NAME", "X", "Y", "WIDTH", "HEIGHT"],
                &item_rows(&items),
            );
        }
        OutputFormat::Json => {
            let body: serde_json::Value = response.json().await?;
            println!("{}", serde_json::to_string(&body)?);
        }
    }

    Ok(())
}

/// Build the `/api/items` URL with every filter present in `args`.
fn list_url(args: &ListArgs) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(args.url.trim_end_matches('/'))?.join("/api/items")?;
    {
        let mut query = url.query_pairs_mut();
        if let Some(limit) = args.limit {
            query.append_pair("limit", &limit.to_string());
        }
        if let Some(max_x) = args.max_x {
            query.append_pair("maxX", &max_x.to_string());
        }
        if let Some(max_y) = args.max_y {
            query.append_pair("maxY", &max_y.to_string());
        }
        if let Some(width) = args.width {
            query.append_pair("width", &width.to_string());
        }
        if let Some(height) = args.height {
            query.append_pair("height", &height.to_string());
        }
    }
    // An empty query_pairs_mut still leaves a trailing '?'
    if url.query() == Some("") {
        url.set_query(None);
    }
    Ok(url)
}

fn item_rows(items: &[PlacedItem]) -> Vec<Vec<String>> {
    items
        .iter()
        .map(|item| {
            vec![
                item.depth.to_string(),
                item.id.to_string(),
                item.name.clone(),
                item.position.x.to_string(),
                item.position.y.to_string(),
                item.size.width.to_string(),
                item.size.height.to_string(),
            ]
        })
        .collect()
}
