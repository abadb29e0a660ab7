//! One-off search.

use serpwatch::config::Settings;
use serpwatch::providers::SearchProvider;

use super::helpers::{http_client, search_provider};

pub async fn cmd_query(
    settings: &Settings,
    keyword: &str,
    region: &str,
    language: Option<&str>,
) -> anyhow::Result<()> {
    let provider = search_provider(settings, http_client(settings)?)?;
    let payload = provider.search(keyword, Some(region), language).await?;
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}
