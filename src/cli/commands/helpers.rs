//! Shared helper functions for CLI commands.

use std::sync::Arc;

use anyhow::Context;
use reqwest::Client;

use serpwatch::config::Settings;
use serpwatch::http_client::build_client;
use serpwatch::providers::SerperClient;
use serpwatch::repository::DbContext;
use serpwatch::services::{HttpPageFetcher, RunOrchestrator, TagReconciler};

/// Open the database, creating it and applying migrations as needed.
pub async fn open_db(settings: &Settings) -> anyhow::Result<DbContext> {
    settings.ensure_directories()?;
    let ctx = settings.create_db_context();
    ctx.init_schema()
        .await
        .with_context(|| format!("Failed to migrate database {}", settings.database_url()))?;
    Ok(ctx)
}

pub fn http_client(settings: &Settings) -> anyhow::Result<Client> {
    build_client(settings.http_timeout()).context("Failed to create HTTP client")
}

pub fn search_provider(settings: &Settings, client: Client) -> anyhow::Result<SerperClient> {
    let api_key = settings
        .serper_api_key
        .clone()
        .context("SERPER_API_KEY is not set")?;
    Ok(SerperClient::new(client, api_key, settings.serper_base_url.clone())
        .with_retry(settings.retry_policy()))
}

pub fn tag_reconciler(settings: &Settings, db: &DbContext, client: Client) -> TagReconciler {
    let fetcher = HttpPageFetcher::new(client).with_retry(settings.retry_policy());
    TagReconciler::new(db.clone(), Arc::new(fetcher))
}

/// Wire the search provider and tag reconciler into an orchestrator.
pub fn orchestrator(settings: &Settings, db: &DbContext) -> anyhow::Result<RunOrchestrator> {
    let client = http_client(settings)?;
    let provider = search_provider(settings, client.clone())?;
    let tags = tag_reconciler(settings, db, client);
    Ok(RunOrchestrator::new(db.clone(), Arc::new(provider), tags))
}
