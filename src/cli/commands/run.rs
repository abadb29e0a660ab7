//! One-shot run over the configured keywords.

use console::style;

use serpwatch::config::{Config, Settings};
use serpwatch::models::RunKind;

use super::helpers::{open_db, orchestrator};

pub async fn cmd_run(settings: &Settings, config: &Config) -> anyhow::Result<()> {
    let specs = config.normalized_keywords();
    if specs.is_empty() {
        anyhow::bail!("No valid keywords configured");
    }

    let ctx = open_db(settings).await?;
    let keywords = ctx.keywords().sync(&specs).await?;
    let orchestrator = orchestrator(settings, &ctx)?;

    println!(
        "{} Running {} keyword(s)",
        style("→").cyan(),
        keywords.len()
    );
    let run = orchestrator
        .run(&keywords, RunKind::Hourly)
        .await?
        .into_result()?;

    let results = ctx.results().count_for_run(run.id).await?;
    let hits = ctx.tracked_sites().hits_for_run(run.id).await?;
    println!(
        "{} Run {} finished: {} result(s), {} tracked hit(s)",
        style("✓").green(),
        run.id,
        results,
        hits.len()
    );
    for hit in hits {
        println!("  #{:<3} {}", hit.position, hit.url);
    }

    Ok(())
}
