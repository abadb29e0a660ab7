//! Long-running scheduler command.

use console::style;
use tokio::sync::broadcast;

use serpwatch::config::Settings;
use serpwatch::scheduler::Scheduler;

use super::helpers::{open_db, orchestrator};

pub async fn cmd_scheduler(settings: &Settings) -> anyhow::Result<()> {
    let ctx = open_db(settings).await?;
    let orchestrator = orchestrator(settings, &ctx)?;
    let config = settings.scheduler_config();

    println!(
        "{} Scheduler running (tick {}s, favorites {}s). Press Ctrl+C to stop.",
        style("→").cyan(),
        config.tick_interval.as_secs(),
        config.favorites_interval.as_secs()
    );

    let scheduler = Scheduler::new(ctx, orchestrator, config);
    let (shutdown_tx, _) = broadcast::channel(1);
    scheduler.run_until_shutdown(shutdown_tx).await;

    println!("{} Scheduler stopped", style("✓").green());
    Ok(())
}
