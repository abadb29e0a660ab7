//! Status command.

use chrono::Utc;
use console::style;

use serpwatch::config::Settings;
use serpwatch::models::{RunStatus, KEYWORD_SCHEDULER};

use super::helpers::open_db;

pub async fn cmd_status(settings: &Settings, limit: i64) -> anyhow::Result<()> {
    let ctx = open_db(settings).await?;
    let now = Utc::now();

    println!("{}", style("Scheduler").bold());
    match ctx.scheduler_status().get(KEYWORD_SCHEDULER).await? {
        Some(status) => {
            let state = if !status.running {
                style("stopped").dim()
            } else if status.is_stale(settings.stale_after_secs, now) {
                style("stale").red()
            } else {
                style("running").green()
            };
            println!("  state:     {}", state);
            println!(
                "  heartbeat: {}",
                status
                    .last_heartbeat
                    .map(|b| settings.format_local(b))
                    .unwrap_or_else(|| "-".to_string())
            );
            if let Some(host) = status.host {
                println!("  host:      {}", host);
            }
        }
        None => println!("  {}", style("never started").dim()),
    }

    let schedules = ctx.schedules().list().await?;
    let due = ctx.schedules().due(now).await?;
    println!(
        "  schedules: {} ({} active, {} due)",
        schedules.len(),
        schedules.iter().filter(|s| s.active).count(),
        due.len()
    );

    println!();
    println!("{}", style("Recent runs").bold());
    let runs = ctx.runs().latest(None, limit).await?;
    if runs.is_empty() {
        println!("  {}", style("none").dim());
    }
    for run in runs {
        let status = match run.status {
            RunStatus::Success => style(run.status.as_str()).green(),
            RunStatus::Failed => style(run.status.as_str()).red(),
            _ => style(run.status.as_str()).yellow(),
        };
        let duration = run
            .duration()
            .map(|d| format!("{}s", d.num_seconds()))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:>5}  {:<9} {:<8} {}  {:>6}  {} result(s)",
            run.id,
            run.kind.as_str(),
            status,
            settings.format_local(run.started_at),
            duration,
            ctx.results().count_for_run(run.id).await?
        );
        if let Some(error) = run.error {
            println!("         {}", style(error).red());
        }
    }

    Ok(())
}
