//! Schedule management commands.

use chrono::Utc;
use console::style;

use serpwatch::config::Settings;
use serpwatch::models::{clamp_interval_hours, KeywordSpec};

use super::helpers::open_db;

pub async fn cmd_schedule_set(
    settings: &Settings,
    keyword: &str,
    region: &str,
    language: Option<&str>,
    proxy: Option<&str>,
    every: i32,
    active: bool,
) -> anyhow::Result<()> {
    let Some(spec) = KeywordSpec::normalize(keyword, region, language, proxy) else {
        anyhow::bail!("Keyword and region must not be empty");
    };
    if clamp_interval_hours(every) != every {
        println!(
            "{} Interval {}h clamped to {}h",
            style("!").yellow(),
            every,
            clamp_interval_hours(every)
        );
    }

    let ctx = open_db(settings).await?;
    let keyword = ctx.keywords().get_or_create(&spec).await?;
    let schedule = ctx
        .schedules()
        .upsert_for_keyword(keyword.id, every, active, Utc::now())
        .await?;

    println!(
        "{} Schedule {} for '{}' ({}/{}): every {}h, {}",
        style("✓").green(),
        schedule.id,
        keyword.keyword,
        keyword.region,
        keyword.language,
        schedule.interval_hours,
        if schedule.active { "active" } else { "paused" }
    );
    if let Some(next) = schedule.next_run_at {
        println!("  next run: {}", settings.format_local(next));
    }
    Ok(())
}

pub async fn cmd_schedule_list(settings: &Settings) -> anyhow::Result<()> {
    let ctx = open_db(settings).await?;
    let schedules = ctx.schedules().list().await?;
    if schedules.is_empty() {
        println!("{} No schedules", style("!").yellow());
        return Ok(());
    }

    let keywords = ctx.keywords();
    let now = Utc::now();
    for schedule in schedules {
        let label = match keywords.get(schedule.keyword_id).await? {
            Some(kw) => format!("{} ({}/{})", kw.keyword, kw.region, kw.language),
            None => format!("keyword {}", schedule.keyword_id),
        };
        let state = if !schedule.active {
            style("paused").dim().to_string()
        } else if schedule.is_due(now) {
            style("due").yellow().to_string()
        } else {
            style("active").green().to_string()
        };
        let fmt = |dt: Option<chrono::DateTime<Utc>>| {
            dt.map(|d| settings.format_local(d))
                .unwrap_or_else(|| "-".to_string())
        };

        println!(
            "{:>4}  {:<40} every {:>3}h  {:<8} last {}  next {}",
            schedule.id,
            label,
            schedule.interval_hours,
            state,
            fmt(schedule.last_run_at),
            fmt(schedule.next_run_at)
        );
    }
    Ok(())
}
