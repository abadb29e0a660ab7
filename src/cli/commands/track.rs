//! Tracked site commands.

use chrono::Utc;
use console::style;

use serpwatch::config::Settings;
use serpwatch::utils::normalize_domain;

use super::helpers::open_db;

/// Hits shown per site in `track list`.
const RECENT_HITS: i64 = 3;

pub async fn cmd_track_add(settings: &Settings, input: &str) -> anyhow::Result<()> {
    let Some(domain) = normalize_domain(input) else {
        anyhow::bail!("'{}' is not a valid domain or URL", input);
    };

    let ctx = open_db(settings).await?;
    let site = ctx.tracked_sites().add(&domain, Utc::now()).await?;
    println!("{} Tracking {}", style("✓").green(), site.domain);
    Ok(())
}

pub async fn cmd_track_remove(settings: &Settings, input: &str) -> anyhow::Result<()> {
    let domain = normalize_domain(input).unwrap_or_else(|| input.trim().to_lowercase());

    let ctx = open_db(settings).await?;
    if ctx.tracked_sites().remove(&domain).await? {
        println!("{} Stopped tracking {}", style("✓").green(), domain);
    } else {
        println!("{} {} was not tracked", style("!").yellow(), domain);
    }
    Ok(())
}

pub async fn cmd_track_list(settings: &Settings) -> anyhow::Result<()> {
    let ctx = open_db(settings).await?;
    let repo = ctx.tracked_sites();
    let sites = repo.list().await?;
    if sites.is_empty() {
        println!("{} No tracked sites", style("!").yellow());
        return Ok(());
    }

    for site in sites {
        println!("{}", style(&site.domain).bold());
        for hit in repo.hits_for_site(site.id, RECENT_HITS).await? {
            println!(
                "  #{:<3} {}  (run {}, {})",
                hit.position,
                hit.url,
                hit.run_id,
                settings.format_local(hit.detected_at)
            );
        }
    }
    Ok(())
}
