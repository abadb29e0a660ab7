//! Initialize command.

use console::style;

use serpwatch::config::{Config, Settings};

use super::helpers::open_db;

/// Initialize the data directory and database, then sync configured keywords.
pub async fn cmd_init(settings: &Settings, config: &Config) -> anyhow::Result<()> {
    let ctx = open_db(settings).await?;

    let specs = config.normalized_keywords();
    if specs.is_empty() {
        println!(
            "{} No keywords configured in serpwatch.toml",
            style("!").yellow()
        );
    } else {
        let keywords = ctx.keywords().sync(&specs).await?;
        println!(
            "  {} Synced {} keyword(s)",
            style("✓").green(),
            keywords.len()
        );
    }

    println!(
        "{} Initialized serpwatch at {}",
        style("✓").green(),
        settings.database_url()
    );

    Ok(())
}
