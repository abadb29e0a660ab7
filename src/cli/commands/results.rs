//! Run results export.

use serpwatch::config::Settings;

use super::helpers::open_db;

/// Print a run's results as a JSON array, ordered by position.
pub async fn cmd_results(settings: &Settings, run_id: i64) -> anyhow::Result<()> {
    let ctx = open_db(settings).await?;
    if ctx.runs().get(run_id).await?.is_none() {
        anyhow::bail!("Run {} not found", run_id);
    }

    let results = ctx.results().for_run(run_id).await?;
    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}
