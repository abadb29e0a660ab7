//! One-off tag comparison.

use console::style;

use serpwatch::config::Settings;
use serpwatch::models::{IdentityTags, RunKind};

use super::helpers::{http_client, open_db, tag_reconciler};

pub async fn cmd_check(
    settings: &Settings,
    url: &str,
    region: &str,
    language: &str,
) -> anyhow::Result<()> {
    let ctx = open_db(settings).await?;
    let client = http_client(settings)?;
    let tags = tag_reconciler(settings, &ctx, client);

    let (outcome, comparisons) = tags
        .check_pages(RunKind::Ui, &[url.to_string()], region, language)
        .await?;
    let run = outcome.into_result()?;

    for comparison in comparisons {
        print_identity("bot", &comparison.bot);
        print_identity("googlebot", &comparison.googlebot);
        if comparison.is_mismatch() {
            println!("{} Signals differ between identities", style("!").yellow());
        } else {
            println!("{} Signals match", style("✓").green());
        }
    }
    println!("  run {}", run.id);

    Ok(())
}

fn print_identity(label: &str, tags: &IdentityTags) {
    let status = match (tags.status, &tags.error) {
        (_, Some(error)) => style(error.clone()).red().to_string(),
        (Some(status), None) => status.to_string(),
        (None, None) => "-".to_string(),
    };
    println!("{} [{}]", style(label).bold(), status);
    println!(
        "  canonical: {}",
        tags.canonical.as_deref().unwrap_or("-")
    );
    match &tags.hreflang {
        Some(map) => {
            for (lang, href) in map {
                println!("  hreflang {}: {}", lang, href);
            }
        }
        None => println!("  hreflang: -"),
    }
}
