//! serpwatch - keyword ranking monitor.
//!
//! Snapshots search rankings on a schedule and cross-checks canonical and
//! hreflang tags as seen by a generic bot and by Googlebot.

mod cli;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env must be loaded before settings and RUST_LOG are read
    let _ = dotenvy::dotenv();

    init_tracing(cli::is_verbose());
    cli::run().await
}

/// `RUST_LOG` wins over the verbosity flag when set.
fn init_tracing(verbose: bool) {
    let level = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("serpwatch={level}")));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();
}
