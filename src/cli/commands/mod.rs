//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod check;
mod helpers;
mod init;
mod query;
mod results;
mod run;
mod schedule;
mod scheduler;
mod status;
mod track;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use serpwatch::config::{load_settings_with_options, LoadOptions};

#[derive(Parser)]
#[command(name = "serpwatch")]
#[command(about = "Keyword ranking monitor with canonical/hreflang checks")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Resolve relative paths from current working directory instead of config file location
    #[arg(long, global = true)]
    cwd: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory and database, and sync configured keywords
    Init,

    /// Run every configured keyword once
    Run,

    /// Search one keyword and print the raw response
    Query {
        /// Search phrase
        keyword: String,
        /// Region code (e.g. US, IN)
        #[arg(short, long, default_value = "US")]
        region: String,
        /// Language code
        #[arg(short, long)]
        language: Option<String>,
    },

    /// Compare canonical/hreflang tags served to a bot and to Googlebot
    Check {
        /// Page URL
        url: String,
        /// Region recorded for the page
        #[arg(short, long, default_value = "US")]
        region: String,
        /// Language used for Accept-Language
        #[arg(short, long, default_value = "EN")]
        language: String,
    },

    /// Manage recurring keyword schedules
    Schedule {
        #[command(subcommand)]
        command: ScheduleCommands,
    },

    /// Manage tracked sites
    Track {
        #[command(subcommand)]
        command: TrackCommands,
    },

    /// Print the results of a run as JSON, ordered by position
    Results {
        /// Run ID
        run_id: i64,
    },

    /// Run the scheduler until interrupted
    Scheduler,

    /// Show scheduler liveness and recent runs
    Status {
        /// Number of recent runs to show
        #[arg(short, long, default_value = "10")]
        limit: i64,
    },
}

#[derive(Subcommand)]
enum ScheduleCommands {
    /// Create or update the schedule for a keyword
    Set {
        /// Search phrase
        keyword: String,
        /// Region code
        #[arg(short, long, default_value = "US")]
        region: String,
        /// Language code
        #[arg(short, long)]
        language: Option<String>,
        /// Proxy profile
        #[arg(long)]
        proxy: Option<String>,
        /// Hours between runs (1-720)
        #[arg(short, long, default_value = "24")]
        every: i32,
        /// Create or leave the schedule paused
        #[arg(long)]
        paused: bool,
    },
    /// List schedules
    List,
}

#[derive(Subcommand)]
enum TrackCommands {
    /// Track a domain (bare domain or URL)
    Add { domain: String },
    /// Stop tracking a domain
    Remove { domain: String },
    /// List tracked domains with their latest hits
    List,
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
        use_cwd: cli.cwd,
    };
    let (settings, config) = load_settings_with_options(options).await;

    match cli.command {
        Commands::Init => init::cmd_init(&settings, &config).await,
        Commands::Run => run::cmd_run(&settings, &config).await,
        Commands::Query {
            keyword,
            region,
            language,
        } => query::cmd_query(&settings, &keyword, &region, language.as_deref()).await,
        Commands::Check {
            url,
            region,
            language,
        } => check::cmd_check(&settings, &url, &region, &language).await,
        Commands::Schedule { command } => match command {
            ScheduleCommands::Set {
                keyword,
                region,
                language,
                proxy,
                every,
                paused,
            } => {
                schedule::cmd_schedule_set(
                    &settings,
                    &keyword,
                    &region,
                    language.as_deref(),
                    proxy.as_deref(),
                    every,
                    !paused,
                )
                .await
            }
            ScheduleCommands::List => schedule::cmd_schedule_list(&settings).await,
        },
        Commands::Track { command } => match command {
            TrackCommands::Add { domain } => track::cmd_track_add(&settings, &domain).await,
            TrackCommands::Remove { domain } => track::cmd_track_remove(&settings, &domain).await,
            TrackCommands::List => track::cmd_track_list(&settings).await,
        },
        Commands::Results { run_id } => results::cmd_results(&settings, run_id).await,
        Commands::Scheduler => scheduler::cmd_scheduler(&settings).await,
        Commands::Status { limit } => status::cmd_status(&settings, limit).await,
    }
}
