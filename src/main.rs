//! hn-index - h-index style statistics for Hacker News users
//!
//! Fetches every item a user submitted, keeps the live scored items of the
//! selected type and reports the largest h such that h of them scored at
//! least h points. Batch runs append one CSV row per user as they go, so an
//! interrupted run can be resumed.
//!
//! Exit codes:
//!   0 - Success (batch runs succeed even when some usernames are skipped)
//!   1 - Missing or malformed input, config error, or a failed single-user lookup

mod analysis;
mod api;
mod batch;
mod cli;
mod collector;
mod config;
mod error;
mod models;
mod progress;

use anyhow::{Context, Result};
use api::HnClient;
use batch::BatchRunner;
use cli::Args;
use config::{Config, CONFIG_FILE_NAME};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("hn-index v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .hn-index.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", CONFIG_FILE_NAME);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the single-user report and/or the batch. Returns the exit code.
async fn run(args: Args) -> Result<i32> {
    let start_time = Instant::now();

    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config.validate()?;

    // Reject a bad username list before any request is made.
    let usernames = match args.file {
        Some(ref path) => Some(batch::load_usernames(path)?),
        None => None,
    };

    let client = HnClient::new(&config.api)?;
    let runner = BatchRunner::new(
        client,
        config.collector.concurrency,
        config.batch.show_progress,
    );

    let mut exit_code = 0;

    if let Some(ref username) = args.user {
        let mode = config.collector.scoring_mode();
        info!("Computing statistic for {} ({})", username, mode);

        match runner.process_user(username, &mode).await {
            Ok(report) => {
                if report.failed_items > 0 {
                    warn!(
                        "{} of {} items could not be fetched",
                        report.failed_items, report.row.submission_count
                    );
                }
                if report.scores.is_empty() {
                    info!("{} has no eligible items", username);
                }
                for line in report.summary_lines(&mode) {
                    println!("{}", line);
                }
            }
            Err(e) => {
                error!("Skipping {}: {}", username, e);
                eprintln!("⚠️  Skipping {}: {}", username, e);
                exit_code = 1;
            }
        }
    }

    if let (Some(input), Some(usernames)) = (args.file.as_deref(), usernames) {
        if config.collector.by_type {
            warn!("Per-type statistics are not written in batch mode; using the category filter");
        }

        let mode = config.collector.batch_scoring_mode();
        let output = args
            .output
            .clone()
            .unwrap_or_else(|| batch::output_path_for(input));

        println!(
            "📥 Processing {} usernames from {} -> {}",
            usernames.len(),
            input.display(),
            output.display()
        );

        let summary = runner
            .run_batch(&usernames, &output, &mode, config.batch.resume)
            .await?;

        println!("\n📊 Batch Summary:");
        println!("   Written: {}", summary.written);
        println!("   Failed: {}", summary.failed.len());
        if !summary.failed.is_empty() {
            println!("   Failed usernames: {}", summary.failed.join(", "));
        }
        println!("   Skipped: {}", summary.skipped);
        println!("   Duration: {:.1}s", start_time.elapsed().as_secs_f64());
    }

    Ok(exit_code)
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
