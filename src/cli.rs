//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation.

use clap::Parser;
use std::path::PathBuf;

/// hn-index - h-index style statistics for Hacker News users
///
/// Fetches every item a user submitted and reports the largest h such
/// that h of their stories scored at least h points.
///
/// Examples:
///   hn-index --user pg
///   hn-index --user pg --by-type
///   hn-index --file users.txt
///   hn-index --file users.txt --resume --concurrency 200
///   hn-index --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Single username to report on
    #[arg(short, long, value_name = "NAME")]
    pub user: Option<String>,

    /// File with one username per line; rows go to <stem>-output.csv
    #[arg(short, long, value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Override the batch output path
    #[arg(short, long, value_name = "FILE", requires = "file")]
    pub output: Option<PathBuf>,

    /// Maximum concurrent item requests per user
    #[arg(long, value_name = "NUM")]
    pub concurrency: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Item-tracker API base URL
    #[arg(long, value_name = "URL", env = "HN_INDEX_API_URL")]
    pub api_url: Option<String>,

    /// Item type that counts toward the statistic (default: story)
    #[arg(long, value_name = "TYPE", conflicts_with = "by_type")]
    pub category: Option<String>,

    /// Report one statistic per item type (single-user mode only)
    #[arg(long, conflicts_with = "file")]
    pub by_type: bool,

    /// Skip usernames that already have a row in the output file
    #[arg(long, requires = "file")]
    pub resume: bool,

    /// Path to configuration file
    ///
    /// If not specified, looks for .hn-index.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Do not draw progress bars
    #[arg(long)]
    pub no_progress: bool,

    /// Generate a default .hn-index.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.user.is_none() && self.file.is_none() {
            return Err(crate::error::InputError::Missing.to_string());
        }

        if let Some(ref user) = self.user {
            if !crate::models::is_valid_username(user) {
                return Err(format!("Invalid username: {:?}", user));
            }
        }

        if let Some(ref url) = self.api_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("API URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if self.concurrency == Some(0) {
            return Err("Concurrency must be at least 1".to_string());
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref file) = self.file {
            if !file.is_file() {
                return Err(format!("Username file does not exist: {}", file.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
