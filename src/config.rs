//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.hn-index.toml` files.

use crate::models::{ScoringMode, DEFAULT_CATEGORY};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".hn-index.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Item-tracker API settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Score collection settings.
    #[serde(default)]
    pub collector: CollectorConfig,

    /// Batch run settings.
    #[serde(default)]
    pub batch: BatchConfig,
}

/// Item-tracker API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL; `user/{name}.json` and `item/{id}.json` are appended.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "https://hacker-news.firebaseio.com/v0".to_string()
}

fn default_timeout() -> u64 {
    30
}

/// Score collection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Maximum number of item requests in flight for one user.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Item type that counts toward the statistic.
    #[serde(default = "default_category")]
    pub category: String,

    /// Report one statistic per item type instead of filtering.
    /// Only honoured for single-user runs.
    #[serde(default)]
    pub by_type: bool,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            category: default_category(),
            by_type: false,
        }
    }
}

fn default_concurrency() -> usize {
    1000 // stays under typical open-file limits
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

impl CollectorConfig {
    /// Scoring mode for single-user reports.
    pub fn scoring_mode(&self) -> ScoringMode {
        if self.by_type {
            ScoringMode::ByType
        } else {
            self.batch_scoring_mode()
        }
    }

    /// Scoring mode for batch rows, which always carry one statistic.
    pub fn batch_scoring_mode(&self) -> ScoringMode {
        ScoringMode::Category(self.category.clone())
    }
}

/// Batch run settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Skip usernames that already have a row in the output file.
    #[serde(default)]
    pub resume: bool,

    /// Draw a progress bar while fetching a user's items.
    #[serde(default = "default_true")]
    pub show_progress: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            resume: false,
            show_progress: true,
        }
    }
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref url) = args.api_url {
            self.api.base_url = url.clone();
        }
        if let Some(timeout) = args.timeout {
            self.api.timeout_seconds = timeout;
        }

        if let Some(concurrency) = args.concurrency {
            self.collector.concurrency = concurrency;
        }
        if let Some(ref category) = args.category {
            self.collector.category = category.clone();
            self.collector.by_type = false;
        }
        if args.by_type {
            self.collector.by_type = true;
        }

        if args.resume {
            self.batch.resume = true;
        }
        if args.no_progress || args.quiet {
            self.batch.show_progress = false;
        }
    }

    /// Check the merged settings before any request is made.
    ///
    /// The CLI validates its own flags, but values from a config file only
    /// meet these checks here.
    pub fn validate(&self) -> Result<()> {
        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://") {
            bail!(
                "api.base_url must start with 'http://' or 'https://': {}",
                self.api.base_url
            );
        }

        if self.api.timeout_seconds == 0 {
            bail!("api.timeout_seconds must be at least 1");
        }

        if self.collector.concurrency == 0 {
            bail!("collector.concurrency must be at least 1");
        }

        if self.collector.category.trim().is_empty() {
            bail!("collector.category must not be empty");
        }

        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
