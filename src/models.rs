//! Data models for users, items, collected scores and output rows.
//!
//! The wire records mirror the Hacker News API: every field the API may
//! omit is an `Option` or defaults to `false`.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;

/// Identifier of a submission on the item tracker.
pub type ItemId = u64;

/// Category tag used when no filter is configured.
pub const DEFAULT_CATEGORY: &str = "story";

/// Whether `name` is a well-formed Hacker News username.
///
/// Accounts are limited to ASCII letters, digits, `_` and `-`.
pub fn is_valid_username(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// A user record from the `user/{name}.json` endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct User {
    /// Cumulative reputation.
    #[serde(default)]
    pub karma: i64,
    /// Every item the user has submitted, newest first on the wire.
    pub submitted: Vec<ItemId>,
}

/// An item record from the `item/{id}.json` endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Item {
    /// Category tag (`story`, `comment`, `poll`, ...).
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    /// Points; absent for comments and some deleted items.
    #[serde(default)]
    pub score: Option<u64>,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub dead: bool,
}

impl Item {
    /// Score of a live item that carries one.
    pub fn live_score(&self) -> Option<u64> {
        if self.deleted || self.dead {
            return None;
        }
        self.score
    }
}

/// How eligible items are grouped before the rank statistic is computed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScoringMode {
    /// Only items whose type equals the tag count; one flat collection.
    Category(String),
    /// Every typed item counts, bucketed by its type.
    ByType,
}

impl Default for ScoringMode {
    fn default() -> Self {
        ScoringMode::Category(DEFAULT_CATEGORY.to_string())
    }
}

impl fmt::Display for ScoringMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoringMode::Category(tag) => write!(f, "category '{}'", tag),
            ScoringMode::ByType => write!(f, "by type"),
        }
    }
}

/// Eligible scores keyed by item type.
///
/// In [`ScoringMode::Category`] there is at most one bucket, so the set
/// behaves as a single flat collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreSet {
    buckets: BTreeMap<String, Vec<u64>>,
}

impl ScoreSet {
    /// Add the item's score if it is eligible under `mode`.
    ///
    /// Returns whether the item was counted.
    pub fn record(&mut self, item: &Item, mode: &ScoringMode) -> bool {
        let (Some(kind), Some(score)) = (item.kind.as_deref(), item.live_score()) else {
            return false;
        };

        match mode {
            ScoringMode::Category(tag) if kind != tag.as_str() => false,
            _ => {
                self.buckets.entry(kind.to_string()).or_default().push(score);
                true
            }
        }
    }

    /// Every eligible score regardless of bucket.
    pub fn all_scores(&self) -> Vec<u64> {
        self.buckets.values().flatten().copied().collect()
    }

    /// Buckets in type-name order.
    pub fn buckets(&self) -> impl Iterator<Item = (&str, &[u64])> {
        self.buckets.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Number of eligible scores.
    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One durable output record per processed username.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRow {
    pub username: String,
    pub submission_count: usize,
    pub rank_statistic: usize,
    pub karma: i64,
}

impl ResultRow {
    /// CSV header matching [`ResultRow::to_csv_line`].
    pub const CSV_HEADER: &'static str = "username,submission_count,rank_statistic,karma";

    /// Render as a CSV line without the trailing newline.
    pub fn to_csv_line(&self) -> String {
        format!(
            "{},{},{},{}",
            self.username, self.submission_count, self.rank_statistic, self.karma
        )
    }

    /// Parse a line written by [`ResultRow::to_csv_line`].
    ///
    /// Returns `None` for the header and for truncated or garbled lines.
    pub fn parse_csv_line(line: &str) -> Option<Self> {
        let mut fields = line.trim_end_matches(['\r', '\n']).split(',');
        let username = fields.next()?.to_string();
        let submission_count = fields.next()?.parse().ok()?;
        let rank_statistic = fields.next()?.parse().ok()?;
        let karma = fields.next()?.parse().ok()?;

        if fields.next().is_some() || username.is_empty() {
            return None;
        }

        Some(Self {
            username,
            submission_count,
            rank_statistic,
            karma,
        })
    }
}
