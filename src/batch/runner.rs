//! Drives the resolve -> collect -> rank pipeline across usernames.
//!
//! Users are processed strictly one after another; concurrency only
//! happens inside a single user's item fan-out. In batch mode each
//! finished user is written to the output file before the next one
//! starts, so the file is always the record of completed work.

use crate::analysis::rank_statistic;
use crate::api::HnClient;
use crate::batch::output::{completed_usernames, ResultWriter};
use crate::collector::ScoreCollector;
use crate::error::ResolutionError;
use crate::models::{ResultRow, ScoreSet, ScoringMode};
use crate::progress::item_progress_bar;
use anyhow::Result;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use tracing::{debug, info, warn};

/// Lifecycle of one username within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserState {
    Pending,
    Resolving,
    Collecting,
    Computed,
    Written,
    Failed,
}

impl fmt::Display for UserState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UserState::Pending => "pending",
            UserState::Resolving => "resolving",
            UserState::Collecting => "collecting",
            UserState::Computed => "computed",
            UserState::Written => "written",
            UserState::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

fn transition(username: &str, state: &mut UserState, next: UserState) {
    debug!("{}: {} -> {}", username, state, next);
    *state = next;
}

/// Everything computed for one user.
#[derive(Debug, Clone)]
pub struct UserReport {
    pub row: ResultRow,
    pub scores: ScoreSet,
    /// Items dropped because their fetch failed.
    pub failed_items: usize,
}

impl UserReport {
    /// Lines printed for a single-user run.
    ///
    /// `username karma h` for a category run, `type h` per type otherwise.
    pub fn summary_lines(&self, mode: &ScoringMode) -> Vec<String> {
        match mode {
            ScoringMode::Category(_) => vec![format!(
                "{} {} {}",
                self.row.username, self.row.karma, self.row.rank_statistic
            )],
            ScoringMode::ByType => self
                .scores
                .buckets()
                .map(|(kind, scores)| format!("{} {}", kind, rank_statistic(scores)))
                .collect(),
        }
    }
}

/// Totals for a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Rows appended during this run.
    pub written: usize,
    /// Usernames that could not be resolved, once per occurrence in the input.
    pub failed: Vec<String>,
    /// Usernames skipped because a row for them already exists.
    pub skipped: usize,
}

/// Runs the pipeline for one or many usernames with a shared client.
pub struct BatchRunner {
    client: HnClient,
    concurrency: usize,
    show_progress: bool,
}

impl BatchRunner {
    pub fn new(client: HnClient, concurrency: usize, show_progress: bool) -> Self {
        Self {
            client,
            concurrency,
            show_progress,
        }
    }

    /// Resolve, collect and rank a single user.
    pub async fn process_user(
        &self,
        username: &str,
        mode: &ScoringMode,
    ) -> Result<UserReport, ResolutionError> {
        let mut state = UserState::Pending;
        self.process_user_tracked(username, mode, &mut state).await
    }

    async fn process_user_tracked(
        &self,
        username: &str,
        mode: &ScoringMode,
        state: &mut UserState,
    ) -> Result<UserReport, ResolutionError> {
        transition(username, state, UserState::Resolving);
        let user = match self.client.fetch_user(username).await {
            Ok(user) => user,
            Err(e) => {
                transition(username, state, UserState::Failed);
                return Err(e);
            }
        };

        transition(username, state, UserState::Collecting);
        let collector = ScoreCollector::new(&self.client, self.concurrency, mode.clone());
        debug!(
            "Collecting {} items for {} ({}, up to {} in flight)",
            user.submitted.len(),
            username,
            collector.mode(),
            collector.concurrency()
        );

        let bar = item_progress_bar(username, user.submitted.len() as u64, self.show_progress);
        let collection = collector.collect(&user.submitted, &bar).await;
        debug!(
            "{}: fetched {} items, {} eligible, {} failed",
            username,
            collection.fetched,
            collection.scores.len(),
            collection.failed
        );

        let rank = rank_statistic(&collection.scores.all_scores());
        transition(username, state, UserState::Computed);

        Ok(UserReport {
            row: ResultRow {
                username: username.to_string(),
                submission_count: user.submitted.len(),
                rank_statistic: rank,
                karma: user.karma,
            },
            scores: collection.scores,
            failed_items: collection.failed,
        })
    }

    /// Process `usernames` in order, appending one row per completed user.
    ///
    /// Resolution failures are announced and skipped. With `resume`, users
    /// already present in `output` are not fetched again.
    pub async fn run_batch(
        &self,
        usernames: &[String],
        output: &Path,
        mode: &ScoringMode,
        resume: bool,
    ) -> Result<BatchSummary> {
        let mut seen: HashSet<String> = if resume {
            let done = completed_usernames(output)?;
            info!("{} usernames already present in {}", done.len(), output.display());
            done
        } else {
            HashSet::new()
        };

        let mut unresolved: HashSet<String> = HashSet::new();
        let mut writer = ResultWriter::open(output)?;
        let mut summary = BatchSummary::default();
        let total = usernames.len();

        for (index, username) in usernames.iter().enumerate() {
            if seen.contains(username) {
                debug!("Skipping {}: already processed", username);
                summary.skipped += 1;
                continue;
            }

            if unresolved.contains(username) {
                debug!("Skipping {}: already failed in this run", username);
                summary.failed.push(username.clone());
                continue;
            }

            info!("[{}/{}] Processing {}", index + 1, total, username);
            let mut state = UserState::Pending;

            let report = match self.process_user_tracked(username, mode, &mut state).await {
                Ok(report) => report,
                Err(e) => {
                    warn!("Skipping {}: {}", username, e);
                    eprintln!("⚠️  Skipping {}: {}", username, e);
                    summary.failed.push(username.clone());
                    unresolved.insert(username.clone());
                    continue;
                }
            };

            writer.append(&report.row)?;
            seen.insert(username.clone());
            transition(username, &mut state, UserState::Written);
            summary.written += 1;

            println!(
                "   {} karma={} submissions={} h={}",
                username, report.row.karma, report.row.submission_count, report.row.rank_statistic
            );
        }

        info!(
            "Batch finished: {} written to {}, {} failed, {} skipped",
            writer.rows_written(),
            writer.path().display(),
            summary.failed.len(),
            summary.skipped
        );

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use serde_json::json;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_json(server: &MockServer, route: &str, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    /// alice: karma 100, items 1..=3 of which item 2 is deleted.
    async fn mount_alice(server: &MockServer) {
        mount_json(server, "/user/alice.json", json!({"id": "alice", "karma": 100, "submitted": [1, 2, 3]})).await;
        mount_json(server, "/item/1.json", json!({"type": "story", "score": 10})).await;
        mount_json(server, "/item/2.json", json!({"type": "story", "score": 5, "deleted": true})).await;
        mount_json(server, "/item/3.json", json!({"type": "story", "score": 5})).await;
    }

    fn runner_for(server: &MockServer) -> BatchRunner {
        let client = HnClient::new(&ApiConfig {
            base_url: server.uri(),
            timeout_seconds: 2,
        })
        .unwrap();
        BatchRunner::new(client, 16, false)
    }

    fn users(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_process_user_end_to_end() {
        let server = MockServer::start().await;
        mount_alice(&server).await;

        let report = runner_for(&server)
            .process_user("alice", &ScoringMode::default())
            .await
            .unwrap();

        assert_eq!(report.row.to_csv_line(), "alice,3,2,100");
        assert_eq!(report.failed_items, 0);
        assert_eq!(
            report.summary_lines(&ScoringMode::default()),
            vec!["alice 100 2".to_string()]
        );
    }

    #[tokio::test]
    async fn test_zero_submissions() {
        let server = MockServer::start().await;
        mount_json(&server, "/user/newbie.json", json!({"id": "newbie", "karma": 1, "submitted": []})).await;

        let report = runner_for(&server)
            .process_user("newbie", &ScoringMode::default())
            .await
            .unwrap();

        assert_eq!(report.row.submission_count, 0);
        assert_eq!(report.row.rank_statistic, 0);
        assert!(report.scores.is_empty());
    }

    #[tokio::test]
    async fn test_by_type_summary() {
        let server = MockServer::start().await;
        mount_json(&server, "/user/bob.json", json!({"karma": 7, "submitted": [1, 2, 3]})).await;
        mount_json(&server, "/item/1.json", json!({"type": "story", "score": 3})).await;
        mount_json(&server, "/item/2.json", json!({"type": "story", "score": 2})).await;
        mount_json(&server, "/item/3.json", json!({"type": "poll", "score": 9})).await;

        let report = runner_for(&server)
            .process_user("bob", &ScoringMode::ByType)
            .await
            .unwrap();

        assert_eq!(
            report.summary_lines(&ScoringMode::ByType),
            vec!["poll 1".to_string(), "story 2".to_string()]
        );
    }

    #[tokio::test]
    async fn test_batch_skips_unresolvable_users() {
        let server = MockServer::start().await;
        mount_alice(&server).await;
        mount_json(&server, "/user/ghost.json", serde_json::Value::Null).await;
        mount_json(&server, "/user/carol.json", json!({"karma": 5, "submitted": [3]})).await;

        let dir = TempDir::new().unwrap();
        let output = dir.path().join("users-output.csv");

        let summary = runner_for(&server)
            .run_batch(&users(&["alice", "ghost", "carol"]), &output, &ScoringMode::default(), false)
            .await
            .unwrap();

        assert_eq!(summary.written, 2);
        assert_eq!(summary.failed, vec!["ghost".to_string()]);

        let content = std::fs::read_to_string(&output).unwrap();
        assert_eq!(
            content,
            "username,submission_count,rank_statistic,karma\nalice,3,2,100\ncarol,1,1,5\n"
        );
    }

    #[tokio::test]
    async fn test_batch_row_survives_item_failures() {
        let server = MockServer::start().await;
        mount_json(&server, "/user/dave.json", json!({"karma": 42, "submitted": [1, 2, 3, 4]})).await;
        mount_json(&server, "/item/4.json", json!({"type": "story", "score": 8})).await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let output = dir.path().join("out.csv");

        let summary = runner_for(&server)
            .run_batch(&users(&["dave"]), &output, &ScoringMode::default(), false)
            .await
            .unwrap();

        assert_eq!(summary.written, 1);
        let content = std::fs::read_to_string(&output).unwrap();
        assert!(content.ends_with("dave,4,1,42\n"));
    }

    #[tokio::test]
    async fn test_batch_writes_each_username_once() {
        let server = MockServer::start().await;
        mount_alice(&server).await;

        let dir = TempDir::new().unwrap();
        let output = dir.path().join("out.csv");

        let summary = runner_for(&server)
            .run_batch(&users(&["alice", "alice"]), &output, &ScoringMode::default(), false)
            .await
            .unwrap();

        assert_eq!(summary.written, 1);
        assert_eq!(summary.skipped, 1);
    }

    #[tokio::test]
    async fn test_repeated_failure_counts_as_failed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user/ghost.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::Value::Null))
            .expect(1)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let output = dir.path().join("out.csv");

        let summary = runner_for(&server)
            .run_batch(&users(&["ghost", "ghost"]), &output, &ScoringMode::default(), false)
            .await
            .unwrap();

        assert_eq!(summary.written, 0);
        assert_eq!(summary.failed, vec!["ghost".to_string(), "ghost".to_string()]);
        assert_eq!(summary.skipped, 0);
    }

    #[tokio::test]
    async fn test_resume_skips_completed_users() {
        let server = MockServer::start().await;
        mount_alice(&server).await;
        Mock::given(method("GET"))
            .and(path("/user/pg.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"karma": 1, "submitted": []})))
            .expect(0)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let output = dir.path().join("out.csv");
        std::fs::write(
            &output,
            "username,submission_count,rank_statistic,karma\npg,100,50,150000\n",
        )
        .unwrap();

        let summary = runner_for(&server)
            .run_batch(&users(&["pg", "alice"]), &output, &ScoringMode::default(), true)
            .await
            .unwrap();

        assert_eq!(summary.written, 1);
        assert_eq!(summary.skipped, 1);

        let content = std::fs::read_to_string(&output).unwrap();
        assert_eq!(content.lines().count(), 3);
        assert!(content.ends_with("pg,100,50,150000\nalice,3,2,100\n"));
    }

    #[tokio::test]
    async fn test_without_resume_existing_rows_are_kept() {
        let server = MockServer::start().await;
        mount_alice(&server).await;

        let dir = TempDir::new().unwrap();
        let output = dir.path().join("out.csv");
        std::fs::write(
            &output,
            "username,submission_count,rank_statistic,karma\nalice,3,2,100\n",
        )
        .unwrap();

        runner_for(&server)
            .run_batch(&users(&["alice"]), &output, &ScoringMode::default(), false)
            .await
            .unwrap();

        let content = std::fs::read_to_string(&output).unwrap();
        assert_eq!(content.matches("alice,3,2,100").count(), 2);
    }

    #[test]
    fn test_user_state_display() {
        let mut state = UserState::Pending;
        transition("alice", &mut state, UserState::Resolving);
        assert_eq!(state, UserState::Resolving);
        assert_eq!(UserState::Written.to_string(), "written");
    }
}
