//! Concurrent score collection for one user.
//!
//! Every submitted item is fetched through a single stream capped at
//! `concurrency` requests in flight. Results are folded into the
//! [`ScoreSet`] by the stream's consumer as they arrive, so no locking is
//! needed. A failed fetch is counted and dropped; it never cancels the
//! remaining fetches.

use crate::api::HnClient;
use crate::models::{ItemId, ScoreSet, ScoringMode};
use crate::progress::ProgressObserver;
use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

/// Outcome of collecting one user's items.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    /// Eligible scores.
    pub scores: ScoreSet,
    /// Items fetched successfully, eligible or not.
    pub fetched: usize,
    /// Items whose fetch failed and were dropped.
    pub failed: usize,
}

/// Fans out item fetches for a user and accumulates eligible scores.
pub struct ScoreCollector<'a> {
    client: &'a HnClient,
    concurrency: usize,
    mode: ScoringMode,
}

impl<'a> ScoreCollector<'a> {
    pub fn new(client: &'a HnClient, concurrency: usize, mode: ScoringMode) -> Self {
        Self {
            client,
            concurrency: concurrency.max(1),
            mode,
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn mode(&self) -> &ScoringMode {
        &self.mode
    }

    /// Fetch every item in `submitted` and collect the eligible scores.
    pub async fn collect(&self, submitted: &[ItemId], observer: &dyn ProgressObserver) -> Collection {
        let client = self.client;
        let mut results = stream::iter(submitted.iter().copied())
            .map(|id| async move { (id, client.fetch_item(id).await) })
            .buffer_unordered(self.concurrency);

        let mut collection = Collection::default();

        while let Some((id, result)) = results.next().await {
            match result {
                Ok(item) => {
                    collection.fetched += 1;
                    if !collection.scores.record(&item, &self.mode) {
                        debug!("Item {} not eligible", id);
                    }
                }
                Err(e) => {
                    collection.failed += 1;
                    debug!("Dropping item {}: {}", id, e);
                }
            }
            observer.advance();
        }

        observer.finish();

        if collection.failed > 0 {
            warn!(
                "{} of {} item fetches failed and were skipped",
                collection.failed,
                submitted.len()
            );
        }

        collection
    }
}
