//! Fetch progress reporting.
//!
//! The collector only talks to [`ProgressObserver`]; the terminal bar is
//! one implementation of it.

use indicatif::{ProgressBar, ProgressStyle};
#[cfg(test)]
use std::sync::atomic::{AtomicU64, Ordering};

/// Receives one notification per resolved item fetch.
pub trait ProgressObserver {
    /// One more item finished, successfully or not.
    fn advance(&self);

    /// Every item for the current user has finished.
    fn finish(&self) {}
}

impl ProgressObserver for ProgressBar {
    fn advance(&self) {
        self.inc(1);
    }

    fn finish(&self) {
        self.finish_and_clear();
    }
}

/// Count-style bar for one user's item fetches.
///
/// Returns a hidden bar when `visible` is false so callers need no branch.
pub fn item_progress_bar(username: &str, total: u64, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(total);
    let style = ProgressStyle::with_template(
        "{spinner:.green} {msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("#>-");
    pb.set_style(style);
    pb.set_message(format!("Fetching {}'s items", username));
    pb
}

/// Observer that only counts completions.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct CountingObserver {
    completed: AtomicU64,
}

#[cfg(test)]
impl CountingObserver {
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
impl ProgressObserver for CountingObserver {
    fn advance(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counting_observer() {
        let observer = CountingObserver::default();
        observer.advance();
        observer.advance();
        observer.finish();
        assert_eq!(observer.completed(), 2);
    }

    #[test]
    fn test_hidden_bar_tracks_position() {
        let pb = item_progress_bar("alice", 3, false);
        pb.advance();
        assert_eq!(pb.position(), 1);
        assert!(pb.is_hidden());
    }
}
