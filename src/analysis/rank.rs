//! The h-index style rank statistic.

/// Largest `h` such that at least `h` scores are each `>= h`.
///
/// Returns 0 for an empty slice. The input order does not matter.
pub fn rank_statistic(scores: &[u64]) -> usize {
    let mut sorted = scores.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));

    sorted
        .iter()
        .enumerate()
        .take_while(|&(i, &score)| score >= i as u64 + 1)
        .count()
}
