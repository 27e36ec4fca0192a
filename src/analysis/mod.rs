//! Score analysis.
//!
//! Pure functions over collected scores; no I/O happens here.

pub mod rank;

pub use rank::rank_statistic;
