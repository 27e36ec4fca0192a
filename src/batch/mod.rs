//! Single-user and batch runs.
//!
//! This module loads username lists, drives the pipeline per user and
//! persists one CSV row per completed user.

pub mod input;
pub mod output;
pub mod runner;

pub use input::load_usernames;
pub use output::output_path_for;
pub use runner::BatchRunner;
