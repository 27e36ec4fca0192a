//! Item-tracker API access.

pub mod client;

pub use client::HnClient;
