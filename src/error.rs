//! Error types for resolving users, fetching items and reading input.
//!
//! Each error kind is absorbed at a different boundary: item errors inside
//! the collector, user errors inside the batch runner, and input errors in
//! `main` before anything is fetched.

use crate::models::ItemId;
use std::path::PathBuf;
use thiserror::Error;

/// Failure to resolve a username into a user record.
#[derive(Debug, Error)]
pub enum ResolutionError {
    /// The user endpoint returned `null`.
    #[error("user '{0}' not found")]
    NotFound(String),

    /// The record came back without a `submitted` list.
    #[error("malformed user record for '{username}': {reason}")]
    Malformed { username: String, reason: String },

    /// Non-success HTTP status.
    #[error("API returned {status} for user '{username}'")]
    Status { username: String, status: u16 },

    /// Connection, timeout or body read failure.
    #[error("network error resolving '{username}': {source}")]
    Network {
        username: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Failure to fetch or decode a single item.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("item {0} not found")]
    NotFound(ItemId),

    #[error("API returned {status} for item {id}")]
    Status { id: ItemId, status: u16 },

    #[error("malformed item {id}: {source}")]
    Malformed {
        id: ItemId,
        #[source]
        source: serde_json::Error,
    },

    #[error("network error fetching item {id}: {source}")]
    Network {
        id: ItemId,
        #[source]
        source: reqwest::Error,
    },
}

/// Problems with the username input that abort the whole invocation.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("no input supplied: pass --user and/or --file")]
    Missing,

    #[error("failed to read username list {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("username list {0} contains no usernames")]
    Empty(PathBuf),

    #[error("invalid username {name:?} on line {line} of {path}")]
    InvalidUsername {
        path: PathBuf,
        line: usize,
        name: String,
    },
}
