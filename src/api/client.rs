//! Read-only client for the Hacker News item-tracker API.
//!
//! Two endpoints are used: `user/{name}.json` resolves a username and
//! `item/{id}.json` fetches one submission. Both return the literal
//! `null` for unknown keys.

use crate::config::ApiConfig;
use crate::error::{FetchError, ResolutionError};
use crate::models::{Item, ItemId, User};
use anyhow::{Context, Result};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

/// HTTP client shared by every request of a run.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct HnClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl HnClient {
    /// Build a client with the configured timeout.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        info!("Using item-tracker API at {}", config.base_url);

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("hn-index/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Resolve a username into its karma and submission list.
    pub async fn fetch_user(&self, username: &str) -> Result<User, ResolutionError> {
        let url = format!(
            "{}/user/{}.json",
            self.base_url,
            urlencoding::encode(username)
        );
        debug!("GET {}", url);

        let network = |source: reqwest::Error| ResolutionError::Network {
            username: username.to_string(),
            source,
        };

        let response = self.http_client.get(&url).send().await.map_err(network)?;

        if !response.status().is_success() {
            return Err(ResolutionError::Status {
                username: username.to_string(),
                status: response.status().as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(network)?;
        let malformed = |reason: String| ResolutionError::Malformed {
            username: username.to_string(),
            reason,
        };

        let body: Value = serde_json::from_slice(&bytes).map_err(|e| malformed(e.to_string()))?;
        if body.is_null() {
            return Err(ResolutionError::NotFound(username.to_string()));
        }

        serde_json::from_value(body).map_err(|e| malformed(e.to_string()))
    }

    /// Fetch a single item.
    pub async fn fetch_item(&self, id: ItemId) -> Result<Item, FetchError> {
        let url = format!("{}/item/{}.json", self.base_url, id);

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|source| FetchError::Network { id, source })?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                id,
                status: response.status().as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|source| FetchError::Network { id, source })?;

        let body: Value =
            serde_json::from_slice(&bytes).map_err(|source| FetchError::Malformed { id, source })?;
        if body.is_null() {
            return Err(FetchError::NotFound(id));
        }

        serde_json::from_value(body).map_err(|source| FetchError::Malformed { id, source })
    }
}
