// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Client library for the grazing-quality pipeline backend.
//!
//! The backend exposes a small HTTP surface:
//!
//! - `GET /runs` lists completed runs, newest first
//! - `POST /run` runs the pipeline and returns a receipt
//! - `GET /tile/{z}/{x}/{y}.png?run={run}` serves classification tiles
//! - `GET /health` and `GET /summary/{run}` for status and per-class areas
//!
//! [`BackendClient`] wraps these as async calls. Failures are returned as
//! [`ClientError`] and never retried.
//!
//! # Quick Start
//!
//! ```no_run
//! use grazing_client::{BackendClient, ClientConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), grazing_client::ClientError> {
//!     let client = BackendClient::new(ClientConfig::default())?;
//!
//!     let runs = client.list_runs().await?;
//!     if let Some(latest) = runs.first() {
//!         println!("{}", client.tile_url(12, 3456, 2211, Some(latest.as_str())));
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod runs;
pub mod tiles;

use std::time::Duration;

use log::debug;
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;

pub use error::ClientError;
pub use reqwest::StatusCode;
pub use runs::{ClassArea, HealthStatus, RunId, RunReceipt, RunSummary};

use runs::RunList;

/// Backend address used when nothing else is configured.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

/// Environment variable that selects the backend address.
pub const BACKEND_URL_ENV: &str = "GRAZING_BACKEND_URL";

/// Configuration for [`BackendClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base address, e.g. `http://localhost:8000`. A trailing slash is ignored.
    pub base_url: String,
    /// Timeout for list, health and summary requests.
    pub request_timeout: Duration,
    /// Timeout for `POST /run`, which trains and infers before answering.
    pub trigger_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BACKEND_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            trigger_timeout: Duration::from_secs(300),
        }
    }
}

/// Stateless async client for the pipeline backend.
///
/// Cloning is cheap; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct BackendClient {
    base_url: String,
    http: reqwest::Client,
    request_timeout: Duration,
    trigger_timeout: Duration,
}

impl BackendClient {
    /// Create a client for the configured backend.
    ///
    /// Fails if the base address is not an absolute http(s) URL.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let base_url = normalize_base_url(&config.base_url)?;
        let http = reqwest::Client::builder().build()?;

        Ok(Self {
            base_url,
            http,
            request_timeout: config.request_timeout,
            trigger_timeout: config.trigger_timeout,
        })
    }

    /// Normalized base address (no trailing slash).
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// List completed run ids in the order the backend returns them.
    pub async fn list_runs(&self) -> Result<Vec<RunId>, ClientError> {
        let list: RunList = self
            .request_json(Method::GET, "/runs", self.request_timeout)
            .await?;
        debug!("Backend listed {} runs", list.runs.len());
        Ok(list.runs)
    }

    /// Trigger a pipeline run and wait for the backend's acknowledgement.
    pub async fn trigger_run(&self) -> Result<RunReceipt, ClientError> {
        let raw: serde_json::Value = self
            .request_json(Method::POST, "/run", self.trigger_timeout)
            .await?;
        Ok(RunReceipt::from_value(raw))
    }

    /// Query the backend health endpoint.
    pub async fn health(&self) -> Result<HealthStatus, ClientError> {
        self.request_json(Method::GET, "/health", self.request_timeout)
            .await
    }

    /// Fetch the per-class area summary of one run.
    pub async fn run_summary(&self, run: &RunId) -> Result<RunSummary, ClientError> {
        let path = format!("/summary/{run}");
        self.request_json(Method::GET, &path, self.request_timeout)
            .await
    }

    /// URL of one classification tile. No network call is made.
    #[must_use]
    pub fn tile_url(&self, z: i64, x: i64, y: i64, run: Option<&str>) -> String {
        tiles::tile_url(&self.base_url, z, x, y, run)
    }

    /// Tile URL template with `{z}`, `{x}` and `{y}` placeholders.
    #[must_use]
    pub fn tile_url_template(&self, run: Option<&str>) -> String {
        tiles::tile_url_template(&self.base_url, run)
    }

    async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        timeout: Duration,
    ) -> Result<T, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("{method} {url}");

        let response = self
            .http
            .request(method, &url)
            .timeout(timeout)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound { url });
        }
        if !status.is_success() {
            return Err(ClientError::Status { status, url });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|source| ClientError::Decode { url, source })
    }
}

fn normalize_base_url(raw: &str) -> Result<String, ClientError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let parsed = Url::parse(trimmed).map_err(|e| ClientError::InvalidBaseUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ClientError::InvalidBaseUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }

    Ok(trimmed.to_string())
}
