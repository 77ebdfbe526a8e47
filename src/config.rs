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

//! Application configuration management.
//!
//! Start-up preferences live in a TOML file managed by confy. The backend
//! address can additionally come from the `GRAZING_BACKEND_URL` environment
//! variable or the `--backend-url` flag. Run selection and overlay state are
//! never written here.

use std::time::Duration;

use grazing_client::{ClientConfig, BACKEND_URL_ENV, DEFAULT_BACKEND_URL};
use serde::{Deserialize, Serialize};

const APP_NAME: &str = "grazing-mapper";
const CONFIG_NAME: &str = "config";

/// Where the effective backend address came from, for display in the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendUrlSource {
    CommandLine,
    Environment,
    ConfigFile,
    Default,
}

impl BackendUrlSource {
    pub fn describe(self) -> &'static str {
        match self {
            BackendUrlSource::CommandLine => "command line",
            BackendUrlSource::Environment => "environment variable",
            BackendUrlSource::ConfigFile => "config file",
            BackendUrlSource::Default => "default",
        }
    }
}

/// Application configuration stored in TOML format
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    /// Backend base address (env var and CLI take precedence)
    #[serde(default)]
    pub backend_url: Option<String>,

    /// Initial classification overlay opacity (0.0 - 1.0)
    #[serde(default = "default_overlay_opacity")]
    pub overlay_opacity: f32,

    /// Timeout for list/summary/health requests, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Timeout for triggering a pipeline run, in seconds
    #[serde(default = "default_trigger_timeout_secs")]
    pub trigger_timeout_secs: u64,
}

// Default value functions for serde
fn default_overlay_opacity() -> f32 {
    0.7
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_trigger_timeout_secs() -> u64 {
    300
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend_url: None,
            overlay_opacity: default_overlay_opacity(),
            request_timeout_secs: default_request_timeout_secs(),
            trigger_timeout_secs: default_trigger_timeout_secs(),
        }
    }
}

impl AppConfig {
    /// Load configuration from disk
    pub fn load() -> Result<Self, confy::ConfyError> {
        confy::load(APP_NAME, CONFIG_NAME)
    }

    /// Get the config file path for display to user
    pub fn get_config_path() -> Result<std::path::PathBuf, confy::ConfyError> {
        confy::get_configuration_file_path(APP_NAME, CONFIG_NAME)
    }

    /// Resolve the backend address: CLI flag, then environment, then config file.
    pub fn resolve_backend_url(&self, cli_url: Option<&str>) -> (String, BackendUrlSource) {
        let env_url = std::env::var(BACKEND_URL_ENV).ok();
        self.resolve_backend_url_from(cli_url, env_url.as_deref())
    }

    fn resolve_backend_url_from(
        &self,
        cli_url: Option<&str>,
        env_url: Option<&str>,
    ) -> (String, BackendUrlSource) {
        let non_empty = |s: &&str| !s.trim().is_empty();

        if let Some(url) = cli_url.filter(non_empty) {
            return (url.to_string(), BackendUrlSource::CommandLine);
        }
        if let Some(url) = env_url.filter(non_empty) {
            return (url.to_string(), BackendUrlSource::Environment);
        }
        if let Some(url) = self.backend_url.as_deref().filter(non_empty) {
            return (url.to_string(), BackendUrlSource::ConfigFile);
        }
        (DEFAULT_BACKEND_URL.to_string(), BackendUrlSource::Default)
    }

    /// Initial overlay opacity, clamped to the valid range
    pub fn initial_opacity(&self) -> f32 {
        if self.overlay_opacity.is_finite() {
            self.overlay_opacity.clamp(0.0, 1.0)
        } else {
            default_overlay_opacity()
        }
    }

    /// Build the backend client configuration for the given address
    pub fn client_config(&self, base_url: String) -> ClientConfig {
        ClientConfig {
            base_url,
            request_timeout: Duration::from_secs(self.request_timeout_secs.max(1)),
            trigger_timeout: Duration::from_secs(self.trigger_timeout_secs.max(1)),
        }
    }
}
