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

//! Error types for backend requests.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors returned by [`crate::BackendClient`] operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The configured base address is not a usable http(s) URL.
    #[error("invalid backend URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// The backend could not be reached, or the connection failed mid-request.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered 404 for the requested resource.
    #[error("not found: {url}")]
    NotFound { url: String },

    /// The backend answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { status: StatusCode, url: String },

    /// The response body was not the JSON shape we expected.
    #[error("malformed response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ClientError {
    /// True when the failure happened before any HTTP response was received.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport(_))
    }

    /// HTTP status of the failed response, if there was one.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::NotFound { .. } => Some(StatusCode::NOT_FOUND),
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
