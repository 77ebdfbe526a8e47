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

//! Pipeline run payloads: identifiers, receipts and per-class summaries.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Folder naming scheme the backend uses for run ids.
const RUN_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H-%M-%SZ";

/// Opaque identifier of one completed pipeline execution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Timestamp encoded in the id, when it follows the backend's folder naming.
    #[must_use]
    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.0, RUN_TIMESTAMP_FORMAT).ok()
    }

    /// Human-readable label for selectors. Falls back to the raw id.
    #[must_use]
    pub fn label(&self) -> String {
        match self.timestamp() {
            Some(ts) => ts.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            None => self.0.clone(),
        }
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RunId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RunId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for RunId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Body of `GET /runs`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RunList {
    pub runs: Vec<RunId>,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

impl HealthStatus {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }
}

/// Pixel count and approximate area of one classification class.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ClassArea {
    #[serde(rename = "class")]
    pub class_code: u8,
    #[serde(default)]
    pub pixels: u64,
    #[serde(default)]
    pub approx_area_m2: f64,
}

/// Per-class area summary written by a run.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RunSummary {
    /// ISO-8601 time the summary was produced, as reported by the backend.
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub classes: Vec<ClassArea>,
}

impl RunSummary {
    #[must_use]
    pub fn total_pixels(&self) -> u64 {
        self.classes.iter().map(|c| c.pixels).sum()
    }

    #[must_use]
    pub fn total_area_m2(&self) -> f64 {
        self.classes.iter().map(|c| c.approx_area_m2).sum()
    }

    /// Share of classified pixels in `class_code`, in `[0, 1]`.
    #[must_use]
    #[allow(clippy::cast_precision_loss, reason = "pixel counts are far below 2^52")]
    pub fn pixel_fraction(&self, class_code: u8) -> f64 {
        let total = self.total_pixels();
        if total == 0 {
            return 0.0;
        }
        let pixels: u64 = self
            .classes
            .iter()
            .filter(|c| c.class_code == class_code)
            .map(|c| c.pixels)
            .sum();
        pixels as f64 / total as f64
    }
}

/// Acknowledgement returned by `POST /run`.
///
/// The payload is backend-defined; the well-known fields are picked out when
/// present and the full document is kept in `raw`.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReceipt {
    pub folder: Option<String>,
    pub summary: Option<RunSummary>,
    pub raw: Value,
}

impl RunReceipt {
    #[must_use]
    pub fn from_value(raw: Value) -> Self {
        let folder = raw.get("folder").and_then(Value::as_str).map(str::to_owned);
        let summary = raw
            .get("summary")
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok());
        Self { folder, summary, raw }
    }

    /// Run id derived from the output folder's last path component.
    #[must_use]
    pub fn run_id(&self) -> Option<RunId> {
        let folder = self.folder.as_deref()?;
        folder
            .rsplit(['/', '\\'])
            .find(|part| !part.is_empty())
            .map(RunId::from)
    }
}
