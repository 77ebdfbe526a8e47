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

//! Classification tile URL convention.
//!
//! Tiles are served at `{base}/tile/{z}/{x}/{y}.png`, optionally scoped to a
//! run with `?run={run}`. Construction is pure string formatting: coordinates
//! are not range-checked and the run id is passed through as-is.

use std::fmt::Display;

/// Placeholder for the zoom level in a tile URL template.
pub const ZOOM_PLACEHOLDER: &str = "{z}";
/// Placeholder for the tile column in a tile URL template.
pub const X_PLACEHOLDER: &str = "{x}";
/// Placeholder for the tile row in a tile URL template.
pub const Y_PLACEHOLDER: &str = "{y}";

/// Build a tile URL against `base`.
///
/// An empty run is treated the same as no run.
pub fn tile_url<Z, X, Y>(base: &str, z: Z, x: X, y: Y, run: Option<&str>) -> String
where
    Z: Display,
    X: Display,
    Y: Display,
{
    let mut url = format!("{base}/tile/{z}/{x}/{y}.png");
    if let Some(run) = run.filter(|r| !r.is_empty()) {
        url.push_str("?run=");
        url.push_str(run);
    }
    url
}

/// Build a tile URL template with literal `{z}`, `{x}` and `{y}` placeholders.
#[must_use]
pub fn tile_url_template(base: &str, run: Option<&str>) -> String {
    tile_url(base, ZOOM_PLACEHOLDER, X_PLACEHOLDER, Y_PLACEHOLDER, run)
}
