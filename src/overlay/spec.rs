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

//! Overlay description and the surface it is mounted on.

use grazing_client::{BackendClient, RunId};

/// Classification tiles are standard 256px slippy-map tiles
pub const OVERLAY_TILE_SIZE: u32 = 256;

/// Deepest zoom the overlay requests tiles for
pub const OVERLAY_MAX_ZOOM: u8 = 19;

pub const OVERLAY_ATTRIBUTION: &str = "Classification overlay";

/// Everything needed to mount one classification overlay layer
#[derive(Debug, Clone, PartialEq)]
pub struct OverlaySpec {
    pub run: RunId,
    /// Backend base address the tiles are fetched from
    pub base_url: String,
    /// Tile URL with `{z}`, `{x}` and `{y}` placeholders
    pub url_template: String,
    /// Layer opacity in `[0, 1]`
    pub opacity: f32,
    pub tile_size: u32,
    pub max_zoom: u8,
    pub attribution: &'static str,
}

impl OverlaySpec {
    /// The overlay that should be mounted for a selection, if any.
    ///
    /// Pure function of its inputs: no run selected means no overlay.
    pub fn for_selection(run: Option<&RunId>, opacity: f32, client: &BackendClient) -> Option<Self> {
        let run = run?;
        Some(Self {
            run: run.clone(),
            base_url: client.base_url().to_string(),
            url_template: client.tile_url_template(Some(run.as_str())),
            opacity: opacity.clamp(0.0, 1.0),
            tile_size: OVERLAY_TILE_SIZE,
            max_zoom: OVERLAY_MAX_ZOOM,
            attribution: OVERLAY_ATTRIBUTION,
        })
    }
}

/// A map surface that can host one classification overlay.
///
/// The handle returned by `mount_overlay` is the only way to remove the layer
/// again; `unmount_overlay` consumes it.
pub trait OverlaySurface {
    type Handle: std::fmt::Debug;

    fn mount_overlay(&mut self, spec: &OverlaySpec) -> Self::Handle;

    fn unmount_overlay(&mut self, handle: Self::Handle);
}

#[cfg(test)]
mod tests {
    use super::*;
    use grazing_client::ClientConfig;

    fn client() -> BackendClient {
        BackendClient::new(ClientConfig {
            base_url: "http://backend.test".to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_no_run_means_no_overlay() {
        assert!(OverlaySpec::for_selection(None, 0.7, &client()).is_none());
    }

    #[test]
    fn test_spec_for_selected_run() {
        let run = RunId::from("r1");
        let spec = OverlaySpec::for_selection(Some(&run), 1.4, &client()).unwrap();

        assert_eq!(spec.run, run);
        assert_eq!(spec.url_template, "http://backend.test/tile/{z}/{x}/{y}.png?run=r1");
        assert!((spec.opacity - 1.0).abs() < f32::EPSILON);
        assert_eq!(spec.tile_size, 256);
    }
}
