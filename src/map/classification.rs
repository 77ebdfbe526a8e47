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

//! Classification overlay tile source.

use grazing_client::{tiles, RunId};
use walkers::sources::{Attribution, TileSource};
use walkers::TileId;

use crate::overlay::OverlaySpec;

/// Tile source serving one run's classification tiles from the backend
#[derive(Debug, Clone)]
pub struct ClassificationTileSource {
    base_url: String,
    run: RunId,
    tile_size: u32,
    max_zoom: u8,
    attribution: &'static str,
}

impl ClassificationTileSource {
    pub fn new(spec: &OverlaySpec) -> Self {
        Self {
            base_url: spec.base_url.clone(),
            run: spec.run.clone(),
            tile_size: spec.tile_size,
            max_zoom: spec.max_zoom,
            attribution: spec.attribution,
        }
    }
}

impl TileSource for ClassificationTileSource {
    fn tile_url(&self, tile_id: TileId) -> String {
        tiles::tile_url(&self.base_url, tile_id.zoom, tile_id.x, tile_id.y, Some(self.run.as_str()))
    }

    fn attribution(&self) -> Attribution {
        Attribution {
            text: self.attribution,
            url: "",
            logo_light: None,
            logo_dark: None,
        }
    }

    fn tile_size(&self) -> u32 {
        self.tile_size
    }

    fn max_zoom(&self) -> u8 {
        self.max_zoom
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grazing_client::{BackendClient, ClientConfig};

    #[test]
    fn test_tile_url_matches_client() {
        let client = BackendClient::new(ClientConfig {
            base_url: "http://backend.test".to_string(),
            ..Default::default()
        })
        .unwrap();
        let run = RunId::from("run-abc");
        let spec = OverlaySpec::for_selection(Some(&run), 0.7, &client).unwrap();
        let source = ClassificationTileSource::new(&spec);

        assert_eq!(
            source.tile_url(TileId { x: 10, y: 20, zoom: 5 }),
            client.tile_url(5, 10, 20, Some("run-abc"))
        );
        assert_eq!(source.max_zoom(), 19);
    }

    #[test]
    fn test_run_id_with_braces_is_not_substituted() {
        let client = BackendClient::new(ClientConfig {
            base_url: "http://backend.test".to_string(),
            ..Default::default()
        })
        .unwrap();
        let run = RunId::from("odd{x}{z}run");
        let spec = OverlaySpec::for_selection(Some(&run), 0.7, &client).unwrap();
        let source = ClassificationTileSource::new(&spec);

        assert_eq!(
            source.tile_url(TileId { x: 1, y: 2, zoom: 3 }),
            "http://backend.test/tile/3/1/2.png?run=odd{x}{z}run"
        );
    }
}
