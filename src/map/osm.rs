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

use walkers::sources::{Attribution, TileSource};
use walkers::TileId;

/// Deepest zoom served by the public OSM tile servers
pub const OSM_MAX_ZOOM: u8 = 19;

/// Tile source for the public OpenStreetMap base map
/// Uses subdomain load balancing across a-c.tile.openstreetmap.org
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenStreetMapSource;

impl OpenStreetMapSource {
    fn subdomain(tile_id: TileId) -> char {
        ['a', 'b', 'c'][((tile_id.x + tile_id.y) % 3) as usize]
    }
}

impl TileSource for OpenStreetMapSource {
    fn tile_url(&self, tile_id: TileId) -> String {
        format!(
            "https://{}.tile.openstreetmap.org/{}/{}/{}.png",
            Self::subdomain(tile_id),
            tile_id.zoom,
            tile_id.x,
            tile_id.y
        )
    }

    fn attribution(&self) -> Attribution {
        Attribution {
            text: "© OpenStreetMap contributors",
            url: "https://www.openstreetmap.org/copyright",
            logo_light: None,
            logo_dark: None,
        }
    }

    fn max_zoom(&self) -> u8 {
        OSM_MAX_ZOOM
    }
}
