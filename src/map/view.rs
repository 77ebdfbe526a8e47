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

//! The map widget: OSM base layer, property boundary and at most one
//! classification overlay.

use std::path::PathBuf;

use egui::{Response, Ui};
use log::{debug, warn};
use walkers::{lon_lat, HttpOptions, HttpTiles, Map, MapMemory, Position};

use super::classification::ClassificationTileSource;
use super::osm::OpenStreetMapSource;
use super::property::{PropertyLayer, ReferencePolygon};
use crate::overlay::{OverlaySpec, OverlaySurface};

/// Initial view over the demo property
const HOME_LAT: f64 = -14.3;
const HOME_LON: f64 = 137.4;
const HOME_ZOOM: f64 = 12.0;

/// Identifies the overlay layer currently held by a [`MapView`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayHandle(u64);

struct MountedTiles {
    id: u64,
    tiles: HttpTiles,
    opacity: f32,
    run: String,
}

pub struct MapView {
    ctx: egui::Context,
    base_tiles: HttpTiles,
    memory: MapMemory,
    home: Position,
    property: ReferencePolygon,
    popup_open: bool,
    overlay: Option<MountedTiles>,
    next_id: u64,
}

impl std::fmt::Debug for MapView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapView")
            .field("overlay_run", &self.overlay.as_ref().map(|o| o.run.as_str()))
            .field("popup_open", &self.popup_open)
            .finish_non_exhaustive()
    }
}

impl MapView {
    pub fn new(ctx: &egui::Context) -> Self {
        let http_options = HttpOptions {
            cache: Some(tile_cache_dir().join("osm")),
            ..Default::default()
        };
        let base_tiles = HttpTiles::with_options(OpenStreetMapSource, http_options, ctx.clone());

        let mut memory = MapMemory::default();
        if let Err(e) = memory.set_zoom(HOME_ZOOM) {
            warn!("Could not set initial zoom {HOME_ZOOM}: {e:?}");
        }

        Self {
            ctx: ctx.clone(),
            base_tiles,
            memory,
            home: lon_lat(HOME_LON, HOME_LAT),
            property: ReferencePolygon::lorella_springs(),
            popup_open: false,
            overlay: None,
            next_id: 0,
        }
    }

    /// Draw the map filling the available space
    pub fn show(&mut self, ui: &mut Ui) -> Response {
        let mut map = Map::new(Some(&mut self.base_tiles), &mut self.memory, self.home);

        if let Some(overlay) = self.overlay.as_mut() {
            map = map.with_layer(&mut overlay.tiles, overlay.opacity);
        }

        map = map.with_plugin(PropertyLayer {
            polygon: &self.property,
            popup_open: &mut self.popup_open,
        });

        ui.add(map)
    }
}

impl OverlaySurface for MapView {
    type Handle = OverlayHandle;

    fn mount_overlay(&mut self, spec: &OverlaySpec) -> OverlayHandle {
        if let Some(existing) = &self.overlay {
            warn!(
                "Mounting overlay for {} while {} is still mounted, replacing it",
                spec.run, existing.run
            );
        }

        let http_options = HttpOptions {
            cache: Some(
                tile_cache_dir()
                    .join("classification")
                    .join(cache_key(spec.run.as_str())),
            ),
            ..Default::default()
        };
        let source = ClassificationTileSource::new(spec);
        let tiles = HttpTiles::with_options(source, http_options, self.ctx.clone());

        let id = self.next_id;
        self.next_id += 1;
        self.overlay = Some(MountedTiles {
            id,
            tiles,
            opacity: spec.opacity,
            run: spec.run.to_string(),
        });
        debug!("Mounted overlay {id} for run {} at opacity {:.2}", spec.run, spec.opacity);
        self.ctx.request_repaint();

        OverlayHandle(id)
    }

    fn unmount_overlay(&mut self, handle: OverlayHandle) {
        match &self.overlay {
            Some(mounted) if mounted.id == handle.0 => {
                debug!("Unmounted overlay {} for run {}", mounted.id, mounted.run);
                self.overlay = None;
                self.ctx.request_repaint();
            }
            _ => debug!("Overlay {} already gone", handle.0),
        }
    }
}

fn tile_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join("grazing-mapper")
}

/// Run ids become directory names. Bytes outside `[A-Za-z0-9-]` are escaped
/// as `_XX` so distinct ids never share a cache directory.
fn cache_key(run: &str) -> String {
    if run.is_empty() {
        return "_".to_string();
    }
    let mut key = String::with_capacity(run.len());
    for byte in run.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            key.push(char::from(byte));
        } else {
            key.push_str(&format!("_{byte:02X}"));
        }
    }
    key
}
