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

//! Fixed property boundary drawn over the map, with a click popup.

use egui::{Color32, Pos2, Response, Stroke, Ui};
use walkers::{lon_lat, MapMemory, Plugin, Projector};

/// Approximate boundary of the demo property, as (lat, lon) corners
const LORELLA_SPRINGS: [(f64, f64); 4] = [
    (-14.2, 137.3),
    (-14.2, 137.5),
    (-14.4, 137.5),
    (-14.4, 137.3),
];

const BOUNDARY_COLOR: Color32 = Color32::from_rgb(255, 255, 0);
const BOUNDARY_WIDTH: f32 = 2.0;

/// A named polygon in geographic coordinates
#[derive(Debug, Clone)]
pub struct ReferencePolygon {
    pub label: &'static str,
    /// Corners as (lat, lon), in drawing order
    pub corners: Vec<(f64, f64)>,
}

impl ReferencePolygon {
    /// The Lorella Springs demo property
    pub fn lorella_springs() -> Self {
        Self {
            label: "Lorella Springs (approx)",
            corners: LORELLA_SPRINGS.to_vec(),
        }
    }

    /// Even-odd ray casting test on (lat, lon)
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        let n = self.corners.len();
        if n < 3 {
            return false;
        }

        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let (lat_i, lon_i) = self.corners[i];
            let (lat_j, lon_j) = self.corners[j];
            if (lat_i > lat) != (lat_j > lat)
                && lon < (lon_j - lon_i) * (lat - lat_i) / (lat_j - lat_i) + lon_i
            {
                inside = !inside;
            }
            j = i;
        }
        inside
    }

    /// Mean of the corners, where the popup is anchored
    #[allow(clippy::cast_precision_loss, reason = "a handful of corners")]
    pub fn centroid(&self) -> (f64, f64) {
        let n = self.corners.len().max(1) as f64;
        let (lat, lon) = self
            .corners
            .iter()
            .fold((0.0, 0.0), |(a, b), (lat, lon)| (a + lat, b + lon));
        (lat / n, lon / n)
    }

    /// Topmost latitude, used to place the popup above the shape
    pub fn north(&self) -> f64 {
        self.corners
            .iter()
            .map(|(lat, _)| *lat)
            .fold(f64::NEG_INFINITY, f64::max)
    }
}

/// Plugin drawing the boundary and toggling its popup on click
#[derive(Debug)]
pub struct PropertyLayer<'a> {
    pub polygon: &'a ReferencePolygon,
    pub popup_open: &'a mut bool,
}

impl Plugin for PropertyLayer<'_> {
    fn run(
        self: Box<Self>,
        ui: &mut Ui,
        response: &Response,
        projector: &Projector,
        _memory: &MapMemory,
    ) {
        let points: Vec<Pos2> = self
            .polygon
            .corners
            .iter()
            .map(|(lat, lon)| projector.project(lon_lat(*lon, *lat)).to_pos2())
            .collect();

        let painter = ui.painter();
        painter.add(egui::Shape::convex_polygon(
            points,
            Color32::from_rgba_unmultiplied(255, 255, 0, 51),
            Stroke::new(BOUNDARY_WIDTH, BOUNDARY_COLOR),
        ));

        // Click inside toggles the popup, click elsewhere closes it
        if response.clicked() {
            if let Some(click_pos) = response.interact_pointer_pos() {
                let position = projector.unproject(click_pos.to_vec2());
                if self.polygon.contains(position.y(), position.x()) {
                    *self.popup_open = !*self.popup_open;
                } else {
                    *self.popup_open = false;
                }
            }
        }

        if !*self.popup_open {
            return;
        }

        let (_, center_lon) = self.polygon.centroid();
        let anchor = projector
            .project(lon_lat(center_lon, self.polygon.north()))
            .to_pos2()
            - egui::vec2(0.0, 10.0);

        let text = self.polygon.label;
        let galley = painter.layout_no_wrap(
            text.to_string(),
            egui::FontId::proportional(12.0),
            Color32::BLACK,
        );

        // Draw background box
        let padding = egui::vec2(8.0, 5.0);
        let box_rect = egui::Rect::from_center_size(
            anchor - egui::vec2(0.0, galley.size().y / 2.0 + padding.y),
            galley.size() + padding * 2.0,
        );
        painter.rect_filled(box_rect, 4.0, Color32::from_rgba_unmultiplied(255, 255, 255, 235));
        painter.text(
            box_rect.center(),
            egui::Align2::CENTER_CENTER,
            text,
            egui::FontId::proportional(12.0),
            Color32::BLACK,
        );
    }
}
