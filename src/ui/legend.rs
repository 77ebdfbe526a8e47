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

//! Grazing classes, their overlay colours and the legend / summary widgets.

use egui::{Color32, RichText, Ui};
use grazing_client::RunSummary;

const SQUARE_METRES_PER_HECTARE: f64 = 10_000.0;

/// Classification classes as encoded by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrazingClass {
    Poor,
    Moderate,
    Good,
    Cloud,
}

impl GrazingClass {
    /// Legend order, best first
    pub const LEGEND: [GrazingClass; 4] = [
        GrazingClass::Good,
        GrazingClass::Moderate,
        GrazingClass::Poor,
        GrazingClass::Cloud,
    ];

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Poor),
            1 => Some(Self::Moderate),
            2 => Some(Self::Good),
            3 => Some(Self::Cloud),
            _ => None,
        }
    }

    /// Colour the backend paints this class with
    pub fn color(self) -> Color32 {
        match self {
            Self::Good => Color32::from_rgb(0x3C, 0xB4, 0x4B),
            Self::Moderate => Color32::from_rgb(0xF0, 0xB2, 0x39),
            Self::Poor => Color32::from_rgb(0xB4, 0x32, 0x32),
            Self::Cloud => Color32::from_rgb(0xC8, 0xC8, 0xC8),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Good => "Good",
            Self::Moderate => "Moderate",
            Self::Poor => "Poor",
            Self::Cloud => "Cloud/No data",
        }
    }
}

fn swatch(ui: &mut Ui, color: Color32) {
    let (rect, _) = ui.allocate_exact_size(egui::vec2(14.0, 14.0), egui::Sense::hover());
    ui.painter().rect_filled(rect, 2.0, color);
    ui.painter().rect_stroke(
        rect,
        2.0,
        egui::Stroke::new(1.0, Color32::from_rgb(60, 80, 100)),
        egui::StrokeKind::Inside,
    );
}

fn section_header(ui: &mut Ui, text: &str) {
    ui.label(RichText::new(text)
        .color(Color32::from_rgb(150, 150, 150))
        .size(10.0)
        .strong());
    ui.add_space(3.0);
}

pub fn show_legend(ui: &mut Ui) {
    section_header(ui, "LEGEND");

    for class in GrazingClass::LEGEND {
        ui.horizontal(|ui| {
            swatch(ui, class.color());
            ui.label(RichText::new(class.label()).size(11.0));
        });
    }
}

/// Area in hectares, one decimal
pub fn format_hectares(area_m2: f64) -> String {
    format!("{:.1} ha", area_m2 / SQUARE_METRES_PER_HECTARE)
}

pub fn show_summary(ui: &mut Ui, summary: Option<&RunSummary>) {
    section_header(ui, "RUN SUMMARY");

    let Some(summary) = summary else {
        ui.label(RichText::new("No summary available")
            .color(Color32::from_rgb(100, 100, 100))
            .size(9.0)
            .italics());
        return;
    };

    if let Some(date) = &summary.date {
        ui.label(RichText::new(date)
            .color(Color32::from_rgb(180, 180, 180))
            .size(9.0)
            .monospace());
    }

    egui::Grid::new("run_summary_grid")
        .num_columns(3)
        .spacing([8.0, 2.0])
        .show(ui, |ui| {
            for entry in &summary.classes {
                let (label, color) = match GrazingClass::from_code(entry.class_code) {
                    Some(class) => (class.label().to_string(), class.color()),
                    None => (format!("Class {}", entry.class_code), Color32::GRAY),
                };

                ui.horizontal(|ui| {
                    swatch(ui, color);
                    ui.label(RichText::new(label).size(10.0));
                });
                ui.label(RichText::new(format_hectares(entry.approx_area_m2))
                    .size(10.0)
                    .monospace());
                ui.label(RichText::new(format!("{:.0}%", summary.pixel_fraction(entry.class_code) * 100.0))
                    .size(10.0)
                    .monospace());
                ui.end_row();
            }
        });

    ui.label(RichText::new(format!("Total {}", format_hectares(summary.total_area_m2())))
        .color(Color32::from_rgb(130, 130, 130))
        .size(9.0));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_codes_match_backend() {
        assert_eq!(GrazingClass::from_code(0), Some(GrazingClass::Poor));
        assert_eq!(GrazingClass::from_code(1), Some(GrazingClass::Moderate));
        assert_eq!(GrazingClass::from_code(2), Some(GrazingClass::Good));
        assert_eq!(GrazingClass::from_code(3), Some(GrazingClass::Cloud));
        assert!(GrazingClass::from_code(4).is_none());
    }

    #[test]
    fn test_legend_colours() {
        assert_eq!(GrazingClass::Good.color(), Color32::from_rgb(60, 180, 75));
        assert_eq!(GrazingClass::Moderate.color(), Color32::from_rgb(240, 178, 57));
        assert_eq!(GrazingClass::Poor.color(), Color32::from_rgb(180, 50, 50));
        assert_eq!(GrazingClass::Cloud.color(), Color32::from_rgb(200, 200, 200));
        assert_eq!(GrazingClass::LEGEND[0], GrazingClass::Good);
    }

    #[test]
    fn test_format_hectares() {
        assert_eq!(format_hectares(25_000.0), "2.5 ha");
        assert_eq!(format_hectares(0.0), "0.0 ha");
    }
}
