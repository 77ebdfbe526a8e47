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

use chrono::{DateTime, Utc};
use egui::{Color32, RichText};

use super::controls::ControlAction;
use crate::status::{BackendHealth, BackendStatus, DiagnosticLevel};

/// Longest diagnostic message shown before truncation
const MAX_MESSAGE_CHARS: usize = 48;

#[derive(Debug, Default)]
pub struct StatusPane {
    pub collapsed: bool,
}

impl StatusPane {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render backend status and diagnostics inside the side panel
    pub fn render(&mut self, ui: &mut egui::Ui, status: &BackendStatus, actions: &mut Vec<ControlAction>) {
        ui.horizontal(|ui| {
            ui.label(RichText::new("◈ BACKEND")
                .color(Color32::from_rgb(100, 180, 220))
                .size(12.0)
                .strong());

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let collapse_icon = if self.collapsed { "▼" } else { "▲" };
                if ui.button(RichText::new(collapse_icon).size(10.0))
                    .on_hover_text(if self.collapsed { "Expand" } else { "Collapse" })
                    .clicked() {
                    self.collapsed = !self.collapsed;
                }
            });
        });

        self.render_connection_section(ui, status);

        if let Some(error) = &status.last_error {
            ui.add_space(4.0);
            ui.horizontal_wrapped(|ui| {
                ui.label(RichText::new(error)
                    .color(Color32::from_rgb(255, 100, 100))
                    .size(10.0));
                if ui.small_button("Dismiss").clicked() {
                    actions.push(ControlAction::DismissError);
                }
            });
        }

        if self.collapsed {
            return;
        }

        ui.add_space(6.0);
        render_diagnostics_section(ui, status);
    }

    fn render_connection_section(&self, ui: &mut egui::Ui, status: &BackendStatus) {
        ui.horizontal(|ui| {
            let (status_color, status_text, status_icon) = health_indicator(status.health);

            ui.label(RichText::new(status_icon)
                .color(status_color)
                .size(10.0));

            ui.label(RichText::new(status_text)
                .color(status_color)
                .size(10.0)
                .monospace()
                .strong());
        });

        ui.label(RichText::new(&status.backend_url)
            .color(Color32::from_rgb(180, 180, 180))
            .size(8.0)
            .monospace());

        if self.collapsed {
            return;
        }

        timestamp_row(ui, "Runs loaded:", status.last_runs_loaded_at);
        timestamp_row(ui, "Last trigger:", status.last_run_triggered_at);
    }
}

fn health_indicator(health: BackendHealth) -> (Color32, &'static str, &'static str) {
    match health {
        BackendHealth::Healthy => (Color32::from_rgb(100, 255, 100), "HEALTHY", "●"),
        BackendHealth::Unknown => (Color32::from_rgb(255, 200, 100), "CHECKING", "◐"),
        BackendHealth::Unreachable => (Color32::from_rgb(255, 100, 100), "UNREACHABLE", "✕"),
    }
}

fn timestamp_row(ui: &mut egui::Ui, label: &str, at: Option<DateTime<Utc>>) {
    ui.horizontal(|ui| {
        ui.label(RichText::new(label)
            .color(Color32::from_rgb(130, 130, 130))
            .size(9.0));
        let value = at.map_or_else(|| "never".to_string(), |t| t.format("%H:%M:%S").to_string());
        ui.label(RichText::new(value)
            .color(Color32::from_rgb(200, 200, 200))
            .size(9.0)
            .monospace());
    });
}

fn render_diagnostics_section(ui: &mut egui::Ui, status: &BackendStatus) {
    ui.horizontal(|ui| {
        ui.label(RichText::new("DIAGNOSTICS")
            .color(Color32::from_rgb(150, 150, 150))
            .size(10.0)
            .strong());

        let errors = status.error_count();
        if errors > 0 {
            ui.label(RichText::new(format!("{errors} errors"))
                .color(Color32::from_rgb(255, 100, 100))
                .size(9.0));
        }
    });

    ui.add_space(3.0);

    if status.diagnostics.is_empty() {
        ui.label(RichText::new("No messages")
            .color(Color32::from_rgb(100, 100, 100))
            .size(8.0)
            .italics());
        return;
    }

    egui::ScrollArea::vertical()
        .max_height(140.0)
        .auto_shrink([false, true])
        .show(ui, |ui| {
            // Newest first
            for diagnostic in status.diagnostics.iter().rev() {
                ui.horizontal(|ui| {
                    let (icon, color) = match diagnostic.level {
                        DiagnosticLevel::Info => ("ℹ", Color32::from_rgb(100, 180, 255)),
                        DiagnosticLevel::Warning => ("⚠", Color32::from_rgb(255, 200, 100)),
                        DiagnosticLevel::Error => ("✕", Color32::from_rgb(255, 100, 100)),
                    };

                    ui.label(RichText::new(icon)
                        .color(color)
                        .size(9.0));

                    let time_str = diagnostic.timestamp.format("%H:%M:%S").to_string();
                    ui.label(RichText::new(time_str)
                        .color(Color32::from_rgb(100, 100, 100))
                        .size(8.0)
                        .monospace());

                    ui.label(RichText::new(truncate(&diagnostic.message, MAX_MESSAGE_CHARS))
                        .color(Color32::from_rgb(180, 180, 180))
                        .size(8.0))
                        .on_hover_text(&diagnostic.message);
                });
            }
        });
}

/// Truncate on a char boundary, appending an ellipsis
fn truncate(message: &str, max_chars: usize) -> String {
    match message.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &message[..idx]),
        None => message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdef", 3), "abc...");
        assert_eq!(truncate("ééééé", 2), "éé...");
    }

    #[test]
    fn test_health_indicator_text() {
        assert_eq!(health_indicator(BackendHealth::Healthy).1, "HEALTHY");
        assert_eq!(health_indicator(BackendHealth::Unreachable).1, "UNREACHABLE");
        assert_eq!(health_indicator(BackendHealth::Unknown).1, "CHECKING");
    }
}
