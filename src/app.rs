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

//! The eframe application: wires backend events into the map controller and
//! lays out the side panel and map.

use grazing_client::BackendClient;
use log::info;

use crate::backend::{BackendEvent, BackendWorker};
use crate::map::MapView;
use crate::overlay::MapController;
use crate::status::BackendStatus;
use crate::ui::{self, ControlAction, ControlState, StatusPane};

const SIDE_PANEL_WIDTH: f32 = 300.0;

#[derive(Debug)]
pub struct GrazingApp {
    controller: MapController<MapView>,
    worker: BackendWorker,
    status_pane: StatusPane,
}

impl GrazingApp {
    pub fn new(ctx: &egui::Context, client: BackendClient, opacity: f32) -> std::io::Result<Self> {
        let status = BackendStatus::new(client.base_url().to_string());
        let worker = BackendWorker::new(client.clone(), ctx.clone())?;

        let mut controller = MapController::new(client, opacity, status);
        controller.attach_surface(MapView::new(ctx));

        let mut app = Self {
            controller,
            worker,
            status_pane: StatusPane::new(),
        };

        app.worker.check_health();
        app.reload_runs();

        info!("Grazing Mapper initialized");
        Ok(app)
    }

    fn reload_runs(&mut self) {
        let ticket = self.controller.begin_load_runs();
        self.worker.load_runs(ticket);
    }

    fn handle_event(&mut self, event: BackendEvent) {
        match event {
            BackendEvent::RunsLoaded { ticket, result } => {
                self.controller.apply_runs(ticket, result);
            }
            BackendEvent::RunTriggered(result) => {
                // No optimistic update: the new run shows up only via a reload
                if self.controller.apply_trigger(result) {
                    self.reload_runs();
                }
            }
            BackendEvent::SummaryLoaded { run, result } => {
                self.controller.apply_summary(run, result);
            }
            BackendEvent::HealthChecked(result) => {
                self.controller.apply_health(result);
            }
        }
    }

    fn handle_action(&mut self, action: ControlAction) {
        match action {
            ControlAction::TriggerRun => {
                if self.controller.begin_trigger() {
                    self.worker.trigger_run();
                }
            }
            ControlAction::SelectRun(run) => self.controller.select_run(run),
            ControlAction::SetOpacity(opacity) => self.controller.set_opacity(opacity),
            ControlAction::DismissError => self.controller.status_mut().dismiss_error(),
        }
    }

    fn draw_side_panel(&mut self, ctx: &egui::Context) -> Vec<ControlAction> {
        let mut actions = Vec::new();

        egui::SidePanel::right("controls")
            .resizable(false)
            .exact_width(SIDE_PANEL_WIDTH)
            .show(ctx, |ui| {
                ui.add_space(6.0);
                ui.label(egui::RichText::new("◈ GRAZING MAPPER")
                    .color(egui::Color32::from_rgb(100, 200, 100))
                    .size(14.0)
                    .strong());
                ui.separator();

                egui::ScrollArea::vertical().show(ui, |ui| {
                    let state = ControlState {
                        runs: self.controller.runs(),
                        selected_run: self.controller.selected_run(),
                        opacity: self.controller.opacity(),
                        trigger_in_flight: self.controller.is_trigger_in_flight(),
                    };
                    ui::show_controls(ui, state, &mut actions);

                    if let Some(overlay) = self.controller.mounted_overlay() {
                        ui.label(egui::RichText::new(format!("Showing {}", overlay.run.label()))
                            .color(egui::Color32::from_rgb(130, 130, 130))
                            .size(9.0));
                    }

                    ui.separator();
                    ui::show_legend(ui);

                    ui.separator();
                    ui::show_summary(ui, self.controller.selected_summary());

                    ui.separator();
                    self.status_pane.render(ui, self.controller.status(), &mut actions);
                });
            });

        actions
    }

    fn draw_map(&mut self, ui: &mut egui::Ui) {
        let error = self.controller.status().last_error.clone();

        let Some(view) = self.controller.surface_mut() else {
            ui.centered_and_justified(|ui| ui.label("Map unavailable"));
            return;
        };
        let rect = view.show(ui).rect;

        if let Some(error_msg) = error {
            draw_error_bubble(ui.painter(), rect, &error_msg);
        }
    }
}

/// Red bubble centred at the top of the map
fn draw_error_bubble(painter: &egui::Painter, rect: egui::Rect, error_msg: &str) {
    let error_pos = rect.center_top() + egui::vec2(0.0, 20.0);
    let text_galley = painter.layout_no_wrap(
        error_msg.to_string(),
        egui::FontId::proportional(12.0),
        egui::Color32::WHITE,
    );

    let padding = egui::vec2(12.0, 6.0);
    let bubble_rect = egui::Rect::from_center_size(
        error_pos,
        text_galley.size() + padding * 2.0,
    );

    painter.rect_filled(bubble_rect, 5.0, egui::Color32::from_rgb(220, 50, 50));
    painter.text(
        error_pos,
        egui::Align2::CENTER_CENTER,
        error_msg,
        egui::FontId::proportional(12.0),
        egui::Color32::WHITE,
    );
}

impl eframe::App for GrazingApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        for event in self.worker.drain() {
            self.handle_event(event);
        }

        if let Some(run) = self.controller.next_summary_request() {
            self.worker.load_summary(run);
        }

        for action in self.draw_side_panel(ctx) {
            self.handle_action(action);
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                self.draw_map(ui);
            });

        // Keep the spinner moving while a run is in progress
        if self.controller.is_trigger_in_flight() {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.worker.shutdown();
        self.controller.teardown();
        info!("Grazing Mapper shut down");
    }
}
