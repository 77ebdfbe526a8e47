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

//! Run controls: trigger button, run selector and opacity slider.

use egui::{Color32, RichText, Ui};
use grazing_client::RunId;

const OPACITY_STEP: f64 = 0.05;

/// What the user asked for this frame
#[derive(Debug, Clone, PartialEq)]
pub enum ControlAction {
    TriggerRun,
    SelectRun(Option<RunId>),
    SetOpacity(f32),
    DismissError,
}

/// Read-only view of the state the controls display
#[derive(Debug, Clone, Copy)]
pub struct ControlState<'a> {
    pub runs: &'a [RunId],
    pub selected_run: Option<&'a RunId>,
    pub opacity: f32,
    pub trigger_in_flight: bool,
}

pub fn opacity_label(opacity: f32) -> String {
    format!("Overlay opacity: {:.0}%", opacity * 100.0)
}

fn run_label(run: Option<&RunId>) -> String {
    run.map_or_else(|| "(none)".to_string(), RunId::label)
}

pub fn show_controls(ui: &mut Ui, state: ControlState<'_>, actions: &mut Vec<ControlAction>) {
    ui.horizontal(|ui| {
        let button = ui.add_enabled(
            !state.trigger_in_flight,
            egui::Button::new("Run demo pipeline now"),
        );
        if button.clicked() {
            actions.push(ControlAction::TriggerRun);
        }
        if state.trigger_in_flight {
            ui.spinner();
            ui.label(RichText::new("Running…")
                .color(Color32::from_rgb(255, 200, 100))
                .size(10.0));
        }
    });

    ui.add_space(8.0);

    ui.label("Historical runs");
    let mut selection = state.selected_run.cloned();
    egui::ComboBox::from_id_salt("historical_runs")
        .width(ui.available_width())
        .selected_text(run_label(selection.as_ref()))
        .show_ui(ui, |ui| {
            ui.selectable_value(&mut selection, None, "(none)");
            for run in state.runs {
                ui.selectable_value(&mut selection, Some(run.clone()), run.label())
                    .on_hover_text(run.as_str());
            }
        });
    if selection.as_ref() != state.selected_run {
        actions.push(ControlAction::SelectRun(selection));
    }

    if state.runs.is_empty() {
        ui.label(RichText::new("No runs yet")
            .color(Color32::from_rgb(100, 100, 100))
            .size(9.0)
            .italics());
    }

    ui.add_space(8.0);

    let mut opacity = state.opacity;
    ui.label(opacity_label(opacity));
    let slider = ui.add(
        egui::Slider::new(&mut opacity, 0.0..=1.0)
            .step_by(OPACITY_STEP)
            .show_value(false),
    );
    if slider.changed() {
        actions.push(ControlAction::SetOpacity(opacity));
    }
}
