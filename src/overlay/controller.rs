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

//! Map controller: run selection, opacity and the classification overlay.
//!
//! The controller is driven entirely from the UI thread. Backend calls are
//! issued elsewhere and their results are fed back through the `apply_*`
//! methods. Overlay state moves between two states:
//!
//! - no overlay mounted
//! - one overlay mounted for (run, opacity)
//!
//! Every change of run, opacity or surface rebuilds the overlay: the old layer
//! is unmounted before the new one is mounted, so the surface never hosts two.

use std::collections::HashMap;

use grazing_client::{BackendClient, ClientError, HealthStatus, RunId, RunReceipt, RunSummary};
use log::{debug, info, warn};

use super::spec::{OverlaySpec, OverlaySurface};
use crate::status::{BackendCall, BackendHealth, BackendStatus, DiagnosticLevel};

/// Opacity changes smaller than this are ignored
const OPACITY_EPSILON: f32 = 1e-4;

/// Sequence number of a run list request.
///
/// Responses are applied only if no newer request has been applied already,
/// so a slow reply cannot overwrite a fresher list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LoadTicket(u64);

#[derive(Debug)]
struct MountedOverlay<H> {
    handle: H,
    spec: OverlaySpec,
}

/// Owns the overlay state and the surface it is mounted on
#[derive(Debug)]
pub struct MapController<S: OverlaySurface> {
    client: BackendClient,
    surface: Option<S>,
    runs: Vec<RunId>,
    selected_run: Option<RunId>,
    opacity: f32,
    mounted: Option<MountedOverlay<S::Handle>>,
    status: BackendStatus,
    next_ticket: u64,
    applied_ticket: Option<LoadTicket>,
    trigger_in_flight: bool,
    /// Summaries by run, filled from summary fetches and trigger receipts
    summaries: HashMap<RunId, RunSummary>,
    summary_requested: Option<RunId>,
}

impl<S: OverlaySurface> MapController<S> {
    pub fn new(client: BackendClient, opacity: f32, status: BackendStatus) -> Self {
        Self {
            client,
            surface: None,
            runs: Vec::new(),
            selected_run: None,
            opacity: opacity.clamp(0.0, 1.0),
            mounted: None,
            status,
            next_ticket: 0,
            applied_ticket: None,
            trigger_in_flight: false,
            summaries: HashMap::new(),
            summary_requested: None,
        }
    }

    // ===== Surface lifecycle =====

    /// Attach the map surface and mount the overlay for the current selection
    pub fn attach_surface(&mut self, surface: S) {
        if self.surface.is_some() {
            warn!("Replacing attached map surface");
            self.detach_surface();
        }
        self.surface = Some(surface);
        self.sync_overlay();
    }

    /// Unmount the overlay and hand the surface back
    pub fn detach_surface(&mut self) -> Option<S> {
        self.unmount_current();
        self.surface.take()
    }

    /// Release the overlay and the surface
    pub fn teardown(&mut self) {
        if let Some(surface) = self.detach_surface() {
            drop(surface);
            info!("Map controller torn down");
        }
    }

    #[cfg(test)]
    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    pub fn surface_mut(&mut self) -> Option<&mut S> {
        self.surface.as_mut()
    }

    // ===== Accessors =====

    pub fn runs(&self) -> &[RunId] {
        &self.runs
    }

    pub fn selected_run(&self) -> Option<&RunId> {
        self.selected_run.as_ref()
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Spec of the currently mounted overlay, if any
    pub fn mounted_overlay(&self) -> Option<&OverlaySpec> {
        self.mounted.as_ref().map(|m| &m.spec)
    }

    pub fn status(&self) -> &BackendStatus {
        &self.status
    }

    pub fn status_mut(&mut self) -> &mut BackendStatus {
        &mut self.status
    }

    pub fn is_trigger_in_flight(&self) -> bool {
        self.trigger_in_flight
    }

    /// Summary of the selected run, once loaded
    pub fn selected_summary(&self) -> Option<&RunSummary> {
        self.selected_run.as_ref().and_then(|run| self.summaries.get(run))
    }

    // ===== User input =====

    /// Select a run, or clear the selection with `None`
    pub fn select_run(&mut self, run: Option<RunId>) {
        if self.selected_run == run {
            return;
        }
        match &run {
            Some(run) => info!("Selected run {run}"),
            None => info!("Cleared run selection"),
        }
        self.selected_run = run;
        self.summary_requested = None;
        self.sync_overlay();
    }

    /// Change the overlay opacity; the layer is rebuilt, not mutated
    pub fn set_opacity(&mut self, opacity: f32) {
        if !opacity.is_finite() {
            return;
        }
        let opacity = opacity.clamp(0.0, 1.0);
        if (opacity - self.opacity).abs() < OPACITY_EPSILON {
            return;
        }
        self.opacity = opacity;
        self.sync_overlay();
    }

    // ===== Overlay sync =====

    /// Tear down the mounted overlay and mount the one the current state asks for.
    ///
    /// Leaves zero or one overlay mounted.
    pub fn sync_overlay(&mut self) {
        self.unmount_current();

        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        let Some(spec) = OverlaySpec::for_selection(self.selected_run.as_ref(), self.opacity, &self.client)
        else {
            return;
        };

        let handle = surface.mount_overlay(&spec);
        info!("Mounted overlay for run {} at opacity {:.2}", spec.run, spec.opacity);
        debug!("Overlay tiles: {}", spec.url_template);
        self.mounted = Some(MountedOverlay { handle, spec });
    }

    fn unmount_current(&mut self) {
        let Some(previous) = self.mounted.take() else {
            return;
        };
        match self.surface.as_mut() {
            Some(surface) => {
                surface.unmount_overlay(previous.handle);
                info!("Unmounted overlay for run {}", previous.spec.run);
            }
            None => warn!("Overlay for run {} outlived its surface", previous.spec.run),
        }
    }

    // ===== Backend results =====

    /// Start a run list load; pass the ticket back with the result
    pub fn begin_load_runs(&mut self) -> LoadTicket {
        self.next_ticket += 1;
        LoadTicket(self.next_ticket)
    }

    /// Apply a run list result.
    ///
    /// On success the list is replaced and its first entry (newest, by backend
    /// contract) becomes the selection. On failure nothing but the status changes.
    pub fn apply_runs(&mut self, ticket: LoadTicket, result: Result<Vec<RunId>, ClientError>) {
        if self.applied_ticket.is_some_and(|applied| ticket < applied) {
            debug!("Discarding stale run list response {ticket:?}");
            return;
        }

        match result {
            Ok(runs) => {
                self.applied_ticket = Some(ticket);
                self.status.record_runs_loaded(runs.len());
                let first = runs.first().cloned();
                self.runs = runs;
                if first.is_some() {
                    self.select_run(first);
                }
            }
            Err(e) => {
                warn!("Failed to load runs: {e}");
                if e.is_transport() {
                    self.status.set_health(BackendHealth::Unreachable);
                }
                self.status.record_error(BackendCall::ListRuns, "Loading runs", &e);
            }
        }
    }

    /// Mark a trigger as started. Returns false if one is already running.
    pub fn begin_trigger(&mut self) -> bool {
        if self.trigger_in_flight {
            return false;
        }
        self.trigger_in_flight = true;
        info!("Triggering pipeline run");
        true
    }

    /// Apply the outcome of a trigger.
    ///
    /// Returns true when the run list should now be reloaded.
    pub fn apply_trigger(&mut self, result: Result<RunReceipt, ClientError>) -> bool {
        self.trigger_in_flight = false;

        match result {
            Ok(receipt) => {
                let run = receipt.run_id();
                self.status.record_run_triggered(run.as_ref().map(RunId::as_str));
                if let (Some(run), Some(summary)) = (run, receipt.summary) {
                    self.summaries.insert(run, summary);
                }
                true
            }
            Err(e) => {
                warn!("Pipeline run failed: {e}");
                if e.is_transport() {
                    self.status.set_health(BackendHealth::Unreachable);
                }
                self.status.record_error(BackendCall::TriggerRun, "Triggering run", &e);
                false
            }
        }
    }

    /// The selected run's summary, if it still needs fetching. Marks it requested.
    pub fn next_summary_request(&mut self) -> Option<RunId> {
        let selected = self.selected_run.as_ref()?;
        if self.selected_summary().is_some() || self.summary_requested.as_ref() == Some(selected) {
            return None;
        }
        self.summary_requested = Some(selected.clone());
        Some(selected.clone())
    }

    pub fn apply_summary(&mut self, run: RunId, result: Result<RunSummary, ClientError>) {
        match result {
            Ok(summary) => {
                self.status.clear_error(BackendCall::Summary);
                self.summaries.insert(run, summary);
            }
            Err(ClientError::NotFound { .. }) => {
                self.status.add_diagnostic(DiagnosticLevel::Warning,
                    format!("No summary available for run {run}"));
            }
            Err(e) if self.selected_run.as_ref() == Some(&run) => {
                warn!("Failed to load summary for run {run}: {e}");
                self.status.record_error(BackendCall::Summary, &format!("Loading summary for {run}"), &e);
            }
            Err(e) => {
                debug!("Ignoring failed summary for deselected run {run}: {e}");
            }
        }
    }

    pub fn apply_health(&mut self, result: Result<HealthStatus, ClientError>) {
        match result {
            Ok(health) if health.is_ok() => self.status.set_health(BackendHealth::Healthy),
            Ok(health) => {
                self.status.set_health(BackendHealth::Unreachable);
                self.status.add_diagnostic(DiagnosticLevel::Warning,
                    format!("Backend reported status '{}'", health.status));
            }
            Err(e) => {
                warn!("Health check failed: {e}");
                self.status.set_health(BackendHealth::Unreachable);
            }
        }
    }
}

impl<S: OverlaySurface> Drop for MapController<S> {
    fn drop(&mut self) {
        self.unmount_current();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grazing_client::{ClientConfig, StatusCode};
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq)]
    enum SurfaceEvent {
        Mounted(u64),
        Unmounted(u64),
    }

    /// Records mounts and refuses to host two overlays at once
    #[derive(Debug, Default)]
    struct FakeSurface {
        next_id: u64,
        mounted: Vec<(u64, OverlaySpec)>,
        events: Vec<SurfaceEvent>,
    }

    impl OverlaySurface for FakeSurface {
        type Handle = u64;

        fn mount_overlay(&mut self, spec: &OverlaySpec) -> u64 {
            assert!(self.mounted.is_empty(), "second overlay mounted while one is live");
            self.next_id += 1;
            self.mounted.push((self.next_id, spec.clone()));
            self.events.push(SurfaceEvent::Mounted(self.next_id));
            self.next_id
        }

        fn unmount_overlay(&mut self, handle: u64) {
            let before = self.mounted.len();
            self.mounted.retain(|(id, _)| *id != handle);
            assert_eq!(before - 1, self.mounted.len(), "unknown overlay handle {handle}");
            self.events.push(SurfaceEvent::Unmounted(handle));
        }
    }

    fn controller() -> MapController<FakeSurface> {
        let client = BackendClient::new(ClientConfig {
            base_url: "http://backend.test".to_string(),
            ..Default::default()
        })
        .unwrap();
        let mut controller = MapController::new(client, 0.7, BackendStatus::new("http://backend.test".to_string()));
        controller.attach_surface(FakeSurface::default());
        controller
    }

    fn surface(controller: &MapController<FakeSurface>) -> &FakeSurface {
        controller.surface().unwrap()
    }

    fn runs(ids: &[&str]) -> Vec<RunId> {
        ids.iter().map(|id| RunId::from(*id)).collect()
    }

    fn unavailable() -> ClientError {
        ClientError::Status {
            status: StatusCode::SERVICE_UNAVAILABLE,
            url: "http://backend.test/runs".to_string(),
        }
    }

    #[test]
    fn test_no_overlay_before_selection() {
        let controller = controller();
        assert!(controller.mounted_overlay().is_none());
        assert!(surface(&controller).mounted.is_empty());
    }

    #[test]
    fn test_switching_runs_replaces_overlay() {
        let mut controller = controller();
        controller.select_run(Some(RunId::from("r1")));
        controller.select_run(Some(RunId::from("r2")));

        let mounted = &surface(&controller).mounted;
        assert_eq!(mounted.len(), 1);
        assert!(mounted[0].1.url_template.contains("run=r2"));
        assert!(!mounted.iter().any(|(_, spec)| spec.url_template.contains("run=r1")));
        assert_eq!(
            surface(&controller).events,
            vec![SurfaceEvent::Mounted(1), SurfaceEvent::Unmounted(1), SurfaceEvent::Mounted(2)]
        );
    }

    #[test]
    fn test_opacity_change_rebuilds_single_overlay() {
        let mut controller = controller();
        controller.select_run(Some(RunId::from("r1")));
        controller.set_opacity(0.3);

        let mounted = &surface(&controller).mounted;
        assert_eq!(mounted.len(), 1);
        assert!((mounted[0].1.opacity - 0.3).abs() < f32::EPSILON);
        assert!(mounted[0].1.url_template.contains("run=r1"));
        assert_eq!(surface(&controller).events.len(), 3);
    }

    #[test]
    fn test_unchanged_input_does_not_remount() {
        let mut controller = controller();
        controller.select_run(Some(RunId::from("r1")));
        controller.set_opacity(0.7);
        controller.select_run(Some(RunId::from("r1")));

        assert_eq!(surface(&controller).events, vec![SurfaceEvent::Mounted(1)]);
    }

    #[test]
    fn test_opacity_is_clamped() {
        let mut controller = controller();
        controller.select_run(Some(RunId::from("r1")));
        controller.set_opacity(2.0);
        assert!((controller.mounted_overlay().unwrap().opacity - 1.0).abs() < f32::EPSILON);

        controller.set_opacity(f32::NAN);
        assert!((controller.opacity() - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_deselect_unmounts() {
        let mut controller = controller();
        controller.select_run(Some(RunId::from("r1")));
        controller.select_run(None);

        assert!(controller.mounted_overlay().is_none());
        assert!(surface(&controller).mounted.is_empty());
    }

    #[test]
    fn test_at_most_one_overlay_across_input_sequence() {
        let mut controller = controller();
        let inputs: [(Option<&str>, f32); 8] = [
            (Some("a"), 0.7),
            (Some("b"), 0.7),
            (Some("b"), 0.2),
            (None, 0.2),
            (Some("c"), 0.9),
            (Some("a"), 0.0),
            (None, 1.0),
            (Some("d"), 0.5),
        ];

        for (run, opacity) in inputs {
            controller.select_run(run.map(RunId::from));
            controller.set_opacity(opacity);
            assert!(surface(&controller).mounted.len() <= 1);
            assert_eq!(
                controller.mounted_overlay().map(|spec| spec.run.as_str()),
                run
            );
        }
    }

    #[test]
    fn test_attach_after_selection_mounts() {
        let client = BackendClient::new(ClientConfig::default()).unwrap();
        let mut controller: MapController<FakeSurface> =
            MapController::new(client, 0.5, BackendStatus::new(String::new()));

        controller.select_run(Some(RunId::from("r1")));
        assert!(controller.mounted_overlay().is_none());

        controller.attach_surface(FakeSurface::default());
        assert_eq!(surface(&controller).mounted.len(), 1);

        let detached = controller.detach_surface().unwrap();
        assert!(detached.mounted.is_empty());
        assert!(controller.mounted_overlay().is_none());
    }

    #[test]
    fn test_teardown_unmounts() {
        let mut controller = controller();
        controller.select_run(Some(RunId::from("r1")));
        controller.teardown();

        assert!(controller.surface().is_none());
        assert!(controller.mounted_overlay().is_none());
    }

    #[test]
    fn test_run_list_selects_first() {
        let mut controller = controller();
        let ticket = controller.begin_load_runs();
        controller.apply_runs(ticket, Ok(runs(&["2024-03-02T00-00-00Z", "2024-03-01T00-00-00Z"])));

        assert_eq!(controller.runs().len(), 2);
        assert_eq!(controller.selected_run(), Some(&RunId::from("2024-03-02T00-00-00Z")));
        assert!(controller.mounted_overlay().is_some());
    }

    #[test]
    fn test_empty_run_list_keeps_selection() {
        let mut controller = controller();
        controller.select_run(Some(RunId::from("r1")));
        let ticket = controller.begin_load_runs();
        controller.apply_runs(ticket, Ok(Vec::new()));

        assert!(controller.runs().is_empty());
        assert_eq!(controller.selected_run(), Some(&RunId::from("r1")));
    }

    #[test]
    fn test_trigger_then_reload_selects_newest() {
        let mut controller = controller();
        let ticket = controller.begin_load_runs();
        controller.apply_runs(ticket, Ok(runs(&["r1"])));
        controller.select_run(None);

        assert!(controller.begin_trigger());
        assert!(!controller.begin_trigger());

        let receipt = RunReceipt::from_value(json!({"folder": "storage/r2"}));
        assert!(controller.apply_trigger(Ok(receipt)));
        assert!(!controller.is_trigger_in_flight());

        let ticket = controller.begin_load_runs();
        controller.apply_runs(ticket, Ok(runs(&["r2", "r1"])));

        assert_eq!(controller.selected_run(), Some(&RunId::from("r2")));
        assert!(controller.mounted_overlay().unwrap().url_template.contains("run=r2"));
        assert_eq!(surface(&controller).mounted.len(), 1);
    }

    #[test]
    fn test_failed_trigger_changes_nothing_but_status() {
        let mut controller = controller();
        controller.select_run(Some(RunId::from("r1")));
        let events_before = surface(&controller).events.len();

        assert!(controller.begin_trigger());
        assert!(!controller.apply_trigger(Err(unavailable())));

        assert!(!controller.is_trigger_in_flight());
        assert_eq!(controller.selected_run(), Some(&RunId::from("r1")));
        assert_eq!(surface(&controller).events.len(), events_before);
        assert!(controller.status().last_error.as_deref().unwrap().starts_with("Triggering run"));
    }

    #[test]
    fn test_failed_list_keeps_state() {
        let mut controller = controller();
        let ticket = controller.begin_load_runs();
        controller.apply_runs(ticket, Ok(runs(&["r1", "r0"])));
        let mounted_before = controller.mounted_overlay().cloned();
        let events_before = surface(&controller).events.len();

        let ticket = controller.begin_load_runs();
        controller.apply_runs(ticket, Err(unavailable()));

        assert_eq!(controller.runs(), runs(&["r1", "r0"]).as_slice());
        assert_eq!(controller.selected_run(), Some(&RunId::from("r1")));
        assert_eq!(controller.mounted_overlay().cloned(), mounted_before);
        assert_eq!(surface(&controller).events.len(), events_before);
        assert!(controller.status().last_error.is_some());
    }

    #[test]
    fn test_stale_run_list_is_discarded() {
        let mut controller = controller();
        let slow = controller.begin_load_runs();
        let fast = controller.begin_load_runs();

        controller.apply_runs(fast, Ok(runs(&["new", "old"])));
        controller.apply_runs(slow, Ok(runs(&["old"])));

        assert_eq!(controller.runs(), runs(&["new", "old"]).as_slice());
        assert_eq!(controller.selected_run(), Some(&RunId::from("new")));
    }

    #[test]
    fn test_summary_requested_once_per_selection() {
        let mut controller = controller();
        assert!(controller.next_summary_request().is_none());

        controller.select_run(Some(RunId::from("r1")));
        assert_eq!(controller.next_summary_request(), Some(RunId::from("r1")));
        assert!(controller.next_summary_request().is_none());

        controller.apply_summary(RunId::from("r1"), Ok(RunSummary::default()));
        assert!(controller.selected_summary().is_some());

        controller.select_run(Some(RunId::from("r2")));
        assert!(controller.selected_summary().is_none());
        assert_eq!(controller.next_summary_request(), Some(RunId::from("r2")));
    }

    #[test]
    fn test_trigger_receipt_summary_is_kept() {
        let mut controller = controller();
        assert!(controller.begin_trigger());
        let receipt = RunReceipt::from_value(json!({
            "folder": "storage/r9",
            "summary": {"date": "2024-03-01T00:00:00", "classes": [{"class": 2, "pixels": 4, "approx_area_m2": 400.0}]}
        }));
        assert!(controller.apply_trigger(Ok(receipt)));

        controller.select_run(Some(RunId::from("r9")));
        assert_eq!(controller.selected_summary().unwrap().total_pixels(), 4);
        assert!(controller.next_summary_request().is_none());
    }

    fn summary_with_pixels(pixels: u64) -> RunSummary {
        serde_json::from_value(json!({
            "classes": [{"class": 2, "pixels": pixels, "approx_area_m2": 100.0}]
        }))
        .unwrap()
    }

    #[test]
    fn test_late_summary_for_previous_run_keeps_current() {
        let mut controller = controller();
        controller.select_run(Some(RunId::from("r1")));
        assert_eq!(controller.next_summary_request(), Some(RunId::from("r1")));
        controller.select_run(Some(RunId::from("r2")));
        assert_eq!(controller.next_summary_request(), Some(RunId::from("r2")));

        controller.apply_summary(RunId::from("r2"), Ok(summary_with_pixels(2)));
        controller.apply_summary(RunId::from("r1"), Ok(summary_with_pixels(1)));

        assert_eq!(controller.selected_summary().unwrap().total_pixels(), 2);
        assert!(controller.next_summary_request().is_none());

        // Switching back uses the r1 reply that arrived late
        controller.select_run(Some(RunId::from("r1")));
        assert_eq!(controller.selected_summary().unwrap().total_pixels(), 1);
        assert!(controller.next_summary_request().is_none());
    }

    #[test]
    fn test_receipt_summary_does_not_evict_selected_summary() {
        let mut controller = controller();
        controller.select_run(Some(RunId::from("r1")));
        controller.apply_summary(RunId::from("r1"), Ok(summary_with_pixels(7)));

        assert!(controller.begin_trigger());
        let receipt = RunReceipt::from_value(json!({
            "folder": "storage/r9",
            "summary": {"classes": [{"class": 0, "pixels": 3, "approx_area_m2": 30.0}]}
        }));
        assert!(controller.apply_trigger(Ok(receipt)));

        // Reload fails, so r1 stays selected with its summary intact
        let ticket = controller.begin_load_runs();
        controller.apply_runs(ticket, Err(unavailable()));
        assert_eq!(controller.selected_run(), Some(&RunId::from("r1")));
        assert_eq!(controller.selected_summary().unwrap().total_pixels(), 7);
    }

    #[test]
    fn test_failed_summary_for_deselected_run_is_not_shown() {
        let mut controller = controller();
        controller.select_run(Some(RunId::from("r1")));
        controller.select_run(Some(RunId::from("r2")));

        controller.apply_summary(RunId::from("r1"), Err(unavailable()));
        assert!(controller.status().last_error.is_none());

        controller.apply_summary(RunId::from("r2"), Err(unavailable()));
        assert!(controller.status().last_error.is_some());
    }
}
