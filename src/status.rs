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
use std::collections::VecDeque;
use std::fmt::Display;

const MAX_DIAGNOSTICS: usize = 50;

/// Backend reachability as last observed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendHealth {
    Unknown,
    Healthy,
    Unreachable,
}

/// Diagnostic message with timestamp
#[derive(Debug, Clone)]
pub struct DiagnosticMessage {
    pub timestamp: DateTime<Utc>,
    pub level: DiagnosticLevel,
    pub message: String,
}

/// Kind of backend call a visible error came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendCall {
    ListRuns,
    TriggerRun,
    Summary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticLevel {
    Info,
    Warning,
    Error,
}

/// Backend status and the diagnostic log shown in the side panel.
///
/// Failures of backend calls land here instead of being swallowed; the most
/// recent one stays in `last_error` until the user dismisses it or the same
/// kind of call succeeds.
#[derive(Debug)]
pub struct BackendStatus {
    pub backend_url: String,
    pub health: BackendHealth,
    pub last_error: Option<String>,
    last_error_call: Option<BackendCall>,
    pub last_runs_loaded_at: Option<DateTime<Utc>>,
    pub last_run_triggered_at: Option<DateTime<Utc>>,
    pub diagnostics: VecDeque<DiagnosticMessage>,
    max_diagnostics: usize,
}

impl BackendStatus {
    pub fn new(backend_url: String) -> Self {
        Self {
            backend_url,
            health: BackendHealth::Unknown,
            last_error: None,
            last_error_call: None,
            last_runs_loaded_at: None,
            last_run_triggered_at: None,
            diagnostics: VecDeque::with_capacity(MAX_DIAGNOSTICS),
            max_diagnostics: MAX_DIAGNOSTICS,
        }
    }

    /// Add a diagnostic message
    pub fn add_diagnostic(&mut self, level: DiagnosticLevel, message: String) {
        let diagnostic = DiagnosticMessage {
            timestamp: Utc::now(),
            level,
            message,
        };

        self.diagnostics.push_back(diagnostic);

        // Keep only the last N messages
        while self.diagnostics.len() > self.max_diagnostics {
            self.diagnostics.pop_front();
        }
    }

    /// Record a failed backend call and make it the visible error
    pub fn record_error(&mut self, call: BackendCall, context: &str, error: &impl Display) {
        let message = format!("{context}: {error}");
        self.last_error = Some(message.clone());
        self.last_error_call = Some(call);
        self.add_diagnostic(DiagnosticLevel::Error, message);
    }

    /// Hide the visible error (the diagnostic log keeps it)
    pub fn dismiss_error(&mut self) {
        self.last_error = None;
        self.last_error_call = None;
    }

    /// Hide the visible error if it came from the given kind of call
    pub fn clear_error(&mut self, call: BackendCall) {
        if self.last_error_call == Some(call) {
            self.dismiss_error();
        }
    }

    pub fn set_health(&mut self, health: BackendHealth) {
        if self.health == health {
            return;
        }
        self.health = health;

        match health {
            BackendHealth::Healthy => {
                self.add_diagnostic(DiagnosticLevel::Info,
                    format!("Backend {} is healthy", self.backend_url));
            }
            BackendHealth::Unreachable => {
                self.add_diagnostic(DiagnosticLevel::Warning,
                    format!("Backend {} is unreachable", self.backend_url));
            }
            BackendHealth::Unknown => {}
        }
    }

    /// Record a successful run list load
    pub fn record_runs_loaded(&mut self, count: usize) {
        self.last_runs_loaded_at = Some(Utc::now());
        self.clear_error(BackendCall::ListRuns);
        self.set_health(BackendHealth::Healthy);
        self.add_diagnostic(DiagnosticLevel::Info, format!("Loaded {count} runs"));
    }

    /// Record a completed pipeline run
    pub fn record_run_triggered(&mut self, run: Option<&str>) {
        self.last_run_triggered_at = Some(Utc::now());
        self.clear_error(BackendCall::TriggerRun);
        self.set_health(BackendHealth::Healthy);
        let message = match run {
            Some(run) => format!("Pipeline run {run} completed"),
            None => "Pipeline run completed".to_string(),
        };
        self.add_diagnostic(DiagnosticLevel::Info, message);
    }

    /// Count of error-level entries in the diagnostic log
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.level == DiagnosticLevel::Error)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_error_is_visible_until_dismissed() {
        let mut status = BackendStatus::new("http://localhost:8000".to_string());
        status.record_error(BackendCall::ListRuns, "Loading runs", &"connection refused");

        assert_eq!(status.last_error.as_deref(), Some("Loading runs: connection refused"));
        assert_eq!(status.error_count(), 1);

        status.dismiss_error();
        assert!(status.last_error.is_none());
        assert_eq!(status.error_count(), 1);
    }

    #[test]
    fn test_success_clears_error_and_marks_healthy() {
        let mut status = BackendStatus::new("http://localhost:8000".to_string());
        status.record_error(BackendCall::ListRuns, "Loading runs", &"HTTP 500");
        status.record_runs_loaded(3);

        assert!(status.last_error.is_none());
        assert_eq!(status.health, BackendHealth::Healthy);
        assert!(status.last_runs_loaded_at.is_some());
    }

    #[test]
    fn test_success_only_clears_error_of_same_call() {
        let mut status = BackendStatus::new("http://localhost:8000".to_string());
        status.record_error(BackendCall::TriggerRun, "Triggering run", &"HTTP 500");

        status.record_runs_loaded(2);
        assert_eq!(status.last_error.as_deref(), Some("Triggering run: HTTP 500"));

        status.clear_error(BackendCall::Summary);
        assert!(status.last_error.is_some());

        status.record_run_triggered(Some("r1"));
        assert!(status.last_error.is_none());
    }

    #[test]
    fn test_diagnostics_are_bounded() {
        let mut status = BackendStatus::new("http://localhost:8000".to_string());
        for i in 0..(MAX_DIAGNOSTICS + 10) {
            status.add_diagnostic(DiagnosticLevel::Info, format!("message {i}"));
        }

        assert_eq!(status.diagnostics.len(), MAX_DIAGNOSTICS);
        assert_eq!(status.diagnostics.front().unwrap().message, "message 10");
    }
}
