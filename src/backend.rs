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

//! Background execution of backend requests.
//!
//! Requests run on a tokio runtime owned by [`BackendWorker`]. Each finished
//! request is delivered as a [`BackendEvent`] which the UI drains once per
//! frame, so no state is shared across threads.

use std::future::Future;

use grazing_client::{
    BackendClient, ClientError, HealthStatus, RunId, RunReceipt, RunSummary,
};
use log::{debug, info};
use tokio::runtime::Runtime;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::overlay::LoadTicket;

/// Result of one backend request
#[derive(Debug)]
pub enum BackendEvent {
    RunsLoaded {
        ticket: LoadTicket,
        result: Result<Vec<RunId>, ClientError>,
    },
    RunTriggered(Result<RunReceipt, ClientError>),
    SummaryLoaded {
        run: RunId,
        result: Result<RunSummary, ClientError>,
    },
    HealthChecked(Result<HealthStatus, ClientError>),
}

pub struct BackendWorker {
    client: BackendClient,
    runtime: Runtime,
    cancel_token: CancellationToken,
    ctx: egui::Context,
    tx: mpsc::UnboundedSender<BackendEvent>,
    rx: mpsc::UnboundedReceiver<BackendEvent>,
}

impl std::fmt::Debug for BackendWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendWorker")
            .field("backend_url", &self.client.base_url())
            .field("cancelled", &self.cancel_token.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl BackendWorker {
    pub fn new(client: BackendClient, ctx: egui::Context) -> std::io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("grazing-backend")
            .enable_all()
            .build()?;
        let (tx, rx) = mpsc::unbounded_channel();

        Ok(Self {
            client,
            runtime,
            cancel_token: CancellationToken::new(),
            ctx,
            tx,
            rx,
        })
    }

    pub fn load_runs(&self, ticket: LoadTicket) {
        let client = self.client.clone();
        self.spawn("list runs", async move {
            let result = client.list_runs().await;
            BackendEvent::RunsLoaded { ticket, result }
        });
    }

    pub fn trigger_run(&self) {
        let client = self.client.clone();
        self.spawn("trigger run", async move {
            BackendEvent::RunTriggered(client.trigger_run().await)
        });
    }

    pub fn load_summary(&self, run: RunId) {
        let client = self.client.clone();
        self.spawn("load summary", async move {
            let result = client.run_summary(&run).await;
            BackendEvent::SummaryLoaded { run, result }
        });
    }

    pub fn check_health(&self) {
        let client = self.client.clone();
        self.spawn("health check", async move {
            BackendEvent::HealthChecked(client.health().await)
        });
    }

    /// Next finished request, if any
    pub fn try_recv(&mut self) -> Option<BackendEvent> {
        self.rx.try_recv().ok()
    }

    /// All requests finished since the last call
    pub fn drain(&mut self) -> Vec<BackendEvent> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }

    /// Cancel every request still in flight; their results are never delivered
    pub fn shutdown(&self) {
        if !self.cancel_token.is_cancelled() {
            info!("Cancelling outstanding backend requests");
            self.cancel_token.cancel();
        }
    }

    fn spawn<F>(&self, what: &'static str, request: F)
    where
        F: Future<Output = BackendEvent> + Send + 'static,
    {
        let tx = self.tx.clone();
        let ctx = self.ctx.clone();
        let cancel_token = self.cancel_token.clone();

        self.runtime.spawn(async move {
            tokio::select! {
                event = request => {
                    debug!("Backend request finished: {what}");
                    // Receiver gone means the app is shutting down
                    if tx.send(event).is_ok() {
                        ctx.request_repaint();
                    }
                }
                () = cancel_token.cancelled() => {
                    debug!("Backend request cancelled: {what}");
                }
            }
        });
    }
}

impl Drop for BackendWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grazing_client::ClientConfig;
    use std::time::{Duration, Instant};

    fn unreachable_worker() -> BackendWorker {
        // Bind then drop to get a port with nothing listening
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = BackendClient::new(ClientConfig {
            base_url: format!("http://{addr}"),
            request_timeout: Duration::from_secs(5),
            trigger_timeout: Duration::from_secs(5),
        })
        .unwrap();
        BackendWorker::new(client, egui::Context::default()).unwrap()
    }

    fn wait_for_event(worker: &mut BackendWorker) -> BackendEvent {
        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            if let Some(event) = worker.try_recv() {
                return event;
            }
            assert!(Instant::now() < deadline, "no backend event within 10s");
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    #[test]
    fn test_failed_request_is_delivered_as_event() {
        let mut worker = unreachable_worker();
        worker.check_health();

        match wait_for_event(&mut worker) {
            BackendEvent::HealthChecked(Err(e)) => assert!(e.is_transport()),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_summary_event_carries_run() {
        let mut worker = unreachable_worker();
        worker.load_summary(RunId::from("r1"));

        match wait_for_event(&mut worker) {
            BackendEvent::SummaryLoaded { run, result } => {
                assert_eq!(run, RunId::from("r1"));
                assert!(result.is_err());
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_drain_is_empty_without_requests() {
        let mut worker = unreachable_worker();
        assert!(worker.drain().is_empty());
    }
}
