//! Live build monitor.
//!
//! Supervises one in-flight build by polling the collaborator's status and
//! log feeds on a fixed cadence. The loop is an owned tokio task with a
//! watch-channel cancellation signal; teardown is unconditional and never
//! tied to any view lifetime. Both reads of a tick happen inline on the
//! task, so ticks are serialized by construction and a slow collaborator
//! can never produce overlapping reads.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, watch, RwLock};
use tokio::time::MissedTickBehavior;

use crate::api::BackendClient;
use crate::models::TerminalOutcome;

/// Reference cadence of the status/log polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Visible monitoring state, owned solely by the monitor while polling.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildMonitorState {
    /// Whether a build is currently being polled.
    pub active: bool,
    /// Displayed progress, clamped to 0-100. Never regresses while one
    /// build is in flight even if the collaborator reports a lower value.
    pub progress: u32,
    /// Free-text phase label supplied by the external job.
    pub stage: String,
    pub eta: String,
    /// Full log snapshot, replaced wholesale each tick. The collaborator
    /// owns ordering and completeness; nothing is diffed locally.
    pub logs: Vec<String>,
    pub outcome: Option<TerminalOutcome>,
    /// Consecutive failed status reads. Informational; no backoff policy.
    pub consecutive_failures: u32,
}

/// Events emitted from the polling task as the visible state changes.
#[derive(Debug, Clone)]
pub enum MonitorEvent {
    Progress(u32),
    Stage(String),
    Logs(Vec<String>),
    /// A transient read failure; previous values were kept and polling
    /// continues. Diagnostics only, never fatal.
    PollFailed(String),
    Finished(TerminalOutcome),
}

/// Handle to a spawned monitor: shared state plus structured cancellation.
pub struct MonitorHandle {
    state: Arc<RwLock<BuildMonitorState>>,
    cancel_tx: watch::Sender<bool>,
    task: tokio::task::JoinHandle<()>,
}

impl MonitorHandle {
    pub fn state(&self) -> Arc<RwLock<BuildMonitorState>> {
        Arc::clone(&self.state)
    }

    pub async fn snapshot(&self) -> BuildMonitorState {
        self.state.read().await.clone()
    }

    /// Whether the polling task has exited (terminal condition or stop).
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Signal the polling task to stop. Safe to call more than once.
    pub fn stop(&self) {
        let _ = self.cancel_tx.send(true);
    }

    /// Stop and wait for the polling task to wind down.
    pub async fn shutdown(self) {
        let _ = self.cancel_tx.send(true);
        let _ = self.task.await;
    }
}

/// Spawns the polling task for one accepted build.
pub struct BuildMonitor;

impl BuildMonitor {
    pub fn spawn(
        backend: Arc<dyn BackendClient>,
        event_tx: mpsc::Sender<MonitorEvent>,
        poll_interval: Duration,
    ) -> MonitorHandle {
        let state = Arc::new(RwLock::new(BuildMonitorState {
            active: true,
            ..Default::default()
        }));
        let (cancel_tx, cancel_rx) = watch::channel(false);

        let task_state = Arc::clone(&state);
        let task = tokio::spawn(async move {
            poll_loop(backend, task_state, event_tx, cancel_rx, poll_interval).await;
        });

        log::info!("[Monitor] Polling started (every {:?})", poll_interval);

        MonitorHandle {
            state,
            cancel_tx,
            task,
        }
    }
}

async fn poll_loop(
    backend: Arc<dyn BackendClient>,
    state: Arc<RwLock<BuildMonitorState>>,
    event_tx: mpsc::Sender<MonitorEvent>,
    mut cancel_rx: watch::Receiver<bool>,
    poll_interval: Duration,
) {
    let mut ticker = tokio::time::interval(poll_interval);
    // A tick that runs long must not be followed by a burst of catch-up
    // ticks mutating shared state back to back.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            changed = cancel_rx.changed() => {
                if changed.is_err() || *cancel_rx.borrow() {
                    log::info!("[Monitor] Polling cancelled");
                    state.write().await.active = false;
                    break;
                }
            }
            _ = ticker.tick() => {
                // Two sequential reads per tick: status first, then the
                // full log snapshot.
                let status = backend.fetch_status().await;
                let logs = backend.fetch_logs().await;

                let mut terminal = None;
                {
                    let mut visible = state.write().await;

                    match status {
                        Ok(snapshot) => {
                            visible.consecutive_failures = 0;

                            let clamped = snapshot.progress.min(100);
                            if clamped > visible.progress {
                                visible.progress = clamped;
                                let _ = event_tx.try_send(MonitorEvent::Progress(clamped));
                            }
                            if snapshot.stage != visible.stage {
                                visible.stage = snapshot.stage.clone();
                                let _ = event_tx.try_send(MonitorEvent::Stage(snapshot.stage.clone()));
                            }
                            visible.eta = snapshot.eta.clone();
                            visible.active = snapshot.active;

                            // Terminal check uses this tick's status, never
                            // a stale one.
                            if snapshot.is_terminal() {
                                let outcome = snapshot.terminal_outcome();
                                visible.active = false;
                                visible.outcome = Some(outcome);
                                terminal = Some(outcome);
                            }
                        }
                        Err(e) => {
                            // Transient fault: keep previous values, keep
                            // polling. The next tick corrects a missed one.
                            visible.consecutive_failures += 1;
                            log::warn!(
                                "[Monitor] Status read failed ({} consecutive): {}",
                                visible.consecutive_failures,
                                e
                            );
                            let _ = event_tx.try_send(MonitorEvent::PollFailed(e.to_string()));
                        }
                    }

                    match logs {
                        Ok(lines) => {
                            if lines != visible.logs {
                                visible.logs = lines.clone();
                                let _ = event_tx.try_send(MonitorEvent::Logs(lines));
                            }
                        }
                        Err(e) => {
                            log::debug!("[Monitor] Log read failed, keeping previous snapshot: {}", e);
                        }
                    }
                }

                if let Some(outcome) = terminal {
                    log::info!("[Monitor] Build terminal: {}", outcome);
                    let _ = event_tx.send(MonitorEvent::Finished(outcome)).await;
                    break;
                }
            }
        }
    }
}
