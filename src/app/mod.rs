//! AppController: central orchestrator for AOSP Forge.
//!
//! Owns the backend handle, the wizard state aggregate, the event channel,
//! and the monitor handle. Asynchronous effects (readiness checks,
//! searches, submission) run here and re-enter the wizard reducer as
//! actions, keeping the state machine itself free of I/O.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex, RwLock};

use crate::api::{BackendClient, HealthReply, InstallReport, SystemReadiness};
use crate::config::Settings;
use crate::error::{ApiError, WizardError};
use crate::log_collector::LogCollector;
use crate::models::SourceKind;
use crate::monitor::{BuildMonitor, BuildMonitorState, MonitorEvent, MonitorHandle};
use crate::wizard::{WizardAction, WizardState, WizardStep};

/// Discrete events surfaced to whoever renders the core.
#[derive(Debug, Clone)]
pub enum AppEvent {
    ReadinessUpdated(SystemReadiness),
    SearchCompleted { kind: SourceKind, hits: usize },
    SearchFailed { kind: SourceKind, error: String },
    SubmissionAccepted { build_id: Option<String> },
    SubmissionFailed(String),
    Monitor(MonitorEvent),
}

/// Central state manager wiring wizard, backend, and monitor.
pub struct AppController {
    settings: Settings,
    backend: Arc<dyn BackendClient>,
    state: Arc<RwLock<WizardState>>,
    event_tx: mpsc::Sender<AppEvent>,
    monitor: Mutex<Option<MonitorHandle>>,
    log_collector: Option<Arc<LogCollector>>,
}

impl AppController {
    pub fn new(
        settings: Settings,
        backend: Arc<dyn BackendClient>,
        event_tx: mpsc::Sender<AppEvent>,
        log_collector: Option<Arc<LogCollector>>,
    ) -> Self {
        let state = WizardState::new(&settings.default_build_directory);
        AppController {
            settings,
            backend,
            state: Arc::new(RwLock::new(state)),
            event_tx,
            monitor: Mutex::new(None),
            log_collector,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn state(&self) -> Arc<RwLock<WizardState>> {
        Arc::clone(&self.state)
    }

    pub async fn snapshot(&self) -> WizardState {
        self.state.read().await.clone()
    }

    /// Apply a local wizard action.
    pub async fn dispatch(&self, action: WizardAction) -> Result<(), WizardError> {
        self.state.write().await.apply(action)
    }

    /// Health ping against the collaborator.
    pub async fn ping(&self) -> Result<HealthReply, ApiError> {
        self.backend.ping().await
    }

    /// Refresh the readiness report gating `Setup -> DeviceTree`.
    pub async fn check_readiness(&self) -> Result<SystemReadiness, ApiError> {
        let readiness = self.backend.check_system().await?;
        log::info!(
            "[Controller] Readiness: ready={}, missing={:?}",
            readiness.system_ready,
            readiness.missing
        );
        self.state
            .write()
            .await
            .apply(WizardAction::ReadinessChecked(readiness.clone()))
            .ok();
        let _ = self
            .event_tx
            .send(AppEvent::ReadinessUpdated(readiness.clone()))
            .await;
        Ok(readiness)
    }

    /// Ask the collaborator to install missing prerequisites, then
    /// re-check readiness.
    pub async fn install_dependencies(&self) -> Result<InstallReport, ApiError> {
        let report = self.backend.install_dependencies().await?;
        log::info!("[Controller] Dependency install: {}", report.status);
        let _ = self.check_readiness().await;
        Ok(report)
    }

    /// Run a search for one source step.
    ///
    /// Issues a token first, so a duplicate search while this one is in
    /// flight is rejected, and an out-of-order completion is discarded by
    /// the reducer. A failed remote call is not an error here; it lands as
    /// a notice plus an [`AppEvent::SearchFailed`].
    pub async fn search(&self, kind: SourceKind, query: String) -> Result<(), WizardError> {
        let (token, provider) = {
            let mut state = self.state.write().await;
            state
                .apply(WizardAction::QueryEdited(kind, query.clone()))
                .ok();
            let token = state.begin_search(kind)?;
            (token, state.slot(kind).provider)
        };

        log::debug!("[Controller] Searching {} for '{}' (token {})", kind, query, token);

        match self.backend.search_sources(provider, kind, query).await {
            Ok(results) => {
                let hits = results.len();
                self.state
                    .write()
                    .await
                    .apply(WizardAction::SearchCompleted { kind, token, results })
                    .ok();
                let _ = self.event_tx.send(AppEvent::SearchCompleted { kind, hits }).await;
            }
            Err(e) => {
                let error = e.user_message();
                log::warn!("[Controller] {} search failed: {}", kind, error);
                self.state
                    .write()
                    .await
                    .apply(WizardAction::SearchFailed {
                        kind,
                        token,
                        error: error.clone(),
                    })
                    .ok();
                let _ = self.event_tx.send(AppEvent::SearchFailed { kind, error }).await;
            }
        }
        Ok(())
    }

    /// Continue from the current step. On `BuildConfig` this performs the
    /// submission; everywhere else it is a local gated transition.
    pub async fn advance(&self) -> Result<(), WizardError> {
        let at_build_config = self.state.read().await.step == WizardStep::BuildConfig;
        if at_build_config {
            self.submit_build().await
        } else {
            self.dispatch(WizardAction::Continue).await
        }
    }

    pub async fn back(&self) -> Result<(), WizardError> {
        self.dispatch(WizardAction::Back).await
    }

    /// Validate, submit, and on acceptance hand control to the monitor.
    ///
    /// A rejection (transport error or non-success status) keeps the
    /// wizard at `BuildConfig` with a dismissible notice; nothing is lost
    /// and the operator may retry.
    pub async fn submit_build(&self) -> Result<(), WizardError> {
        let request = {
            let state = self.state.read().await;
            if state.step != WizardStep::BuildConfig {
                return Err(WizardError::StepIncomplete);
            }
            state.build_request()?
        };

        log::info!(
            "[Controller] Submitting build: {} ({}) android {} {}",
            request.device_name,
            request.device_codename,
            request.android_version,
            request.build_variant
        );

        if let Some(ref collector) = self.log_collector {
            match collector.start_new_session(&LogCollector::session_filename()) {
                Ok(path) => log::info!("[Controller] Build session log: {}", path.display()),
                Err(e) => log::warn!("[Controller] Could not start session log: {}", e),
            }
        }

        match self.backend.submit_build(request).await {
            Ok(reply) if reply.accepted() => {
                let build_id = reply.build_id.clone();
                self.state
                    .write()
                    .await
                    .apply(WizardAction::SubmissionAccepted {
                        build_id: build_id.clone(),
                    })?;
                let _ = self
                    .event_tx
                    .send(AppEvent::SubmissionAccepted { build_id })
                    .await;
                self.start_monitor().await;
                Ok(())
            }
            Ok(reply) => {
                let notice = if reply.message.is_empty() {
                    format!("Build service returned status '{}'", reply.status)
                } else {
                    reply.message
                };
                self.record_submission_failure(notice).await;
                Ok(())
            }
            Err(e) => {
                self.record_submission_failure(e.user_message()).await;
                Ok(())
            }
        }
    }

    async fn record_submission_failure(&self, notice: String) {
        log::warn!("[Controller] Submission rejected: {}", notice);
        self.state
            .write()
            .await
            .apply(WizardAction::SubmissionFailed(notice.clone()))
            .ok();
        let _ = self.event_tx.send(AppEvent::SubmissionFailed(notice)).await;
    }

    /// Start polling the accepted build and forward its events.
    async fn start_monitor(&self) {
        let (monitor_tx, mut monitor_rx) = mpsc::channel::<MonitorEvent>(256);
        let handle = BuildMonitor::spawn(
            Arc::clone(&self.backend),
            monitor_tx,
            self.settings.poll_interval(),
        );

        let event_tx = self.event_tx.clone();
        tokio::spawn(async move {
            while let Some(event) = monitor_rx.recv().await {
                if event_tx.send(AppEvent::Monitor(event)).await.is_err() {
                    break;
                }
            }
        });

        let mut guard = self.monitor.lock().await;
        if let Some(old) = guard.take() {
            // A previous monitor must never keep mutating state.
            old.stop();
        }
        *guard = Some(handle);
    }

    /// Snapshot of the monitored build, if one was started.
    pub async fn monitor_snapshot(&self) -> Option<BuildMonitorState> {
        let guard = self.monitor.lock().await;
        match guard.as_ref() {
            Some(handle) => Some(handle.snapshot().await),
            None => None,
        }
    }

    /// Whether the monitored build has reached a terminal state.
    pub async fn build_terminal(&self) -> bool {
        let guard = self.monitor.lock().await;
        guard.as_ref().map_or(false, MonitorHandle::is_finished)
    }

    /// Full restart from a terminal Dashboard: drops the monitor state and
    /// returns the wizard to `Setup` with everything cleared.
    pub async fn start_new_build(&self) -> Result<(), WizardError> {
        {
            let state = self.state.read().await;
            if state.step != WizardStep::Dashboard {
                return Err(WizardError::NoActiveBuild);
            }
        }

        {
            let mut guard = self.monitor.lock().await;
            match guard.take() {
                Some(handle) if handle.is_finished() => {
                    handle.shutdown().await;
                }
                Some(handle) => {
                    *guard = Some(handle);
                    return Err(WizardError::BuildStillRunning);
                }
                None => return Err(WizardError::NoActiveBuild),
            }
        }

        log::info!("[Controller] Starting a new build: wizard reset");
        self.dispatch(WizardAction::Restart).await
    }

    /// Unconditional teardown; called when the hosting surface goes away.
    pub async fn shutdown(&self) {
        let handle = self.monitor.lock().await.take();
        if let Some(handle) = handle {
            handle.shutdown().await;
        }
        if let Some(ref collector) = self.log_collector {
            let _ = collector.flush_to_disk();
        }
    }
}
