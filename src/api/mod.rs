//! Collaborator contract for the external build/search service.
//!
//! The service performs dependency checks, repository search, build
//! execution, and log collection; this crate only consumes its JSON
//! request/response surface. Everything behind [`BackendClient`] is
//! replaceable in tests with a scripted implementation.

pub mod http;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::models::{BuildRequest, RepositoryHit, SearchProvider, SourceKind, TerminalOutcome};

pub use http::HttpBackend;

/// `/api/health` reply.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthReply {
    pub status: String,
    #[serde(default)]
    pub service: String,
}

/// `/api/system/check` reply: which build prerequisites are present on the
/// machine hosting the collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemReadiness {
    #[serde(default)]
    pub installed: Vec<String>,
    #[serde(default)]
    pub missing: Vec<String>,
    #[serde(default)]
    pub system_ready: bool,
}

/// `/api/system/install-dependencies` reply.
#[derive(Debug, Clone, Deserialize)]
pub struct InstallReport {
    pub status: String,
    #[serde(default)]
    pub message: String,
}

impl InstallReport {
    pub fn succeeded(&self) -> bool {
        self.status == "success"
    }
}

/// Body sent to both search endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct SearchRequest {
    pub query: String,
    pub source_type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SearchReply {
    #[serde(default)]
    pub results: Vec<RepositoryHit>,
}

/// `/api/build/start` acceptance reply.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildAccepted {
    pub status: String,
    #[serde(default)]
    pub build_id: Option<String>,
    #[serde(default)]
    pub message: String,
}

impl BuildAccepted {
    pub fn accepted(&self) -> bool {
        self.status == "success"
    }
}

/// `/api/build/status` snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusSnapshot {
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub stage: String,
    #[serde(default)]
    pub progress: u32,
    #[serde(default)]
    pub eta: String,
    #[serde(default)]
    pub build_id: Option<String>,
    /// Contract extension; absent from the original backend.
    #[serde(default)]
    pub outcome: Option<TerminalOutcome>,
}

impl StatusSnapshot {
    /// Full progress alone is terminal, independent of `active`.
    pub fn is_terminal(&self) -> bool {
        self.progress >= 100 || !self.active
    }

    /// The explicit outcome when reported, a derived one otherwise.
    pub fn terminal_outcome(&self) -> TerminalOutcome {
        self.outcome.unwrap_or(if self.progress >= 100 {
            TerminalOutcome::Completed
        } else {
            TerminalOutcome::Stopped
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct LogsReply {
    #[serde(default)]
    pub logs: Vec<String>,
}

/// Client seam over the collaborator.
///
/// Object-safe so the wizard, monitor, and tests can share one handle type.
pub trait BackendClient: Send + Sync {
    /// Health ping, used before the wizard starts.
    fn ping(&self) -> BoxFuture<'_, Result<HealthReply, ApiError>>;

    /// Dependency/readiness probe gating `Setup -> DeviceTree`.
    fn check_system(&self) -> BoxFuture<'_, Result<SystemReadiness, ApiError>>;

    /// Ask the collaborator to install missing build prerequisites.
    fn install_dependencies(&self) -> BoxFuture<'_, Result<InstallReport, ApiError>>;

    /// Repository search scoped by source kind; result order is the
    /// collaborator's and is kept as-is.
    fn search_sources(
        &self,
        provider: SearchProvider,
        kind: SourceKind,
        query: String,
    ) -> BoxFuture<'_, Result<Vec<RepositoryHit>, ApiError>>;

    /// Hand a validated build request to the execution engine.
    fn submit_build(&self, request: BuildRequest) -> BoxFuture<'_, Result<BuildAccepted, ApiError>>;

    /// Status read, first half of a monitor tick.
    fn fetch_status(&self) -> BoxFuture<'_, Result<StatusSnapshot, ApiError>>;

    /// Log read, second half of a monitor tick. Always a full snapshot.
    fn fetch_logs(&self) -> BoxFuture<'_, Result<Vec<String>, ApiError>>;
}
