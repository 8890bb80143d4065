//! Scripted backend shared by the integration suites.
//!
//! Each endpoint replays a queue of canned replies; when a queue is down
//! to its last entry that entry keeps repeating, so a monitor can poll
//! past the end of a script.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use futures::future::BoxFuture;

use aosp_forge::api::{
    BackendClient, BuildAccepted, HealthReply, InstallReport, StatusSnapshot, SystemReadiness,
};
use aosp_forge::error::ApiError;
use aosp_forge::models::{BuildRequest, RepositoryHit, SearchProvider, SourceKind};

/// A constructible stand-in for a remote failure.
pub fn rejected(detail: &str) -> ApiError {
    ApiError::Rejected {
        code: 503,
        detail: detail.to_string(),
    }
}

pub fn ready() -> SystemReadiness {
    SystemReadiness {
        installed: vec!["git".to_string(), "repo".to_string()],
        missing: vec![],
        system_ready: true,
    }
}

pub fn hit(url: &str) -> RepositoryHit {
    RepositoryHit {
        name: "repo".to_string(),
        full_name: "owner/repo".to_string(),
        description: Some("canned".to_string()),
        clone_url: url.to_string(),
        stars: 7,
        updated_at: None,
    }
}

pub fn running(progress: u32, stage: &str) -> StatusSnapshot {
    StatusSnapshot {
        active: true,
        stage: stage.to_string(),
        progress,
        ..Default::default()
    }
}

/// Scripted reply: `Err(detail)` becomes an [`ApiError::Rejected`].
pub type Scripted<T> = Result<T, String>;

pub struct ScriptedBackend {
    pub readiness: Mutex<Scripted<SystemReadiness>>,
    pub search_results: Mutex<Scripted<Vec<RepositoryHit>>>,
    pub submit_reply: Mutex<Scripted<BuildAccepted>>,
    pub statuses: Mutex<VecDeque<Scripted<StatusSnapshot>>>,
    pub logs: Mutex<VecDeque<Scripted<Vec<String>>>>,
    /// Every request that actually reached the submission endpoint.
    pub submitted: Mutex<Vec<BuildRequest>>,
    pub status_reads: AtomicU32,
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        ScriptedBackend {
            readiness: Mutex::new(Ok(ready())),
            search_results: Mutex::new(Ok(vec![])),
            submit_reply: Mutex::new(Ok(BuildAccepted {
                status: "success".to_string(),
                build_id: Some("build-1".to_string()),
                message: "Build started".to_string(),
            })),
            statuses: Mutex::new(VecDeque::from([Ok(running(100, "Build completed"))])),
            logs: Mutex::new(VecDeque::from([Ok(vec!["ready".to_string()])])),
            submitted: Mutex::new(vec![]),
            status_reads: AtomicU32::new(0),
        }
    }
}

impl ScriptedBackend {
    pub fn with_statuses(statuses: Vec<Scripted<StatusSnapshot>>) -> Self {
        ScriptedBackend {
            statuses: Mutex::new(statuses.into()),
            ..Default::default()
        }
    }

    pub fn set_logs(&self, scripts: Vec<Scripted<Vec<String>>>) {
        *self.logs.lock().unwrap() = scripts.into();
    }

    fn next<T: Clone>(queue: &Mutex<VecDeque<Scripted<T>>>) -> Result<T, ApiError> {
        let mut queue = queue.lock().unwrap();
        let entry = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        match entry {
            Some(Ok(value)) => Ok(value),
            Some(Err(detail)) => Err(rejected(&detail)),
            None => Err(rejected("script exhausted")),
        }
    }
}

impl BackendClient for ScriptedBackend {
    fn ping(&self) -> BoxFuture<'_, Result<HealthReply, ApiError>> {
        Box::pin(async {
            Ok(HealthReply {
                status: "healthy".to_string(),
                service: "scripted".to_string(),
            })
        })
    }

    fn check_system(&self) -> BoxFuture<'_, Result<SystemReadiness, ApiError>> {
        Box::pin(async {
            self.readiness
                .lock()
                .unwrap()
                .clone()
                .map_err(|detail| rejected(&detail))
        })
    }

    fn install_dependencies(&self) -> BoxFuture<'_, Result<InstallReport, ApiError>> {
        Box::pin(async {
            Ok(InstallReport {
                status: "success".to_string(),
                message: "Dependencies installed successfully".to_string(),
            })
        })
    }

    fn search_sources(
        &self,
        _provider: SearchProvider,
        _kind: SourceKind,
        _query: String,
    ) -> BoxFuture<'_, Result<Vec<RepositoryHit>, ApiError>> {
        Box::pin(async {
            self.search_results
                .lock()
                .unwrap()
                .clone()
                .map_err(|detail| rejected(&detail))
        })
    }

    fn submit_build(&self, request: BuildRequest) -> BoxFuture<'_, Result<BuildAccepted, ApiError>> {
        Box::pin(async move {
            self.submitted.lock().unwrap().push(request);
            self.submit_reply
                .lock()
                .unwrap()
                .clone()
                .map_err(|detail| rejected(&detail))
        })
    }

    fn fetch_status(&self) -> BoxFuture<'_, Result<StatusSnapshot, ApiError>> {
        Box::pin(async {
            self.status_reads.fetch_add(1, Ordering::SeqCst);
            Self::next(&self.statuses)
        })
    }

    fn fetch_logs(&self) -> BoxFuture<'_, Result<Vec<String>, ApiError>> {
        Box::pin(async { Self::next(&self.logs) })
    }
}
