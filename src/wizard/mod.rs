//! Guided configuration wizard: ordered steps, gated transitions, and one
//! explicit versioned state aggregate driven by a pure reducer.
//!
//! The wizard collects everything a [`BuildRequest`](crate::models::BuildRequest)
//! needs across six strictly ordered steps. Forward progress is gated on
//! local completeness only; remote validation belongs to the collaborator.
//! Asynchronous effects (searches, submission) run in the controller and
//! re-enter the reducer as actions, so every transition is testable
//! without any rendering or I/O layer.

pub mod source;

use serde::{Deserialize, Serialize};

use crate::api::SystemReadiness;
use crate::error::WizardError;
use crate::models::{
    AcquisitionMode, AndroidVersion, BuildRequest, BuildVariant, ManualSubMode, RepositoryHit,
    SearchProvider, SourceDescriptor, SourceKind,
};

pub use source::{SearchSession, SourceSlot};

/// Wizard steps, strictly ordered, no skipping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WizardStep {
    Setup,
    DeviceTree,
    Kernel,
    Vendor,
    BuildConfig,
    Dashboard,
}

impl WizardStep {
    pub fn ordinal(&self) -> usize {
        match self {
            WizardStep::Setup => 0,
            WizardStep::DeviceTree => 1,
            WizardStep::Kernel => 2,
            WizardStep::Vendor => 3,
            WizardStep::BuildConfig => 4,
            WizardStep::Dashboard => 5,
        }
    }

    pub fn from_ordinal(ordinal: usize) -> Option<Self> {
        match ordinal {
            0 => Some(WizardStep::Setup),
            1 => Some(WizardStep::DeviceTree),
            2 => Some(WizardStep::Kernel),
            3 => Some(WizardStep::Vendor),
            4 => Some(WizardStep::BuildConfig),
            5 => Some(WizardStep::Dashboard),
            _ => None,
        }
    }

    /// The source kind collected at this step, if any.
    pub fn source_kind(&self) -> Option<SourceKind> {
        match self {
            WizardStep::DeviceTree => Some(SourceKind::DeviceTree),
            WizardStep::Kernel => Some(SourceKind::Kernel),
            WizardStep::Vendor => Some(SourceKind::Vendor),
            _ => None,
        }
    }

    /// Back is available on steps 1-4 and performs no validation.
    pub fn can_go_back(&self) -> bool {
        matches!(
            self,
            WizardStep::DeviceTree | WizardStep::Kernel | WizardStep::Vendor | WizardStep::BuildConfig
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WizardStep::Setup => "setup",
            WizardStep::DeviceTree => "device-tree",
            WizardStep::Kernel => "kernel",
            WizardStep::Vendor => "vendor",
            WizardStep::BuildConfig => "build-config",
            WizardStep::Dashboard => "dashboard",
        }
    }
}

impl std::fmt::Display for WizardStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Every mutation the wizard state accepts.
///
/// Search and submission outcomes re-enter here as actions so that the
/// whole flow stays a pure state transition.
#[derive(Debug, Clone)]
pub enum WizardAction {
    ReadinessChecked(SystemReadiness),
    SetDeviceName(String),
    SetDeviceCodename(String),
    SetAndroidVersion(AndroidVersion),
    SetBuildVariant(BuildVariant),
    SetBuildDirectory(String),
    SetAcquisitionMode(SourceKind, AcquisitionMode),
    SetManualSubMode(SourceKind, ManualSubMode),
    ManualValueEdited(SourceKind, String),
    SetSearchProvider(SourceKind, SearchProvider),
    QueryEdited(SourceKind, String),
    SearchCompleted {
        kind: SourceKind,
        token: u64,
        results: Vec<RepositoryHit>,
    },
    SearchFailed {
        kind: SourceKind,
        token: u64,
        error: String,
    },
    ResultSelected(SourceKind, usize),
    Continue,
    Back,
    SubmissionAccepted {
        build_id: Option<String>,
    },
    SubmissionFailed(String),
    DismissSubmitNotice,
    Restart,
}

/// The wizard's entire mutable state as one versioned aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WizardState {
    pub step: WizardStep,
    /// Bumped on every applied mutation; discarded actions leave it alone.
    pub revision: u64,
    pub readiness: Option<SystemReadiness>,
    pub device_name: String,
    pub device_codename: String,
    pub android_version: AndroidVersion,
    pub build_variant: BuildVariant,
    pub build_directory: String,
    pub device_tree: SourceSlot,
    pub kernel: SourceSlot,
    pub vendor: SourceSlot,
    /// Dismissible notice shown after a rejected submission.
    pub submit_notice: Option<String>,
    /// Last error reported by a search, informational only.
    pub search_notice: Option<String>,
    pub accepted_build_id: Option<String>,
    default_build_directory: String,
}

impl WizardState {
    pub fn new(default_build_directory: &str) -> Self {
        WizardState {
            step: WizardStep::Setup,
            revision: 0,
            readiness: None,
            device_name: String::new(),
            device_codename: String::new(),
            android_version: AndroidVersion::default(),
            build_variant: BuildVariant::default(),
            build_directory: default_build_directory.to_string(),
            device_tree: SourceSlot::new(SourceKind::DeviceTree),
            kernel: SourceSlot::new(SourceKind::Kernel),
            vendor: SourceSlot::new(SourceKind::Vendor),
            submit_notice: None,
            search_notice: None,
            accepted_build_id: None,
            default_build_directory: default_build_directory.to_string(),
        }
    }

    pub fn slot(&self, kind: SourceKind) -> &SourceSlot {
        match kind {
            SourceKind::DeviceTree => &self.device_tree,
            SourceKind::Kernel => &self.kernel,
            SourceKind::Vendor => &self.vendor,
        }
    }

    pub fn slot_mut(&mut self, kind: SourceKind) -> &mut SourceSlot {
        match kind {
            SourceKind::DeviceTree => &mut self.device_tree,
            SourceKind::Kernel => &mut self.kernel,
            SourceKind::Vendor => &mut self.vendor,
        }
    }

    pub fn system_ready(&self) -> bool {
        self.readiness.as_ref().map_or(false, |r| r.system_ready)
    }

    /// Whether the Continue control is enabled on the current step.
    ///
    /// A disabled Continue is a gating condition, not a failure; nothing is
    /// surfaced beyond the disabled control.
    pub fn can_continue(&self) -> bool {
        match self.step {
            WizardStep::Setup => self.system_ready(),
            WizardStep::DeviceTree => self.device_tree.spec.is_complete(),
            WizardStep::Kernel => self.kernel.spec.is_complete(),
            WizardStep::Vendor => self.vendor.spec.is_complete(),
            WizardStep::BuildConfig => self.build_request().is_ok(),
            WizardStep::Dashboard => false,
        }
    }

    /// Issue a search token for a kind's step. Used by the controller
    /// before dispatching the remote call; the outcome comes back through
    /// [`WizardAction::SearchCompleted`] / [`WizardAction::SearchFailed`].
    pub fn begin_search(&mut self, kind: SourceKind) -> Result<u64, WizardError> {
        let token = self.slot_mut(kind).begin_search()?;
        self.revision += 1;
        Ok(token)
    }

    /// Assemble the submission payload, enforcing the completeness
    /// invariant. An incomplete request never reaches the remote call.
    pub fn build_request(&self) -> Result<BuildRequest, WizardError> {
        if self.device_name.is_empty() {
            return Err(WizardError::MissingField("device_name"));
        }
        if self.device_codename.is_empty() {
            return Err(WizardError::MissingField("device_codename"));
        }
        if self.build_directory.is_empty() {
            return Err(WizardError::MissingField("build_directory"));
        }

        let descriptor = |slot: &SourceSlot| -> Result<SourceDescriptor, WizardError> {
            match &slot.spec.resolved {
                Some(resolved) if resolved.is_complete() => {
                    Ok(SourceDescriptor::new(slot.kind(), resolved))
                }
                _ => Err(WizardError::SourceUnresolved(slot.kind())),
            }
        };

        Ok(BuildRequest {
            device_name: self.device_name.clone(),
            device_codename: self.device_codename.clone(),
            android_version: self.android_version,
            build_variant: self.build_variant,
            build_directory: self.build_directory.clone(),
            device_tree: descriptor(&self.device_tree)?,
            kernel: descriptor(&self.kernel)?,
            vendor: descriptor(&self.vendor)?,
        })
    }

    /// Apply one action. Gated transitions return an error without
    /// touching the state; stale search responses are dropped silently.
    pub fn apply(&mut self, action: WizardAction) -> Result<(), WizardError> {
        match action {
            WizardAction::ReadinessChecked(readiness) => {
                self.readiness = Some(readiness);
            }
            WizardAction::SetDeviceName(name) => self.device_name = name,
            WizardAction::SetDeviceCodename(codename) => self.device_codename = codename,
            WizardAction::SetAndroidVersion(version) => self.android_version = version,
            WizardAction::SetBuildVariant(variant) => self.build_variant = variant,
            WizardAction::SetBuildDirectory(dir) => self.build_directory = dir,
            WizardAction::SetAcquisitionMode(kind, mode) => {
                // Mode switches never clear an already resolved value.
                self.slot_mut(kind).spec.acquisition_mode = mode;
            }
            WizardAction::SetManualSubMode(kind, sub_mode) => {
                self.slot_mut(kind).spec.manual_sub_mode = sub_mode;
            }
            WizardAction::ManualValueEdited(kind, text) => {
                self.slot_mut(kind).spec.set_manual_value(&text);
            }
            WizardAction::SetSearchProvider(kind, provider) => {
                self.slot_mut(kind).provider = provider;
            }
            WizardAction::QueryEdited(kind, query) => {
                self.slot_mut(kind).session.query = query;
            }
            WizardAction::SearchCompleted { kind, token, results } => {
                if !self.slot_mut(kind).complete_search(token, results) {
                    return Ok(());
                }
                self.search_notice = None;
            }
            WizardAction::SearchFailed { kind, token, error } => {
                if !self.slot_mut(kind).fail_search(token) {
                    return Ok(());
                }
                self.search_notice = Some(error);
            }
            WizardAction::ResultSelected(kind, index) => {
                self.slot_mut(kind).select_result(index)?;
            }
            WizardAction::Continue => {
                if !self.can_continue() {
                    return Err(WizardError::StepIncomplete);
                }
                // BuildConfig -> Dashboard flows through SubmissionAccepted;
                // a bare Continue never skips the submission call.
                let next = match self.step {
                    WizardStep::Setup => WizardStep::DeviceTree,
                    WizardStep::DeviceTree => WizardStep::Kernel,
                    WizardStep::Kernel => WizardStep::Vendor,
                    WizardStep::Vendor => WizardStep::BuildConfig,
                    WizardStep::BuildConfig | WizardStep::Dashboard => {
                        return Err(WizardError::StepIncomplete)
                    }
                };
                log::debug!("[Wizard] {} -> {}", self.step, next);
                self.step = next;
            }
            WizardAction::Back => {
                if !self.step.can_go_back() {
                    return Err(WizardError::StepIncomplete);
                }
                // Non-destructive: already collected state stays intact and
                // repopulates the step's controls on re-entry.
                let prev = WizardStep::from_ordinal(self.step.ordinal() - 1)
                    .unwrap_or(WizardStep::Setup);
                log::debug!("[Wizard] {} -> {} (back)", self.step, prev);
                self.step = prev;
            }
            WizardAction::SubmissionAccepted { build_id } => {
                if self.step != WizardStep::BuildConfig {
                    return Err(WizardError::StepIncomplete);
                }
                self.accepted_build_id = build_id;
                self.submit_notice = None;
                self.step = WizardStep::Dashboard;
            }
            WizardAction::SubmissionFailed(notice) => {
                // Stay on BuildConfig; nothing else is lost and the
                // operator may retry.
                self.submit_notice = Some(notice);
            }
            WizardAction::DismissSubmitNotice => {
                self.submit_notice = None;
            }
            WizardAction::Restart => {
                let default_dir = self.default_build_directory.clone();
                let revision = self.revision;
                *self = WizardState::new(&default_dir);
                self.revision = revision;
            }
        }

        self.revision += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready() -> SystemReadiness {
        SystemReadiness {
            installed: vec!["git".to_string(), "repo".to_string()],
            missing: vec![],
            system_ready: true,
        }
    }

    fn hit(url: &str) -> RepositoryHit {
        RepositoryHit {
            name: "repo".to_string(),
            full_name: "owner/repo".to_string(),
            description: None,
            clone_url: url.to_string(),
            stars: 5,
            updated_at: None,
        }
    }

    fn resolve_manually(state: &mut WizardState, kind: SourceKind, value: &str) {
        state
            .apply(WizardAction::SetAcquisitionMode(kind, AcquisitionMode::Manual))
            .unwrap();
        state
            .apply(WizardAction::ManualValueEdited(kind, value.to_string()))
            .unwrap();
    }

    #[test]
    fn test_setup_gated_on_readiness() {
        let mut state = WizardState::new("~/aosp");
        assert!(!state.can_continue());
        assert_eq!(state.apply(WizardAction::Continue), Err(WizardError::StepIncomplete));
        assert_eq!(state.step, WizardStep::Setup);

        state.apply(WizardAction::ReadinessChecked(ready())).unwrap();
        assert!(state.can_continue());
        state.apply(WizardAction::Continue).unwrap();
        assert_eq!(state.step, WizardStep::DeviceTree);
    }

    #[test]
    fn test_source_steps_gate_on_completion() {
        let mut state = WizardState::new("~/aosp");
        state.apply(WizardAction::ReadinessChecked(ready())).unwrap();
        state.apply(WizardAction::Continue).unwrap();

        assert!(state.apply(WizardAction::Continue).is_err());

        resolve_manually(&mut state, SourceKind::DeviceTree, "https://g/device.git");
        state.apply(WizardAction::Continue).unwrap();
        assert_eq!(state.step, WizardStep::Kernel);
    }

    #[test]
    fn test_back_is_non_destructive() {
        let mut state = WizardState::new("~/aosp");
        state.apply(WizardAction::ReadinessChecked(ready())).unwrap();
        state.apply(WizardAction::Continue).unwrap();
        resolve_manually(&mut state, SourceKind::DeviceTree, "https://g/device.git");
        state.apply(WizardAction::Continue).unwrap();

        state.apply(WizardAction::Back).unwrap();
        assert_eq!(state.step, WizardStep::DeviceTree);
        assert_eq!(
            state.device_tree.spec.resolved_value(),
            Some("https://g/device.git")
        );

        // Re-entering after Back leaves the already resolved step complete.
        assert!(state.can_continue());
    }

    #[test]
    fn test_back_unavailable_on_setup_and_dashboard() {
        let mut state = WizardState::new("~/aosp");
        assert!(state.apply(WizardAction::Back).is_err());
    }

    #[test]
    fn test_submission_requires_complete_request() {
        let mut state = WizardState::new("~/aosp");
        state.apply(WizardAction::ReadinessChecked(ready())).unwrap();
        state.apply(WizardAction::Continue).unwrap();
        resolve_manually(&mut state, SourceKind::DeviceTree, "https://g/device.git");
        state.apply(WizardAction::Continue).unwrap();
        resolve_manually(&mut state, SourceKind::Kernel, "https://g/kernel.git");
        state.apply(WizardAction::Continue).unwrap();
        resolve_manually(&mut state, SourceKind::Vendor, "https://g/vendor.git");
        state.apply(WizardAction::Continue).unwrap();
        assert_eq!(state.step, WizardStep::BuildConfig);

        // Device identity still missing.
        assert_eq!(
            state.build_request(),
            Err(WizardError::MissingField("device_name"))
        );
        assert!(!state.can_continue());

        state
            .apply(WizardAction::SetDeviceName("Lenovo K10 Note".to_string()))
            .unwrap();
        state
            .apply(WizardAction::SetDeviceCodename("kunlun2".to_string()))
            .unwrap();
        assert!(state.build_request().is_ok());
    }

    #[test]
    fn test_submission_failure_keeps_state() {
        let mut state = WizardState::new("~/aosp");
        state.apply(WizardAction::ReadinessChecked(ready())).unwrap();
        state
            .apply(WizardAction::SubmissionFailed("connection refused".to_string()))
            .unwrap();
        assert_eq!(state.submit_notice.as_deref(), Some("connection refused"));
        assert!(state.readiness.is_some());

        state.apply(WizardAction::DismissSubmitNotice).unwrap();
        assert!(state.submit_notice.is_none());
    }

    #[test]
    fn test_accepted_submission_reaches_dashboard() {
        let mut state = WizardState::new("~/aosp");
        state.apply(WizardAction::ReadinessChecked(ready())).unwrap();
        state.apply(WizardAction::Continue).unwrap();
        for kind in SourceKind::ALL {
            resolve_manually(&mut state, kind, "https://g/src.git");
            state.apply(WizardAction::Continue).unwrap();
        }
        state
            .apply(WizardAction::SetDeviceName("Pixel 9".to_string()))
            .unwrap();
        state
            .apply(WizardAction::SetDeviceCodename("tokay".to_string()))
            .unwrap();

        state
            .apply(WizardAction::SubmissionAccepted {
                build_id: Some("abc123".to_string()),
            })
            .unwrap();
        assert_eq!(state.step, WizardStep::Dashboard);
        assert_eq!(state.accepted_build_id.as_deref(), Some("abc123"));
    }

    #[test]
    fn test_restart_resets_everything() {
        let mut state = WizardState::new("~/aosp");
        state.apply(WizardAction::ReadinessChecked(ready())).unwrap();
        state
            .apply(WizardAction::SetBuildDirectory("/tmp/other".to_string()))
            .unwrap();
        resolve_manually(&mut state, SourceKind::Kernel, "https://g/kernel.git");
        let revision_before = state.revision;

        state.apply(WizardAction::Restart).unwrap();
        assert_eq!(state.step, WizardStep::Setup);
        assert!(state.readiness.is_none());
        assert!(!state.kernel.spec.is_complete());
        assert_eq!(state.build_directory, "~/aosp");
        assert!(state.revision > revision_before, "revision must keep increasing");
    }

    #[test]
    fn test_search_completion_lands_and_selects() {
        let mut state = WizardState::new("~/aosp");
        let token = state.begin_search(SourceKind::DeviceTree).unwrap();
        state
            .apply(WizardAction::SearchCompleted {
                kind: SourceKind::DeviceTree,
                token,
                results: vec![hit("https://g/a.git"), hit("https://g/b.git")],
            })
            .unwrap();
        state
            .apply(WizardAction::ResultSelected(SourceKind::DeviceTree, 0))
            .unwrap();
        assert_eq!(state.device_tree.spec.resolved_value(), Some("https://g/a.git"));
        assert!(state.device_tree.session.results.is_empty());
    }

    #[test]
    fn test_stale_search_response_does_not_bump_revision() {
        let mut state = WizardState::new("~/aosp");
        let first = state.begin_search(SourceKind::Kernel).unwrap();
        state
            .apply(WizardAction::SearchFailed {
                kind: SourceKind::Kernel,
                token: first,
                error: "timeout".to_string(),
            })
            .unwrap();
        let _second = state.begin_search(SourceKind::Kernel).unwrap();
        let revision = state.revision;

        state
            .apply(WizardAction::SearchCompleted {
                kind: SourceKind::Kernel,
                token: first,
                results: vec![hit("https://g/stale.git")],
            })
            .unwrap();
        assert_eq!(state.revision, revision);
        assert!(state.kernel.session.results.is_empty());
    }
}
