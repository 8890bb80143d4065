//! Core data types for AOSP Forge.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Artifact category the wizard resolves before a build can start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    #[serde(rename = "device")]
    DeviceTree,
    #[serde(rename = "kernel")]
    Kernel,
    #[serde(rename = "vendor")]
    Vendor,
}

impl SourceKind {
    /// All kinds in wizard step order.
    pub const ALL: [SourceKind; 3] = [SourceKind::DeviceTree, SourceKind::Kernel, SourceKind::Vendor];

    /// Wire value used by the search and submission payloads.
    pub fn source_type(&self) -> &'static str {
        match self {
            SourceKind::DeviceTree => "device",
            SourceKind::Kernel => "kernel",
            SourceKind::Vendor => "vendor",
        }
    }

    /// Position within [`SourceKind::ALL`].
    pub fn index(&self) -> usize {
        match self {
            SourceKind::DeviceTree => 0,
            SourceKind::Kernel => 1,
            SourceKind::Vendor => 2,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::DeviceTree => write!(f, "device tree"),
            SourceKind::Kernel => write!(f, "kernel"),
            SourceKind::Vendor => write!(f, "vendor"),
        }
    }
}

/// Strategy for resolving a source kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AcquisitionMode {
    Search,
    Manual,
}

impl Default for AcquisitionMode {
    fn default() -> Self {
        AcquisitionMode::Search
    }
}

/// Manual entry sub-mode: a clone URL or a local path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManualSubMode {
    Url,
    Local,
}

impl Default for ManualSubMode {
    fn default() -> Self {
        ManualSubMode::Url
    }
}

/// Hosting provider used for search-based resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchProvider {
    Github,
    Gitlab,
}

impl SearchProvider {
    /// The resolve method recorded when a hit from this provider is selected.
    pub fn method(&self) -> ResolveMethod {
        match self {
            SearchProvider::Github => ResolveMethod::Github,
            SearchProvider::Gitlab => ResolveMethod::Gitlab,
        }
    }
}

impl Default for SearchProvider {
    fn default() -> Self {
        SearchProvider::Github
    }
}

impl fmt::Display for SearchProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchProvider::Github => write!(f, "github"),
            SearchProvider::Gitlab => write!(f, "gitlab"),
        }
    }
}

impl FromStr for SearchProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "github" => Ok(SearchProvider::Github),
            "gitlab" => Ok(SearchProvider::Gitlab),
            _ => Err(format!("Unknown search provider: {}", s)),
        }
    }
}

/// Where a resolved source descriptor points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolveMethod {
    Github,
    Gitlab,
    Url,
    Local,
}

impl fmt::Display for ResolveMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveMethod::Github => write!(f, "github"),
            ResolveMethod::Gitlab => write!(f, "gitlab"),
            ResolveMethod::Url => write!(f, "url"),
            ResolveMethod::Local => write!(f, "local"),
        }
    }
}

/// Finalized `(method, value)` pair identifying where a source comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedSource {
    pub method: ResolveMethod,
    pub value: String,
}

impl ResolvedSource {
    pub fn new(method: ResolveMethod, value: impl Into<String>) -> Self {
        ResolvedSource {
            method,
            value: value.into(),
        }
    }

    /// A descriptor is usable only once it carries a non-empty value.
    pub fn is_complete(&self) -> bool {
        !self.value.is_empty()
    }
}

/// Per-kind resolution state collected by the wizard.
///
/// Created empty when the wizard enters the kind's step and kept until a
/// full restart. Switching acquisition modes never clears `resolved`; only
/// an explicit selection or edit overwrites it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSpec {
    pub kind: SourceKind,
    pub acquisition_mode: AcquisitionMode,
    pub manual_sub_mode: ManualSubMode,
    pub resolved: Option<ResolvedSource>,
}

impl SourceSpec {
    pub fn new(kind: SourceKind) -> Self {
        SourceSpec {
            kind,
            acquisition_mode: AcquisitionMode::default(),
            manual_sub_mode: ManualSubMode::default(),
            resolved: None,
        }
    }

    /// Completion gates forward navigation past this kind's step.
    pub fn is_complete(&self) -> bool {
        self.resolved.as_ref().map_or(false, ResolvedSource::is_complete)
    }

    pub fn resolved_value(&self) -> Option<&str> {
        self.resolved.as_ref().map(|r| r.value.as_str())
    }

    /// Recompute the resolved descriptor from manual input.
    ///
    /// Any non-empty text is accepted as complete; no URL or path shape
    /// validation happens here (the build collaborator owns that).
    pub fn set_manual_value(&mut self, text: &str) {
        if text.is_empty() {
            self.resolved = None;
        } else {
            let method = match self.manual_sub_mode {
                ManualSubMode::Url => ResolveMethod::Url,
                ManualSubMode::Local => ResolveMethod::Local,
            };
            self.resolved = Some(ResolvedSource::new(method, text));
        }
    }

    /// Finalize this source from a selected search hit.
    pub fn select_hit(&mut self, provider: SearchProvider, hit: &RepositoryHit) {
        self.resolved = Some(ResolvedSource::new(provider.method(), hit.clone_url.clone()));
    }
}

/// One repository returned by the search collaborator.
///
/// Field names follow the search payload; ordering within a result list is
/// authoritative and never re-ranked locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryHit {
    pub name: String,
    pub full_name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub clone_url: String,
    #[serde(default)]
    pub stars: u64,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Android platform release targeted by the build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AndroidVersion {
    #[serde(rename = "14")]
    V14,
    #[serde(rename = "15")]
    V15,
    #[serde(rename = "16")]
    V16,
}

impl AndroidVersion {
    /// Convert to UI index (0=14, 1=15, 2=16)
    pub fn to_index(&self) -> usize {
        match self {
            AndroidVersion::V14 => 0,
            AndroidVersion::V15 => 1,
            AndroidVersion::V16 => 2,
        }
    }

    /// Convert from UI index (0=14, 1=15, 2=16)
    pub fn from_index(index: usize) -> Self {
        match index {
            0 => AndroidVersion::V14,
            2 => AndroidVersion::V16,
            _ => AndroidVersion::V15,
        }
    }
}

impl fmt::Display for AndroidVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AndroidVersion::V14 => write!(f, "14"),
            AndroidVersion::V15 => write!(f, "15"),
            AndroidVersion::V16 => write!(f, "16"),
        }
    }
}

impl FromStr for AndroidVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "14" => Ok(AndroidVersion::V14),
            "15" => Ok(AndroidVersion::V15),
            "16" => Ok(AndroidVersion::V16),
            _ => Err(format!("Unsupported Android version: {}", s)),
        }
    }
}

impl Default for AndroidVersion {
    fn default() -> Self {
        AndroidVersion::V15
    }
}

/// Build variant passed through to the lunch target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildVariant {
    User,
    Userdebug,
    Eng,
}

impl fmt::Display for BuildVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildVariant::User => write!(f, "user"),
            BuildVariant::Userdebug => write!(f, "userdebug"),
            BuildVariant::Eng => write!(f, "eng"),
        }
    }
}

impl FromStr for BuildVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(BuildVariant::User),
            "userdebug" => Ok(BuildVariant::Userdebug),
            "eng" => Ok(BuildVariant::Eng),
            _ => Err(format!("Unknown build variant: {}", s)),
        }
    }
}

impl Default for BuildVariant {
    fn default() -> Self {
        BuildVariant::Userdebug
    }
}

/// Wire shape of one source inside the submission payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    pub source_type: String,
    pub method: ResolveMethod,
    pub value: String,
}

impl SourceDescriptor {
    pub fn new(kind: SourceKind, resolved: &ResolvedSource) -> Self {
        SourceDescriptor {
            source_type: kind.source_type().to_string(),
            method: resolved.method,
            value: resolved.value.clone(),
        }
    }
}

/// Fully assembled build request, submitted once at the wizard-to-monitor
/// transition. Serializes to the collaborator's `/api/build/start` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildRequest {
    pub device_name: String,
    pub device_codename: String,
    pub android_version: AndroidVersion,
    pub build_variant: BuildVariant,
    pub build_directory: String,
    pub device_tree: SourceDescriptor,
    pub kernel: SourceDescriptor,
    pub vendor: SourceDescriptor,
}

impl BuildRequest {
    /// Completeness invariant: all six required fields plus all three
    /// descriptors must be non-empty. Invalid requests never reach the
    /// submission call.
    pub fn is_valid(&self) -> bool {
        !self.device_name.is_empty()
            && !self.device_codename.is_empty()
            && !self.build_directory.is_empty()
            && !self.device_tree.value.is_empty()
            && !self.kernel.value.is_empty()
            && !self.vendor.value.is_empty()
    }
}

/// Explicit terminal outcome of a monitored build.
///
/// The status contract only carries `active` and `progress`; when the
/// collaborator does not report an outcome, the monitor derives one:
/// `Completed` at full progress, `Stopped` otherwise. `Stopped` makes no
/// claim about failure versus cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TerminalOutcome {
    Completed,
    Failed,
    Cancelled,
    Stopped,
}

impl TerminalOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TerminalOutcome::Completed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TerminalOutcome::Completed => "completed",
            TerminalOutcome::Failed => "failed",
            TerminalOutcome::Cancelled => "cancelled",
            TerminalOutcome::Stopped => "stopped",
        }
    }
}

impl fmt::Display for TerminalOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
