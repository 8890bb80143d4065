//! Settings management for AOSP Forge.
//!
//! `Settings` holds the small set of operator-tunable values the core
//! needs: where the build collaborator lives, the default build directory
//! offered by the wizard, and the monitor cadence. State is persisted as
//! pretty JSON under `~/.config/aosp-forge/settings.json`.

pub mod loader;

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::models::SearchProvider;

/// Operator-tunable application settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the build/search collaborator.
    pub backend_url: String,

    /// Default offered for `BuildRequest.build_directory`; user-editable
    /// in the wizard.
    pub default_build_directory: String,

    /// Monitor cadence in seconds.
    pub poll_interval_secs: u64,

    /// Per-request HTTP timeout in seconds.
    pub request_timeout_secs: u64,

    /// Search provider preselected for new source steps.
    pub default_search_provider: SearchProvider,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            backend_url: "http://localhost:8001".to_string(),
            default_build_directory: "~/aosp".to_string(),
            poll_interval_secs: 2,
            request_timeout_secs: 10,
            default_search_provider: SearchProvider::Github,
        }
    }
}

impl Settings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend_url.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "backend_url cannot be empty".to_string(),
            ));
        }
        if self.default_build_directory.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "default_build_directory cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Loads and persists [`Settings`] at the global location.
pub struct SettingsManager;

impl SettingsManager {
    /// Load settings, falling back to defaults when no file exists yet.
    pub fn load() -> Result<Settings, ConfigError> {
        let path = loader::get_global_settings_path()?;
        if !path.exists() {
            log::info!("[Settings] No settings file yet, using defaults");
            return Ok(Settings::default());
        }
        let settings = loader::load_settings_from_file(&path)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Persist settings to the global location, creating the directory on
    /// first save.
    pub fn save(settings: &Settings) -> Result<(), ConfigError> {
        settings.validate()?;
        loader::ensure_settings_dir_exists()?;
        let path = loader::get_global_settings_path()?;
        loader::save_settings_to_file(settings, &path)
    }
}
