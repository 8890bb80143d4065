//! Unified error type hierarchy for AOSP Forge.
//!
//! Provides structured error handling with ApiError, ConfigError, and
//! WizardError.

use std::io;
use thiserror::Error;

use crate::models::SourceKind;

/// Errors talking to the external build/search collaborator.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend rejected the call ({code}): {detail}")]
    Rejected { code: u16, detail: String },

    #[error("invalid response payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
}

impl ApiError {
    /// Get a user-facing error message suitable for display
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Transport(e) => format!("Could not reach the build service: {}", e),
            ApiError::Rejected { code, detail } => {
                format!("Build service refused the request ({}): {}", code, detail)
            }
            ApiError::InvalidPayload(e) => format!("Unexpected response from build service: {}", e),
        }
    }
}

/// Configuration file parsing and validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Settings file not found: {0}")]
    FileNotFound(String),

    #[error("Invalid JSON in settings: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Settings validation failed: {0}")]
    ValidationFailed(String),

    #[error("IO error during settings operations: {0}")]
    IoError(#[from] io::Error),
}

/// Local wizard invariant violations.
///
/// These block the transition locally; no remote call is ever made for
/// them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WizardError {
    #[error("required field missing: {0}")]
    MissingField(&'static str),

    #[error("{0} source is not resolved")]
    SourceUnresolved(SourceKind),

    #[error("a {0} search is already in flight")]
    SearchInFlight(SourceKind),

    #[error("no search result at index {0}")]
    NoSuchResult(usize),

    #[error("step is not complete")]
    StepIncomplete,

    #[error("no build has been accepted yet")]
    NoActiveBuild,

    #[error("the monitored build has not reached a terminal state")]
    BuildStillRunning,
}
