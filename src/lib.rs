//! AOSP Forge Core
//!
//! This crate provides the guided configuration and live build monitoring
//! core for the AOSP Forge ROM builder. It models sequential, validated
//! data collection across dependent sources, resolves each source through
//! one of several acquisition strategies, and then supervises a
//! long-running, externally executed build job over a polling session.
//!
//! **Architecture**: the external build/search service performs dependency
//! checks, repository lookup, and the build itself; this core only drives
//! its JSON request/response surface.
//!
//! The system is organized into functional modules:
//! - **error**: Unified error type hierarchy
//! - **models**: Core data structures and types
//! - **config**: Settings management
//! - **api**: Collaborator contract and the reqwest client
//! - **wizard**: Step state machine and versioned state aggregate
//! - **monitor**: Polling supervisor for an accepted build
//! - **app**: Controller wiring wizard, backend, and monitor

// Core foundational modules
pub mod error;
pub mod models;

// Settings management
pub mod config;

// Collaborator contract (HTTP client + trait seam)
pub mod api;

// Robust, decoupled logging system
pub mod log_collector;

// Guided configuration state machine
pub mod wizard;

// Live build monitoring
pub mod monitor;

// Controller wiring the pieces together
pub mod app;

// Re-export the log crate for macro usage
pub use log;

// Re-export log collector for use throughout the system
pub use log_collector::{LogCollector, LogLine};

// ============================================================================
// PUBLIC RE-EXPORTS FOR CONVENIENCE
// ============================================================================

// Re-export error types for easy access
pub use error::{ApiError, ConfigError, WizardError};

// Re-export model types for easy access
pub use models::{
    AcquisitionMode,
    AndroidVersion,
    BuildRequest,
    BuildVariant,
    ManualSubMode,
    RepositoryHit,
    ResolveMethod,
    ResolvedSource,
    SearchProvider,
    SourceDescriptor,
    // Enums
    SourceKind,
    // Structs
    SourceSpec,
    TerminalOutcome,
};

// Re-export the collaborator seam
pub use api::{BackendClient, HttpBackend, StatusSnapshot, SystemReadiness};

// Re-export settings management
pub use config::{Settings, SettingsManager};

// Re-export the wizard state machine
pub use wizard::{SearchSession, SourceSlot, WizardAction, WizardState, WizardStep};

// Re-export the build monitor
pub use monitor::{BuildMonitor, BuildMonitorState, MonitorEvent, MonitorHandle};

// Re-export the controller
pub use app::{AppController, AppEvent};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
