use serde::{Deserialize, Serialize};

// Declare all domain modules
pub mod application;
pub mod artifact;
pub mod build;
pub mod general;

// Re-export all domain events
pub use application::*;
pub use artifact::*;
pub use build::*;
pub use general::*;

/// Top-level application event enum that aggregates all domain-specific events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event", rename_all = "snake_case")]
pub enum AppEvent {
    /// General utility events (warnings, errors, operations)
    General(GeneralEvent),

    /// Application and workflow lookups
    Application(ApplicationEvent),

    /// Remote build submission and monitoring
    Build(BuildEvent),

    /// Artifact downloads
    Artifact(ArtifactEvent),
}

impl AppEvent {
    /// Determine the appropriate tracing log level for this event
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        use tracing::Level;

        match self {
            // Error-level events
            Self::General(GeneralEvent::OperationFailed { .. }) => Level::ERROR,

            // Warning-level events
            Self::General(GeneralEvent::Warning { .. })
            | Self::Artifact(ArtifactEvent::Failed { .. } | ArtifactEvent::NoneAvailable { .. }) => {
                Level::WARN
            }

            // Debug-level events (internal state)
            Self::General(GeneralEvent::DebugLog { .. })
            | Self::Application(ApplicationEvent::ListRequested)
            | Self::Build(BuildEvent::PollFailed { .. }) => Level::DEBUG,

            // Default to INFO for most events
            _ => Level::INFO,
        }
    }

    /// Get the log target for this event (for structured logging)
    #[must_use]
    pub fn log_target(&self) -> &'static str {
        match self {
            Self::General(_) => "cmbuild::events::general",
            Self::Application(_) => "cmbuild::events::application",
            Self::Build(_) => "cmbuild::events::build",
            Self::Artifact(_) => "cmbuild::events::artifact",
        }
    }
}
