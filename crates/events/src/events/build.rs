use serde::{Deserialize, Serialize};

/// Remote build lifecycle events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BuildEvent {
    /// Build request about to be sent
    Submitting {
        app_id: String,
        workflow_id: String,
        branch: String,
    },

    /// Service accepted the build
    Submitted {
        build_id: String,
        dashboard_url: Option<String>,
    },

    /// Polling loop started
    MonitorStarted {
        build_id: String,
        poll_interval_secs: u64,
        max_polls: Option<u32>,
    },

    /// Observed status differs from the previously observed one
    StatusChanged {
        build_id: String,
        status: String,
        elapsed_secs: u64,
    },

    /// A poll produced no build record
    PollFailed {
        build_id: String,
        reason: String,
        consecutive_failures: u32,
        next_delay_ms: u64,
    },

    /// Build reached a terminal status
    Completed {
        build_id: String,
        status: String,
        elapsed_secs: u64,
    },
}
