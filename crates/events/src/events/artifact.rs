use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Artifact download events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ArtifactEvent {
    /// Build produced nothing to download
    NoneAvailable { build_id: String },

    /// Downloads are about to start
    BatchStarted { count: usize, output_dir: PathBuf },

    /// Single artifact download started
    Started { name: String, url: String },

    /// Artifact written to disk
    Saved {
        name: String,
        path: PathBuf,
        bytes: u64,
    },

    /// Artifact could not be retrieved; siblings continue
    Failed {
        name: String,
        code: Option<String>,
        message: String,
    },

    /// All downloads attempted
    BatchCompleted { saved: usize, failed: usize },
}
