//! Builds, build status and artifacts

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{ApplicationId, BuildId, WorkflowId};

/// Build status as reported by the remote service.
///
/// The service owns this set; strings we do not know are kept verbatim in
/// [`BuildStatus::Other`] and treated as still in progress.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BuildStatus {
    Queued,
    Preparing,
    Fetching,
    Building,
    Testing,
    Publishing,
    Finishing,
    Finished,
    Failed,
    Canceled,
    Timeout,
    Skipped,
    Other(String),
}

impl BuildStatus {
    /// Statuses after which the build will not change any more
    pub const TERMINAL: [BuildStatus; 4] = [
        BuildStatus::Finished,
        BuildStatus::Failed,
        BuildStatus::Canceled,
        BuildStatus::Timeout,
    ];

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Queued => "queued",
            Self::Preparing => "preparing",
            Self::Fetching => "fetching",
            Self::Building => "building",
            Self::Testing => "testing",
            Self::Publishing => "publishing",
            Self::Finishing => "finishing",
            Self::Finished => "finished",
            Self::Failed => "failed",
            Self::Canceled => "canceled",
            Self::Timeout => "timeout",
            Self::Skipped => "skipped",
            Self::Other(s) => s,
        }
    }

    /// Whether monitoring can stop at this status
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        Self::TERMINAL.contains(self)
    }
}

impl From<String> for BuildStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "queued" => Self::Queued,
            "preparing" => Self::Preparing,
            "fetching" => Self::Fetching,
            "building" => Self::Building,
            "testing" => Self::Testing,
            "publishing" => Self::Publishing,
            "finishing" => Self::Finishing,
            "finished" => Self::Finished,
            "failed" => Self::Failed,
            "canceled" => Self::Canceled,
            "timeout" => Self::Timeout,
            "skipped" => Self::Skipped,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for BuildStatus {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<BuildStatus> for String {
    fn from(status: BuildStatus) -> Self {
        match status {
            BuildStatus::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A produced file, available once the build has finished
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl Artifact {
    #[must_use]
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            url: Some(url.into()),
        }
    }
}

/// Body of `GET /builds/{id}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Build {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: BuildId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<ApplicationId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<WorkflowId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(default)]
    pub status: Option<BuildStatus>,
    #[serde(rename = "artefacts", alias = "artifacts", default)]
    pub artifacts: Vec<Artifact>,
}

impl Build {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.status.as_ref().is_some_and(BuildStatus::is_terminal)
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.status == Some(BuildStatus::Finished)
    }

    /// Status for display, `unknown` when the service did not report one
    #[must_use]
    pub fn status_str(&self) -> &str {
        self.status.as_ref().map_or("unknown", BuildStatus::as_str)
    }
}

/// Body of `POST /builds`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildRequest {
    pub app_id: ApplicationId,
    pub workflow_id: WorkflowId,
    pub branch: String,
}

/// Body of the created response to `POST /builds`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildCreated {
    #[serde(default)]
    pub build_id: Option<BuildId>,
}
