//! Applications and workflows

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{ApplicationId, WorkflowId};

/// An application registered with the build service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: ApplicationId,
    #[serde(rename = "appName", default)]
    pub name: String,
}

/// Body of `GET /apps`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplicationList {
    #[serde(default)]
    pub applications: Vec<Application>,
}

/// Body of `GET /apps/{id}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplicationDetail {
    #[serde(rename = "appName", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub workflows: BTreeMap<WorkflowId, Workflow>,
}

/// Workflow metadata as listed in the application detail
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workflow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Workflow {
    /// Name shown to the operator
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Unnamed")
    }
}

/// Find the first application whose display name contains `fragment`,
/// ignoring case. Entries without an identifier never match.
#[must_use]
pub fn find_application<'a>(apps: &'a [Application], fragment: &str) -> Option<&'a Application> {
    let needle = fragment.to_lowercase();
    apps.iter()
        .filter(|app| !app.id.is_empty())
        .find(|app| app.name.to_lowercase().contains(&needle))
}
