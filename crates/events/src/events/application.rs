use serde::{Deserialize, Serialize};

/// A workflow as reported to the operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowEntry {
    pub id: String,
    pub name: String,
}

/// Application and workflow lookup events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ApplicationEvent {
    /// Application list requested from the service
    ListRequested,

    /// Application list received
    ListFetched { count: usize },

    /// Target application found
    Resolved {
        query: String,
        app_id: String,
        app_name: String,
    },

    /// Workflow definitions received for an application
    WorkflowsListed {
        app_id: String,
        workflows: Vec<WorkflowEntry>,
    },
}
