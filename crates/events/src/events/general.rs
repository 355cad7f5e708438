use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// General utility events for warnings, debug output and operations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GeneralEvent {
    /// Generic warning message with optional context
    Warning {
        message: String,
        context: Option<String>,
    },

    /// Debug logging with structured context
    DebugLog {
        message: String,
        context: HashMap<String, String>,
    },

    /// Generic operation started notification
    OperationStarted { operation: String },

    /// Generic operation completion with success status
    OperationCompleted { operation: String, success: bool },

    /// Generic operation failure with error details
    OperationFailed { operation: String, error: String },
}

impl GeneralEvent {
    /// Create a warning event with context
    pub fn warning_with_context(message: impl Into<String>, context: impl Into<String>) -> Self {
        Self::Warning {
            message: message.into(),
            context: Some(context.into()),
        }
    }

    /// Create a debug log event with context
    pub fn debug_with_context(message: impl Into<String>, context: HashMap<String, String>) -> Self {
        Self::DebugLog {
            message: message.into(),
            context,
        }
    }
}
