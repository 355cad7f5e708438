//! Build monitoring error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum MonitorError {
    #[error("build {build_id} did not finish within {polls} polls (last status: {})", .last_status.as_deref().unwrap_or("unknown"))]
    PollLimitExceeded {
        build_id: String,
        polls: u32,
        last_status: Option<String>,
    },
}

impl UserFacingError for MonitorError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::PollLimitExceeded { .. } => Some(
                "The build may still be running; raise --max-polls or check the dashboard.",
            ),
        }
    }

    fn is_retryable(&self) -> bool {
        true
    }

    fn user_code(&self) -> Option<&'static str> {
        match self {
            Self::PollLimitExceeded { .. } => Some("monitor.poll_limit_exceeded"),
        }
    }
}
