//! Operation orchestration error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum OpsError {
    #[error("component not found: {component}")]
    MissingComponent { component: String },
}

impl UserFacingError for OpsError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_code(&self) -> Option<&'static str> {
        match self {
            Self::MissingComponent { .. } => Some("ops.missing_component"),
        }
    }
}
