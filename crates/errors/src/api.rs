//! Remote build API error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum ApiError {
    #[error("{what} not found: {query}")]
    NotFound { what: String, query: String },

    #[error("service returned HTTP {status}: {body}")]
    Service { status: u16, body: String },

    #[error("authentication rejected (HTTP {status}): {body}")]
    Authentication { status: u16, body: String },

    #[error("unexpected response: {message}")]
    UnexpectedResponse { message: String },
}

impl ApiError {
    /// Classify a non-success response.
    ///
    /// 401 and 403 become [`ApiError::Authentication`]; every other status
    /// becomes [`ApiError::Service`]. The body is kept verbatim.
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        match status {
            401 | 403 => Self::Authentication { status, body },
            _ => Self::Service { status, body },
        }
    }

    /// Application lookup miss
    pub fn application_not_found(query: impl Into<String>) -> Self {
        Self::NotFound {
            what: "application".to_string(),
            query: query.into(),
        }
    }
}

impl UserFacingError for ApiError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::NotFound { .. } => {
                Some("Make sure the repository is connected to the build service.")
            }
            Self::Authentication { .. } => {
                Some("Create a new API token under User Settings > Integrations and retry.")
            }
            Self::Service { status, .. } if *status >= 500 => {
                Some("The build service reported an internal error; try again later.")
            }
            Self::Service { .. } => Some("Check the workflow and branch names."),
            Self::UnexpectedResponse { .. } => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::Service { status, .. } if *status >= 500 || *status == 429)
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::NotFound { .. } => "api.not_found",
            Self::Service { .. } => "api.service",
            Self::Authentication { .. } => "api.authentication",
            Self::UnexpectedResponse { .. } => "api.unexpected_response",
        })
    }
}
