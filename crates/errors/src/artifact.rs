//! Artifact retrieval error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum ArtifactError {
    #[error("failed to download {name}: {reason}")]
    DownloadFailed { name: String, reason: String },

    #[error("artifact entry is incomplete: {reason}")]
    Incomplete { reason: String },

    #[error("invalid artifact name: {name}")]
    InvalidName { name: String },
}

impl UserFacingError for ArtifactError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::DownloadFailed { .. } => {
                Some("Download the artifact from the build dashboard instead.")
            }
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::DownloadFailed { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::DownloadFailed { .. } => "artifact.download_failed",
            Self::Incomplete { .. } => "artifact.incomplete",
            Self::InvalidName { .. } => "artifact.invalid_name",
        })
    }
}
