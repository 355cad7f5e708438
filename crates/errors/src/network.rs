//! Network-related error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum NetworkError {
    #[error("connection timeout to {url}")]
    Timeout { url: String },

    #[error("request failed: {0}")]
    RequestFailed(String),

    #[error("download failed: {0}")]
    DownloadFailed(String),

    #[error("connection refused: {0}")]
    ConnectionRefused(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP error {status}: {message}")]
    HttpError { status: u16, message: String },

    #[error("client initialization failed: {0}")]
    ClientInit(String),
}

impl UserFacingError for NetworkError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::Timeout { .. } | Self::ConnectionRefused(_) => {
                Some("Check your network connection and retry.")
            }
            Self::InvalidUrl(_) => Some("Check `api.base_url` in the configuration file."),
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. }
            | Self::ConnectionRefused(_)
            | Self::RequestFailed(_)
            | Self::DownloadFailed(_) => true,
            Self::HttpError { status, .. } => *status >= 500,
            Self::InvalidUrl(_) | Self::ClientInit(_) => false,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::Timeout { .. } => "network.timeout",
            Self::RequestFailed(_) => "network.request_failed",
            Self::DownloadFailed(_) => "network.download_failed",
            Self::ConnectionRefused(_) => "network.connection_refused",
            Self::InvalidUrl(_) => "network.invalid_url",
            Self::HttpError { .. } => "network.http_error",
            Self::ClientInit(_) => "network.client_init",
        })
    }
}
