#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Error types for cmbuild
//!
//! This crate provides fine-grained error types organized by domain.
//! All error types implement Clone so they can travel inside events.

use std::borrow::Cow;

use thiserror::Error;

pub mod api;
pub mod artifact;
pub mod config;
pub mod monitor;
pub mod network;
pub mod ops;

// Re-export all error types at the root
pub use api::ApiError;
pub use artifact::ArtifactError;
pub use config::ConfigError;
pub use monitor::MonitorError;
pub use network::NetworkError;
pub use ops::OpsError;

/// Generic error type for cross-crate boundaries
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    #[error("api error: {0}")]
    Api(#[from] ApiError),

    #[error("monitor error: {0}")]
    Monitor(#[from] MonitorError),

    #[error("artifact error: {0}")]
    Artifact(#[from] ArtifactError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("ops error: {0}")]
    Ops(#[from] OpsError),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("I/O error: {message}")]
    Io {
        kind: std::io::ErrorKind,
        message: String,
        path: Option<std::path::PathBuf>,
    },
}

impl Error {
    /// Create an internal error with a message
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Create an Io error with an associated path
    pub fn io_with_path(err: &std::io::Error, path: impl Into<std::path::PathBuf>) -> Self {
        Self::Io {
            kind: err.kind(),
            message: err.to_string(),
            path: Some(path.into()),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            kind: err.kind(),
            message: err.to_string(),
            path: None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Api(ApiError::UnexpectedResponse {
            message: format!("invalid JSON: {err}"),
        })
    }
}

/// Result type alias for cmbuild operations
pub type Result<T> = std::result::Result<T, Error>;

/// Minimal interface for rendering user-facing error information without
/// requiring heavyweight envelopes.
pub trait UserFacingError {
    /// Short message suitable for CLI output.
    fn user_message(&self) -> Cow<'_, str>;

    /// Optional remediation hint.
    fn user_hint(&self) -> Option<&'static str> {
        None
    }

    /// Whether retrying the same operation is likely to succeed.
    fn is_retryable(&self) -> bool {
        false
    }

    /// Stable error code for structured reporting.
    fn user_code(&self) -> Option<&'static str> {
        None
    }
}

impl UserFacingError for Error {
    fn user_message(&self) -> Cow<'_, str> {
        match self {
            Error::Network(err) => err.user_message(),
            Error::Api(err) => err.user_message(),
            Error::Monitor(err) => err.user_message(),
            Error::Artifact(err) => err.user_message(),
            Error::Config(err) => err.user_message(),
            Error::Ops(err) => err.user_message(),
            Error::Io { message, path, .. } => match path {
                Some(path) => Cow::Owned(format!("{message} ({})", path.display())),
                None => Cow::Borrowed(message.as_str()),
            },
            Error::Internal(_) => Cow::Owned(self.to_string()),
        }
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Error::Network(err) => err.user_hint(),
            Error::Api(err) => err.user_hint(),
            Error::Monitor(err) => err.user_hint(),
            Error::Artifact(err) => err.user_hint(),
            Error::Config(err) => err.user_hint(),
            Error::Ops(err) => err.user_hint(),
            Error::Io { .. } => Some("Check that the output directory is writable."),
            Error::Internal(_) => None,
        }
    }

    fn is_retryable(&self) -> bool {
        match self {
            Error::Network(err) => err.is_retryable(),
            Error::Api(err) => err.is_retryable(),
            Error::Monitor(err) => err.is_retryable(),
            Error::Artifact(err) => err.is_retryable(),
            Error::Io { .. } => true,
            Error::Config(_) | Error::Ops(_) | Error::Internal(_) => false,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        match self {
            Error::Network(err) => err.user_code(),
            Error::Api(err) => err.user_code(),
            Error::Monitor(err) => err.user_code(),
            Error::Artifact(err) => err.user_code(),
            Error::Config(err) => err.user_code(),
            Error::Ops(err) => err.user_code(),
            Error::Internal(_) => Some("error.internal"),
            Error::Io { .. } => Some("error.io"),
        }
    }
}
