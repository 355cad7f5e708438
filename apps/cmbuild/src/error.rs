//! CLI error handling

use std::fmt;

use cmbuild_errors::UserFacingError;

/// CLI-specific error type
#[derive(Debug)]
pub enum CliError {
    /// Configuration error
    Config(cmbuild_errors::ConfigError),
    /// Operations error
    Ops(cmbuild_errors::Error),
    /// Invalid command arguments
    InvalidArguments(String),
    /// I/O error
    Io(std::io::Error),
}

impl CliError {
    /// Stable code for JSON output
    pub fn code(&self) -> Option<&'static str> {
        match self {
            CliError::Config(e) => e.user_code(),
            CliError::Ops(e) => e.user_code(),
            CliError::InvalidArguments(_) => Some("cli.invalid_arguments"),
            CliError::Io(_) => Some("cli.io"),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(e) => {
                write!(f, "Configuration error: {}", e.user_message())?;
                if let Some(hint) = e.user_hint() {
                    write!(f, "\n  Hint: {hint}")?;
                }
                Ok(())
            }
            CliError::Ops(e) => {
                let message = e.user_message();
                write!(f, "{message}")?;
                if let Some(code) = e.user_code() {
                    write!(f, "\n  Code: {code}")?;
                }
                if let Some(hint) = e.user_hint() {
                    write!(f, "\n  Hint: {hint}")?;
                }
                if e.is_retryable() {
                    write!(f, "\n  Retry: safe to retry this operation.")?;
                }
                Ok(())
            }
            CliError::InvalidArguments(msg) => write!(f, "Invalid arguments: {msg}"),
            CliError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Ops(e) => Some(e),
            CliError::Io(e) => Some(e),
            CliError::InvalidArguments(_) => None,
        }
    }
}

impl From<cmbuild_errors::ConfigError> for CliError {
    fn from(e: cmbuild_errors::ConfigError) -> Self {
        CliError::Config(e)
    }
}

impl From<cmbuild_errors::Error> for CliError {
    fn from(e: cmbuild_errors::Error) -> Self {
        match e {
            cmbuild_errors::Error::Config(e) => CliError::Config(e),
            other => CliError::Ops(other),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}
