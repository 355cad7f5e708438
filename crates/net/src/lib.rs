#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Network operations for cmbuild
//!
//! This crate handles all HTTP traffic: authenticated JSON calls against
//! the build service and streaming artifact downloads, over a pooled
//! reqwest client with retry logic for idempotent requests.

mod api;
mod client;
mod download;

pub use api::{ApiClient, ApiResponse};
pub use client::{NetClient, NetConfig};
pub use download::download_to_file;

use cmbuild_errors::{Error, NetworkError};
use url::Url;

/// Parse and validate a URL
///
/// # Errors
///
/// Returns an error if the URL string is malformed or invalid according to RFC 3986.
pub fn parse_url(url: &str) -> Result<Url, Error> {
    Url::parse(url).map_err(|e| NetworkError::InvalidUrl(e.to_string()).into())
}
