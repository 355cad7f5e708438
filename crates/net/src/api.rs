//! Authenticated client for the remote build service's REST API

use crate::client::NetClient;
use cmbuild_config::constants::AUTH_HEADER;
use cmbuild_errors::{ApiError, Error, NetworkError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use url::Url;

/// Status and raw body of an API response.
///
/// Callers decide what a status means; this type only carries it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// 2xx
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body as JSON
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::UnexpectedResponse`] if the body does not decode.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        serde_json::from_str(&self.body).map_err(|e| {
            ApiError::UnexpectedResponse {
                message: format!("invalid JSON in HTTP {} response: {e}", self.status),
            }
            .into()
        })
    }

    /// Turn a non-success response into the matching API error
    #[must_use]
    pub fn into_error(self) -> Error {
        ApiError::from_status(self.status, self.body).into()
    }
}

/// REST client carrying the base URL and the caller's token
#[derive(Clone)]
pub struct ApiClient {
    net: NetClient,
    base_url: Url,
    token: String,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("token", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client for `base_url`
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::InvalidUrl`] if the base URL does not parse
    /// or cannot carry a path.
    pub fn new(net: NetClient, base_url: &str, token: impl Into<String>) -> Result<Self, Error> {
        let base_url = crate::parse_url(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(NetworkError::InvalidUrl(base_url.to_string()).into());
        }
        Ok(Self {
            net,
            base_url,
            token: token.into(),
        })
    }

    /// Absolute URL for an API path such as `apps/{id}`
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Authenticated GET, retried on transport failures
    ///
    /// # Errors
    ///
    /// Returns an error only when no response could be obtained.
    pub async fn get(&self, path: &str) -> Result<ApiResponse, Error> {
        let url = self.endpoint(path);
        let response = self
            .net
            .retry_request(|| {
                self.net
                    .inner()
                    .get(&url)
                    .header(AUTH_HEADER, &self.token)
                    .header(reqwest::header::CONTENT_TYPE, "application/json")
                    .send()
            })
            .await?;
        Self::read(response).await
    }

    /// Authenticated JSON POST, sent exactly once
    ///
    /// # Errors
    ///
    /// Returns an error only when no response could be obtained.
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse, Error> {
        let request = self
            .net
            .inner()
            .post(self.endpoint(path))
            .header(AUTH_HEADER, &self.token)
            .json(body);
        let response = self.net.send_once(request).await?;
        Self::read(response).await
    }

    /// Shared plain client, used for artifact URLs outside the API
    #[must_use]
    pub fn net(&self) -> &NetClient {
        &self.net
    }

    async fn read(response: reqwest::Response) -> Result<ApiResponse, Error> {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| NetworkError::RequestFailed(e.to_string()))?;
        Ok(ApiResponse { status, body })
    }
}
