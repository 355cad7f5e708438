//! HTTP client with connection pooling and retry logic

use cmbuild_config::NetworkConfig;
use cmbuild_errors::{Error, NetworkError};
use reqwest::{Client, Response};
use std::time::Duration;

/// Network client configuration
#[derive(Debug, Clone)]
pub struct NetConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub pool_idle_timeout: Duration,
    pub pool_max_idle_per_host: usize,
    pub retry_count: u32,
    pub retry_delay: Duration,
    pub user_agent: String,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(300), // 5 minutes for large artifacts
            connect_timeout: Duration::from_secs(30),
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 4,
            retry_count: 2,
            retry_delay: Duration::from_secs(1),
            user_agent: format!("cmbuild/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl NetConfig {
    /// Delay before retry number `attempt`; grows linearly and saturates
    #[must_use]
    pub fn retry_backoff(&self, attempt: u32) -> Duration {
        self.retry_delay.saturating_mul(attempt)
    }
}

impl From<&NetworkConfig> for NetConfig {
    fn from(config: &NetworkConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.timeout),
            connect_timeout: Duration::from_secs(config.connect_timeout),
            retry_count: config.retries,
            retry_delay: Duration::from_secs(config.retry_delay),
            ..Self::default()
        }
    }
}

/// HTTP client wrapper with retry logic
#[derive(Clone)]
pub struct NetClient {
    client: Client,
    config: NetConfig,
}

impl NetClient {
    /// Create a new network client
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying reqwest client fails to initialize.
    pub fn new(config: NetConfig) -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| NetworkError::ClientInit(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Create with default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created with default settings.
    pub fn with_defaults() -> Result<Self, Error> {
        Self::new(NetConfig::default())
    }

    /// Execute a plain GET request with retries
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails after all retry attempts.
    /// Non-success statuses are returned as responses, not errors.
    pub async fn get(&self, url: &str) -> Result<Response, Error> {
        self.retry_request(|| self.client.get(url).send()).await
    }

    /// Execute an idempotent request with retries on transport failures
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails after all retry attempts.
    pub async fn retry_request<F, Fut>(&self, mut f: F) -> Result<Response, Error>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<Response, reqwest::Error>>,
    {
        let mut last_error = None;

        for attempt in 0..=self.config.retry_count {
            if attempt > 0 {
                tokio::time::sleep(self.config.retry_backoff(attempt)).await;
            }

            match f().await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    let retry = Self::should_retry(&e);
                    last_error = Some(e);
                    if !retry {
                        break;
                    }
                }
            }
        }

        Err(match last_error {
            Some(e) => Self::convert_error(&e),
            None => NetworkError::RequestFailed("Unknown error".to_string()).into(),
        })
    }

    /// Execute a request exactly once
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be sent or no response arrives.
    pub async fn send_once(&self, request: reqwest::RequestBuilder) -> Result<Response, Error> {
        request.send().await.map_err(|e| Self::convert_error(&e))
    }

    /// Map a reqwest failure onto the network error taxonomy
    pub(crate) fn convert_error(e: &reqwest::Error) -> Error {
        if e.is_timeout() {
            NetworkError::Timeout {
                url: e
                    .url()
                    .map(std::string::ToString::to_string)
                    .unwrap_or_default(),
            }
            .into()
        } else if e.is_connect() {
            NetworkError::ConnectionRefused(e.to_string()).into()
        } else {
            NetworkError::RequestFailed(e.to_string()).into()
        }
    }

    /// Determine if an error should be retried
    fn should_retry(error: &reqwest::Error) -> bool {
        error.is_timeout() || error.is_connect() || error.is_request()
    }

    /// Get the underlying reqwest client for advanced usage
    #[must_use]
    pub fn inner(&self) -> &Client {
        &self.client
    }
}
