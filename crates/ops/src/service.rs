//! Seam between the operations and the remote build service

use cmbuild_config::Config;
use cmbuild_errors::Error;
use cmbuild_net::{download_to_file, ApiClient, ApiResponse, NetClient, NetConfig};
use cmbuild_types::BuildRequest;
use std::path::Path;

/// One method per remote interaction.
///
/// API methods hand back the raw status and body; interpreting them is the
/// operations' job. `Err` means no response was obtained at all.
#[allow(async_fn_in_trait)]
pub trait BuildService {
    /// `GET /apps`
    async fn list_applications(&self) -> Result<ApiResponse, Error>;

    /// `GET /apps/{id}`
    async fn get_application(&self, app_id: &str) -> Result<ApiResponse, Error>;

    /// `POST /builds`
    async fn create_build(&self, request: &BuildRequest) -> Result<ApiResponse, Error>;

    /// `GET /builds/{id}`
    async fn get_build(&self, build_id: &str) -> Result<ApiResponse, Error>;

    /// Stream an artifact URL into `dest`, returning the bytes written
    async fn download_artifact(&self, url: &str, dest: &Path) -> Result<u64, Error>;
}

/// [`BuildService`] over HTTP
#[derive(Debug, Clone)]
pub struct RemoteService {
    api: ApiClient,
}

impl RemoteService {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Build the HTTP stack from configuration and the caller's token
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created or the
    /// configured base URL is invalid.
    pub fn from_config(config: &Config, token: &str) -> Result<Self, Error> {
        let net = NetClient::new(NetConfig::from(&config.network))?;
        let api = ApiClient::new(net, &config.api.base_url, token)?;
        Ok(Self::new(api))
    }
}

impl BuildService for RemoteService {
    async fn list_applications(&self) -> Result<ApiResponse, Error> {
        self.api.get("apps").await
    }

    async fn get_application(&self, app_id: &str) -> Result<ApiResponse, Error> {
        self.api.get(&format!("apps/{app_id}")).await
    }

    async fn create_build(&self, request: &BuildRequest) -> Result<ApiResponse, Error> {
        self.api.post_json("builds", request).await
    }

    async fn get_build(&self, build_id: &str) -> Result<ApiResponse, Error> {
        self.api.get(&format!("builds/{build_id}")).await
    }

    async fn download_artifact(&self, url: &str, dest: &Path) -> Result<u64, Error> {
        download_to_file(self.api.net(), url, dest).await
    }
}
