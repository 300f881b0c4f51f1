//! Resource API client

use std::time::Duration;

use async_trait::async_trait;
use levelset_domain::{ClientConfig, ResourceList};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::Method;
use tracing::{debug, instrument};
use url::Url;

use super::credentials::Credentials;
use super::errors::ClientError;
use super::http::HttpClient;

/// Source of full resource listings
#[async_trait]
pub trait ListSource: Send + Sync {
    /// List every object in `namespace`; an empty namespace lists all of them
    async fn list(&self, namespace: &str) -> Result<ResourceList, ClientError>;
}

/// HTTP client for a Kubernetes-style REST API
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: HttpClient,
    credentials: Credentials,
}

impl ApiClient {
    /// Build a client from configuration
    ///
    /// # Errors
    /// Returns `ClientError` if the credentials cannot be resolved or the
    /// HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let credentials = Credentials::from_config(config)?;
        Self::with_credentials(credentials, config.request_timeout())
    }

    /// # Errors
    /// Returns `ClientError::Config` if the HTTP client cannot be built.
    pub fn with_credentials(
        credentials: Credentials,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let http = HttpClient::builder().timeout(timeout).build()?;
        Ok(Self { http, credentials })
    }

    pub fn server_url(&self) -> &Url {
        self.credentials.server_url()
    }

    /// `/api/v1/namespaces/{ns}/pods`, or `/api/v1/pods` for all namespaces
    fn pods_url(&self, namespace: &str) -> Result<Url, ClientError> {
        let mut url = self.credentials.server_url().clone();
        {
            let mut segments = url.path_segments_mut().map_err(|()| {
                ClientError::Config(format!("server URL cannot be a base: {}", self.server_url()))
            })?;
            segments.pop_if_empty().extend(["api", "v1"]);
            if !namespace.is_empty() {
                segments.extend(["namespaces", namespace]);
            }
            segments.push("pods");
        }
        Ok(url)
    }

    /// List pods in `namespace`
    ///
    /// # Errors
    /// Returns `ClientError` for transport failures, non-success statuses
    /// and undecodable bodies.
    #[instrument(level = "debug", skip(self))]
    pub async fn list_pods(&self, namespace: &str) -> Result<ResourceList, ClientError> {
        let url = self.pods_url(namespace)?;

        let mut request =
            self.http.request(Method::GET, url.clone()).header(ACCEPT, "application/json");
        if let Some(token) = self.credentials.token() {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        let response = self.http.send(request).await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::from_status(status, url.as_str(), &body));
        }

        let list: ResourceList = response
            .json()
            .await
            .map_err(|e| ClientError::Decode(format!("failed to parse pod list: {e}")))?;
        debug!(
            count = list.items.len(),
            resource_version = %list.metadata.resource_version,
            "Listed pods"
        );
        Ok(list)
    }
}

#[async_trait]
impl ListSource for ApiClient {
    async fn list(&self, namespace: &str) -> Result<ResourceList, ClientError> {
        self.list_pods(namespace).await
    }
}
