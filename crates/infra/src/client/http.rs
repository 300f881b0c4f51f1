use std::time::Duration;

use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response};
use tracing::debug;

use super::errors::ClientError;

/// Shift cap for the retry backoff multiplier
const MAX_BACKOFF_SHIFT: u32 = 8;

/// Thin reqwest wrapper that retries transport failures and 5xx responses
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    max_attempts: usize,
    base_backoff: Duration,
}

impl HttpClient {
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    pub fn request<U: reqwest::IntoUrl>(&self, method: Method, url: U) -> RequestBuilder {
        self.client.request(method, url)
    }

    /// Send `builder`, retrying up to the configured number of attempts
    ///
    /// A 5xx response on the last attempt is returned as a response, not an
    /// error; status mapping is left to the caller.
    ///
    /// # Errors
    /// Returns `ClientError` for transport failures after the last attempt,
    /// or if the request cannot be cloned for a retry.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, ClientError> {
        let attempts = self.max_attempts.max(1);

        for attempt in 1..=attempts {
            let request = builder
                .try_clone()
                .ok_or_else(|| ClientError::Config("request body cannot be retried".into()))?
                .build()?;
            let method = request.method().clone();
            let url = request.url().clone();
            let last = attempt == attempts;

            debug!(attempt, %method, %url, "Sending HTTP request");
            match self.client.execute(request).await {
                Ok(response) if response.status().is_server_error() && !last => {
                    let status = response.status();
                    debug!(attempt, %url, %status, "Retrying after server error");
                }
                Ok(response) => return Ok(response),
                Err(err) if !last && is_transient(&err) => {
                    debug!(attempt, %url, error = %err, "Retrying after transport error");
                }
                Err(err) => return Err(err.into()),
            }

            let delay = self.backoff_delay(attempt);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        Err(ClientError::Network("HTTP retries exhausted without a response".into()))
    }

    fn backoff_delay(&self, attempt: usize) -> Duration {
        let shift = u32::try_from(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        self.base_backoff.saturating_mul(1 << shift.min(MAX_BACKOFF_SHIFT))
    }
}

fn is_transient(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}

/// Builder for [`HttpClient`]
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    max_attempts: usize,
    base_backoff: Duration,
    user_agent: String,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_attempts: 3,
            base_backoff: Duration::from_millis(200),
            user_agent: concat!("levelset/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl HttpClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Total attempts, including the first
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn base_backoff(mut self, backoff: Duration) -> Self {
        self.base_backoff = backoff;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    /// # Errors
    /// Returns `ClientError::Config` if the TLS backend cannot be initialised.
    pub fn build(self) -> Result<HttpClient, ClientError> {
        let client = ReqwestClient::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent)
            .no_proxy()
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(HttpClient { client, max_attempts: self.max_attempts, base_backoff: self.base_backoff })
    }
}
