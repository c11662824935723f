//! Thin async HTTP transport bound to one base URL and a fixed header set.
//!
//! The transport never retries and knows nothing about providers; adapters
//! translate [`TransportError`] into the provider error taxonomy.

use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, error};

use crate::domain::ProviderError;

/// Failure at the HTTP layer
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Network(#[source] reqwest::Error),

    #[error("request timed out: {0}")]
    Timeout(#[source] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode response body: {0}")]
    Decode(String),

    #[error("failed to build HTTP client: {0}")]
    Build(String),
}

impl TransportError {
    fn from_send(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e)
        } else {
            Self::Network(e)
        }
    }

    /// HTTP status carried by the error, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<TransportError> for ProviderError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout(e) => ProviderError::Timeout(e.to_string()),
            TransportError::Network(e) => ProviderError::Network(e.to_string()),
            TransportError::Build(msg) => ProviderError::Network(msg),
            TransportError::Status { status, body } => ProviderError::ApiError {
                status_code: status,
                message: body,
            },
            TransportError::Decode(msg) => ProviderError::InvalidResponse(msg),
        }
    }
}

/// Connection settings for a [`HttpTransport`]
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Per-request timeout
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub max_idle_per_host: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(30),
            max_idle_per_host: 100,
        }
    }
}

/// HTTP client bound to a base URL and default headers
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http_client: Client,
    base_url: String,
}

impl HttpTransport {
    /// Create a transport; `default_headers` go on every request.
    pub fn new(
        base_url: &str,
        default_headers: HeaderMap,
        config: &TransportConfig,
    ) -> Result<Self, TransportError> {
        let http_client = Client::builder()
            .default_headers(default_headers)
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(config.max_idle_per_host)
            .build()
            .map_err(|e| TransportError::Build(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET `base_url + path`. Per-call headers win over the defaults.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        extra_headers: Option<HeaderMap>,
    ) -> Result<T, TransportError> {
        let url = self.url(path);
        debug!(url = %url, params = query.len(), "GET");

        let mut request = self.http_client.get(&url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(headers) = extra_headers {
            request = request.headers(headers);
        }

        Self::send(request, &url).await
    }

    /// POST `body` as JSON to `base_url + path`
    pub async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, TransportError>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let url = self.url(path);
        debug!(url = %url, "POST");

        let request = self.http_client.post(&url).json(body);
        Self::send(request, &url).await
    }

    /// `true` iff `GET path` answers 2xx
    pub async fn health_check(&self, path: &str) -> bool {
        let url = self.url(path);
        match self.http_client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(url = %url, error = %e, "Health check failed");
                false
            }
        }
    }

    async fn send<T: DeserializeOwned>(
        request: RequestBuilder,
        url: &str,
    ) -> Result<T, TransportError> {
        let response = request.send().await.map_err(|e| {
            error!(url = %url, error = %e, "HTTP request failed");
            TransportError::from_send(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!(url = %url, status = %status, body = %body, "Provider returned error status");
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await.map_err(TransportError::from_send)?;
        serde_json::from_slice(&bytes).map_err(|e| {
            error!(url = %url, error = %e, "Failed to decode response body");
            TransportError::Decode(e.to_string())
        })
    }
}
