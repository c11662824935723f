//! Shared adapter plumbing: configuration lifecycle, base URL selection,
//! default headers, and the retrying request executor.

use std::future::Future;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use tracing::{debug, info};

use crate::domain::{ConfigError, OnRampError, ProviderConfig, ProviderError};
use crate::infra::http::{HttpTransport, TransportConfig, TransportError};
use crate::infra::retry::RetryPolicy;

/// Fixed endpoints of one provider
#[derive(Debug, Clone, Copy)]
pub struct ProviderEndpoints {
    pub production_url: &'static str,
    pub sandbox_url: &'static str,
    pub health_path: &'static str,
}

impl ProviderEndpoints {
    /// `config.base_url` wins; otherwise pick by the sandbox flag
    pub fn select_base_url(&self, config: &ProviderConfig) -> String {
        match config.base_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => url.to_string(),
            _ if config.sandbox => self.sandbox_url.to_string(),
            _ => self.production_url.to_string(),
        }
    }
}

/// Everything an adapter needs after `configure`, swapped as one unit
#[derive(Debug)]
pub struct ConfiguredClient {
    pub config: ProviderConfig,
    pub transport: HttpTransport,
    pub retry: RetryPolicy,
}

impl ConfiguredClient {
    /// Run one request with retry, translating transport errors.
    pub async fn execute<T, F, Fut>(
        &self,
        provider: &'static str,
        operation: &str,
        mut request: F,
    ) -> Result<T, OnRampError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, TransportError>>,
    {
        self.retry
            .run(provider, operation, || {
                let attempt = request();
                async move {
                    attempt
                        .await
                        .map_err(|e| OnRampError::provider(provider, ProviderError::from(e)))
                }
            })
            .await
    }
}

/// Configuration slot shared by every adapter.
///
/// Readers take a snapshot `Arc`; `configure` publishes a new one atomically.
#[derive(Debug)]
pub struct ProviderCore {
    provider_name: &'static str,
    endpoints: ProviderEndpoints,
    client: ArcSwapOption<ConfiguredClient>,
}

impl ProviderCore {
    pub fn new(provider_name: &'static str, endpoints: ProviderEndpoints) -> Self {
        Self {
            provider_name,
            endpoints,
            client: ArcSwapOption::empty(),
        }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider_name
    }

    pub fn endpoints(&self) -> &ProviderEndpoints {
        &self.endpoints
    }

    /// Validate `config`, build a transport for it, and publish both.
    pub fn configure(&self, config: ProviderConfig) -> Result<(), OnRampError> {
        config.validate()?;

        let base_url = self.endpoints.select_base_url(&config);
        let headers = default_headers(self.provider_name, &config)?;
        let transport_config = TransportConfig {
            timeout: config.timeout(),
            connect_timeout: config.connection_timeout(),
            max_idle_per_host: config.max_connections(),
        };
        let transport = HttpTransport::new(&base_url, headers, &transport_config).map_err(|e| {
            OnRampError::Configuration(ConfigError::InvalidValue {
                provider: self.provider_name.to_string(),
                field: "transport".to_string(),
                message: e.to_string(),
            })
        })?;
        let retry = RetryPolicy::new(config.retry_attempts, config.timeout());

        info!(
            provider = %self.provider_name,
            base_url = %base_url,
            sandbox = config.sandbox,
            retry_attempts = config.retry_attempts,
            "Provider configured"
        );

        self.client.store(Some(Arc::new(ConfiguredClient {
            config,
            transport,
            retry,
        })));
        Ok(())
    }

    /// Current configuration snapshot, or `INVALID_CONFIGURATION`
    pub fn client(&self) -> Result<Arc<ConfiguredClient>, OnRampError> {
        self.client
            .load_full()
            .ok_or_else(|| OnRampError::not_configured(self.provider_name))
    }

    pub fn is_configured(&self) -> bool {
        self.client.load().is_some()
    }

    pub fn validate_configuration(&self) -> bool {
        match self.client.load_full() {
            Some(client) => client.config.validate().is_ok(),
            None => false,
        }
    }

    pub async fn is_service_available(&self) -> bool {
        let Some(client) = self.client.load_full() else {
            debug!(provider = %self.provider_name, "Availability probe on unconfigured provider");
            return false;
        };
        client
            .transport
            .health_check(self.endpoints.health_path)
            .await
    }
}

/// `Authorization: <api key>` and `Accept: application/json`
pub fn default_headers(
    provider: &str,
    config: &ProviderConfig,
) -> Result<HeaderMap, OnRampError> {
    let mut headers = HeaderMap::new();
    let mut auth = header_value(provider, "api_key", config.api_key.expose_secret())?;
    auth.set_sensitive(true);
    headers.insert(AUTHORIZATION, auth);
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    Ok(headers)
}

/// Build a header value from configuration, reporting bad bytes as config errors.
pub fn header_value(provider: &str, field: &str, value: &str) -> Result<HeaderValue, OnRampError> {
    HeaderValue::from_str(value).map_err(|_| {
        OnRampError::Configuration(ConfigError::InvalidValue {
            provider: provider.to_string(),
            field: field.to_string(),
            message: "contains characters not allowed in an HTTP header".to_string(),
        })
    })
}
