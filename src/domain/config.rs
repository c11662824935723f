//! Per-provider configuration model.

use std::collections::BTreeMap;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use super::error::{ConfigError, OnRampError};

pub const DEFAULT_SANDBOX: bool = true;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
pub const DEFAULT_PRIORITY: i32 = 1;
pub const DEFAULT_ENABLED: bool = true;
pub const DEFAULT_MAX_CONNECTIONS: usize = 100;
pub const DEFAULT_CONNECTION_TIMEOUT_MS: u64 = 30_000;

/// Well-known keys inside `additional_config`
pub const MAX_CONNECTIONS_KEY: &str = "max-connections";
pub const CONNECTION_TIMEOUT_KEY: &str = "connection-timeout";

/// Settings that bind an adapter to one provider account.
///
/// Credentials are kept as [`SecretString`] so `Debug` output never leaks them.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Canonical lowercase provider name
    pub provider_name: String,
    pub api_key: SecretString,
    pub api_secret: Option<SecretString>,
    /// Overrides the adapter's production/sandbox URL when set
    pub base_url: Option<String>,
    pub webhook_url: Option<String>,
    pub sandbox: bool,
    /// Overall deadline per operation, in seconds
    pub timeout_secs: u64,
    pub retry_attempts: u32,
    pub enabled: bool,
    pub priority: i32,
    pub description: Option<String>,
    pub additional_config: BTreeMap<String, String>,
}

impl ProviderConfig {
    /// Start a builder with every optional field at its default.
    pub fn builder(
        provider_name: impl Into<String>,
        api_key: impl Into<String>,
    ) -> ProviderConfigBuilder {
        ProviderConfigBuilder::new(provider_name, api_key)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Secret as a plain string; empty secrets count as absent.
    pub fn api_secret(&self) -> Option<&str> {
        self.api_secret
            .as_ref()
            .map(|s| s.expose_secret())
            .filter(|s| !s.trim().is_empty())
    }

    pub fn max_connections(&self) -> usize {
        self.additional_config
            .get(MAX_CONNECTIONS_KEY)
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MAX_CONNECTIONS)
    }

    pub fn connection_timeout(&self) -> Duration {
        let millis = self
            .additional_config
            .get(CONNECTION_TIMEOUT_KEY)
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_CONNECTION_TIMEOUT_MS);
        Duration::from_millis(millis)
    }

    /// Check the invariants every adapter relies on.
    pub fn validate(&self) -> Result<(), OnRampError> {
        let provider = self.provider_name.trim();
        if provider.is_empty() {
            return Err(ConfigError::MissingField {
                provider: "<unnamed>".to_string(),
                field: "provider_name".to_string(),
            }
            .into());
        }

        if self.api_key.expose_secret().trim().is_empty() {
            return Err(ConfigError::MissingField {
                provider: provider.to_string(),
                field: "api_key".to_string(),
            }
            .into());
        }

        if let Some(url) = &self.base_url {
            if url.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    provider: provider.to_string(),
                    field: "base_url".to_string(),
                    message: "must not be blank when set".to_string(),
                }
                .into());
            }
        }

        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                provider: provider.to_string(),
                field: "timeout".to_string(),
                message: "must be greater than 0".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

/// Builder for [`ProviderConfig`]
#[derive(Debug, Clone)]
pub struct ProviderConfigBuilder {
    config: ProviderConfig,
}

impl ProviderConfigBuilder {
    fn new(provider_name: impl Into<String>, api_key: impl Into<String>) -> Self {
        let mut additional_config = BTreeMap::new();
        additional_config.insert(
            MAX_CONNECTIONS_KEY.to_string(),
            DEFAULT_MAX_CONNECTIONS.to_string(),
        );
        additional_config.insert(
            CONNECTION_TIMEOUT_KEY.to_string(),
            DEFAULT_CONNECTION_TIMEOUT_MS.to_string(),
        );

        Self {
            config: ProviderConfig {
                provider_name: provider_name.into().trim().to_lowercase(),
                api_key: SecretString::from(api_key.into()),
                api_secret: None,
                base_url: None,
                webhook_url: None,
                sandbox: DEFAULT_SANDBOX,
                timeout_secs: DEFAULT_TIMEOUT_SECS,
                retry_attempts: DEFAULT_RETRY_ATTEMPTS,
                enabled: DEFAULT_ENABLED,
                priority: DEFAULT_PRIORITY,
                description: None,
                additional_config,
            },
        }
    }

    #[must_use]
    pub fn api_secret(mut self, secret: impl Into<String>) -> Self {
        self.config.api_secret = Some(SecretString::from(secret.into()));
        self
    }

    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn webhook_url(mut self, url: impl Into<String>) -> Self {
        self.config.webhook_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn sandbox(mut self, sandbox: bool) -> Self {
        self.config.sandbox = sandbox;
        self
    }

    #[must_use]
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn retry_attempts(mut self, attempts: u32) -> Self {
        self.config.retry_attempts = attempts;
        self
    }

    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.config.enabled = enabled;
        self
    }

    #[must_use]
    pub fn priority(mut self, priority: i32) -> Self {
        self.config.priority = priority;
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.config.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn additional(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config
            .additional_config
            .insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn build(self) -> ProviderConfig {
        self.config
    }
}
