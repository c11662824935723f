//! Factory handing out configured adapters, one provider per call.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::config::ConfigSource;
use crate::domain::{ConfigError, OnRampError, OnRampProvider, ProviderConfig};

use super::registry::{ProviderRegistry, canonical_name};

/// Creates adapters from the registry and configures them.
///
/// The factory never routes between providers; every call returns an adapter
/// bound to the provider that was asked for.
#[derive(Debug, Clone)]
pub struct ProviderFactory {
    registry: Arc<ProviderRegistry>,
    source: Arc<ConfigSource>,
}

impl Default for ProviderFactory {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ProviderFactory {
    #[must_use]
    pub fn new(registry: Arc<ProviderRegistry>, source: ConfigSource) -> Self {
        Self {
            registry,
            source: Arc::new(source),
        }
    }

    /// All built-in adapters, no configuration source
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(Arc::new(ProviderRegistry::builtin()), ConfigSource::new())
    }

    /// Adapters limited to the providers `source` configures
    #[must_use]
    pub fn from_config_source(source: ConfigSource) -> Self {
        let registry = ProviderRegistry::from_config_source(&source);
        Self::new(Arc::new(registry), source)
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn config_source(&self) -> &ConfigSource {
        &self.source
    }

    /// Instantiate `name` and configure it with `config`.
    #[instrument(skip(self, config))]
    pub fn create(
        &self,
        name: &str,
        config: ProviderConfig,
    ) -> Result<Arc<dyn OnRampProvider>, OnRampError> {
        let canonical = require_name(name)?;
        let constructor = self
            .registry
            .constructor(&canonical)
            .ok_or_else(|| OnRampError::ProviderNotSupported(canonical.clone()))?;

        if canonical_name(&config.provider_name) != canonical {
            return Err(ConfigError::InvalidValue {
                provider: canonical,
                field: "provider_name".to_string(),
                message: format!("config belongs to `{}`", config.provider_name),
            }
            .into());
        }
        if !config.enabled {
            warn!(provider = %canonical, "Refusing to create disabled provider");
            return Err(ConfigError::Disabled {
                provider: canonical,
            }
            .into());
        }

        let provider = constructor();
        provider.configure(config)?;
        info!(provider = %canonical, "Provider created");
        Ok(provider)
    }

    /// Instantiate `name` using its section of the configuration source.
    pub fn create_from_config_source(
        &self,
        name: &str,
    ) -> Result<Arc<dyn OnRampProvider>, OnRampError> {
        let canonical = require_name(name)?;
        let config = self.source.provider_config(&canonical)?;
        self.create(&canonical, config)
    }

    /// Same as [`create_from_config_source`](Self::create_from_config_source)
    pub fn create_with_defaults(&self, name: &str) -> Result<Arc<dyn OnRampProvider>, OnRampError> {
        self.create_from_config_source(name)
    }

    pub fn is_supported(&self, name: &str) -> bool {
        self.registry.is_supported(name)
    }

    pub fn list_supported(&self) -> Vec<String> {
        self.registry.list_supported()
    }
}

fn require_name(name: &str) -> Result<String, OnRampError> {
    let canonical = canonical_name(name);
    if canonical.is_empty() {
        return Err(OnRampError::invalid_argument(
            "provider_name",
            "must not be blank",
        ));
    }
    Ok(canonical)
}
