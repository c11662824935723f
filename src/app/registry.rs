//! Provider registry: canonical lowercase name to adapter constructor.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, info, warn};

use crate::config::ConfigSource;
use crate::domain::{OnRampError, OnRampProvider};
use crate::infra::providers::{OnramperProvider, onramper};

/// Builds a fresh, unconfigured adapter
pub type ProviderConstructor = fn() -> Arc<dyn OnRampProvider>;

fn onramper_adapter() -> Arc<dyn OnRampProvider> {
    Arc::new(OnramperProvider::new())
}

/// Adapters shipped with the crate
pub const BUILTIN_PROVIDERS: [(&str, ProviderConstructor); 1] =
    [(onramper::PROVIDER_NAME, onramper_adapter)];

pub(crate) fn canonical_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Read-mostly map of registered providers, safe to share across tasks.
#[derive(Debug, Default)]
pub struct ProviderRegistry {
    constructors: DashMap<String, ProviderConstructor>,
}

impl ProviderRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in adapter
    pub fn builtin() -> Self {
        let registry = Self::new();
        for (name, constructor) in BUILTIN_PROVIDERS {
            registry.constructors.insert(name.to_string(), constructor);
        }
        registry
    }

    /// Registry limited to built-in adapters that `source` configures.
    pub fn from_config_source(source: &ConfigSource) -> Self {
        let builtin = Self::builtin();
        let registry = Self::new();

        for name in source.provider_names() {
            match builtin.constructor(&name) {
                Some(constructor) => {
                    registry.constructors.insert(name, constructor);
                }
                None => warn!(provider = %name, "Configured provider has no adapter, ignoring"),
            }
        }

        info!(providers = ?registry.list_supported(), "Provider registry initialized");
        registry
    }

    /// Add or replace an adapter constructor.
    pub fn register(
        &self,
        name: &str,
        constructor: ProviderConstructor,
    ) -> Result<(), OnRampError> {
        let name = canonical_name(name);
        if name.is_empty() {
            return Err(OnRampError::invalid_argument(
                "provider_name",
                "must not be blank",
            ));
        }

        if self.constructors.insert(name.clone(), constructor).is_some() {
            debug!(provider = %name, "Replaced provider constructor");
        } else {
            debug!(provider = %name, "Registered provider constructor");
        }
        Ok(())
    }

    /// Remove a provider; returns whether it was registered.
    pub fn unregister(&self, name: &str) -> bool {
        self.constructors.remove(&canonical_name(name)).is_some()
    }

    pub fn constructor(&self, name: &str) -> Option<ProviderConstructor> {
        self.constructors
            .get(&canonical_name(name))
            .map(|entry| *entry.value())
    }

    pub fn is_supported(&self, name: &str) -> bool {
        self.constructors.contains_key(&canonical_name(name))
    }

    /// Registered canonical names, sorted
    pub fn list_supported(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .constructors
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;

    #[test]
    fn test_builtin_registry() {
        let registry = ProviderRegistry::builtin();
        assert!(registry.is_supported("onramper"));
        assert!(registry.is_supported("  OnRamper "));
        assert!(!registry.is_supported("moonpay"));
        assert_eq!(registry.list_supported(), vec!["onramper"]);

        let constructor = registry.constructor("ONRAMPER").unwrap();
        assert_eq!(constructor().provider_name(), "onramper");
    }

    #[test]
    fn test_eligible_set_follows_config_source() {
        let source = ConfigSource::from_pairs([
            ("providers.onramper.api-key", "k"),
            ("providers.unknown.api-key", "k"),
        ]);
        let registry = ProviderRegistry::from_config_source(&source);
        assert_eq!(registry.list_supported(), vec!["onramper"]);

        let empty = ProviderRegistry::from_config_source(&ConfigSource::new());
        assert!(empty.is_empty());
        assert!(!empty.is_supported("onramper"));
    }

    #[test]
    fn test_register_and_unregister() {
        let registry = ProviderRegistry::new();
        registry.register("Custom", onramper_adapter).unwrap();
        assert!(registry.is_supported("custom"));
        assert_eq!(registry.len(), 1);

        assert!(registry.unregister("CUSTOM"));
        assert!(!registry.unregister("custom"));
        assert!(registry.is_empty());

        let err = registry.register("   ", onramper_adapter).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidArgument);
    }

    #[test]
    fn test_list_matches_is_supported() {
        let registry = ProviderRegistry::builtin();
        registry.register("beta", onramper_adapter).unwrap();
        registry.register("Alpha", onramper_adapter).unwrap();

        let listed = registry.list_supported();
        assert_eq!(listed, vec!["alpha", "beta", "onramper"]);
        assert!(listed.iter().all(|name| registry.is_supported(name)));
    }
}
