//! Configuration source: `providers.<name>.<option>` keys from TOML, explicit
//! pairs, and the environment.
//!
//! ```toml
//! [providers.onramper]
//! api-key = "pk_test_..."
//! sandbox = true
//! timeout = 30
//!
//! [providers.onramper.additional-config]
//! max-connections = 50
//! ```
//!
//! Every key can be overridden by an environment variable named after the
//! uppercased key with `.` and `-` replaced by `_`, e.g.
//! `PROVIDERS_ONRAMPER_API_KEY`.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::str::FromStr;

use tracing::{debug, info};

use crate::domain::{ConfigError, ProviderConfig};

pub const PROVIDERS_SECTION: &str = "providers";
pub const ADDITIONAL_CONFIG: &str = "additional-config";

const ENV_PREFIX: &str = "PROVIDERS_";
const ENV_API_KEY_SUFFIX: &str = "_API_KEY";

/// Options with a dedicated `ProviderConfig` field
const KNOWN_OPTIONS: [&str; 10] = [
    "api-key",
    "api-secret",
    "base-url",
    "webhook-url",
    "sandbox",
    "timeout",
    "retry-attempts",
    "enabled",
    "priority",
    "description",
];

/// Flat view over every configured provider option.
#[derive(Debug, Clone, Default)]
pub struct ConfigSource {
    values: BTreeMap<String, String>,
    env: BTreeMap<String, String>,
}

impl ConfigSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from explicit dotted keys.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut source = Self::new();
        for (key, value) in pairs {
            source.set(key.as_ref(), value);
        }
        source
    }

    /// Parse a TOML document, flattening nested tables into dotted keys.
    pub fn from_toml_str(document: &str) -> Result<Self, ConfigError> {
        let table: toml::Table =
            toml::from_str(document).map_err(|e| ConfigError::Source(e.to_string()))?;

        let mut source = Self::new();
        for (key, value) in &table {
            source.flatten(key, value);
        }
        debug!(keys = source.values.len(), "Parsed TOML configuration");
        Ok(source)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let document = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Source(format!("{}: {}", path.display(), e)))?;
        let source = Self::from_toml_str(&document)?;
        info!(
            path = %path.display(),
            providers = ?source.provider_names(),
            "Loaded configuration file"
        );
        Ok(source)
    }

    /// Overlay an explicit set of environment variables.
    #[must_use]
    pub fn with_environment<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Overlay the process environment, loading `.env` first when present.
    #[must_use]
    pub fn with_process_env(self) -> Self {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "Loaded .env file");
        }
        self.with_environment(std::env::vars())
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(normalize_key(key), value.into());
    }

    /// Resolve `key`; the environment wins over file values.
    pub fn get(&self, key: &str) -> Option<&str> {
        let key = normalize_key(key);
        self.env
            .get(&env_var_name(&key))
            .or_else(|| self.values.get(&key))
            .map(String::as_str)
    }

    /// Every provider with at least one key in the file or an API key in the environment
    pub fn provider_names(&self) -> BTreeSet<String> {
        let from_values = self
            .values
            .keys()
            .filter_map(|key| split_provider_key(key).map(|(name, _)| name.to_string()));

        let from_env = self.env.keys().filter_map(|var| {
            var.strip_prefix(ENV_PREFIX)
                .and_then(|rest| rest.strip_suffix(ENV_API_KEY_SUFFIX))
                .filter(|name| !name.is_empty())
                .map(str::to_lowercase)
        });

        from_values.chain(from_env).collect()
    }

    pub fn has_provider(&self, name: &str) -> bool {
        self.provider_names()
            .contains(&name.trim().to_lowercase())
    }

    /// Assemble the configuration of one provider, applying defaults.
    pub fn provider_config(&self, name: &str) -> Result<ProviderConfig, ConfigError> {
        let name = name.trim().to_lowercase();
        if !self.has_provider(&name) {
            return Err(ConfigError::MissingProviderSection(name));
        }

        let option = |opt: &str| {
            self.get(&provider_key(&name, opt))
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        let api_key = option("api-key").ok_or_else(|| ConfigError::MissingField {
            provider: name.clone(),
            field: "api-key".to_string(),
        })?;

        let mut builder = ProviderConfig::builder(&name, api_key);
        if let Some(secret) = option("api-secret") {
            builder = builder.api_secret(secret);
        }
        if let Some(url) = option("base-url") {
            builder = builder.base_url(url);
        }
        if let Some(url) = option("webhook-url") {
            builder = builder.webhook_url(url);
        }
        if let Some(description) = option("description") {
            builder = builder.description(description);
        }
        if let Some(v) = option("sandbox") {
            builder = builder.sandbox(parse_bool(&name, "sandbox", v)?);
        }
        if let Some(v) = option("enabled") {
            builder = builder.enabled(parse_bool(&name, "enabled", v)?);
        }
        if let Some(v) = option("timeout") {
            builder = builder.timeout_secs(parse_value(&name, "timeout", v)?);
        }
        if let Some(v) = option("retry-attempts") {
            builder = builder.retry_attempts(parse_value(&name, "retry-attempts", v)?);
        }
        if let Some(v) = option("priority") {
            builder = builder.priority(parse_value(&name, "priority", v)?);
        }

        for (key, value) in self.additional_options(&name) {
            builder = builder.additional(key, value);
        }

        Ok(builder.build())
    }

    /// `additional-config.*` entries plus any option without a dedicated field
    fn additional_options(&self, name: &str) -> BTreeMap<String, String> {
        let mut options: BTreeSet<String> = [
            crate::domain::config::MAX_CONNECTIONS_KEY,
            crate::domain::config::CONNECTION_TIMEOUT_KEY,
        ]
        .iter()
        .map(|k| format!("{}.{}", ADDITIONAL_CONFIG, k))
        .collect();

        options.extend(
            self.values
                .keys()
                .filter_map(|key| split_provider_key(key))
                .filter(|(provider, option)| {
                    *provider == name && !KNOWN_OPTIONS.contains(option)
                })
                .map(|(_, option)| option.to_string()),
        );

        // Environment-only entries, e.g. PROVIDERS_ONRAMPER_ADDITIONAL_CONFIG_PARTNER_ID
        let env_prefix = env_var_name(&provider_key(name, &format!("{}.", ADDITIONAL_CONFIG)));
        options.extend(self.env.keys().filter_map(|var| {
            let suffix = var.strip_prefix(&env_prefix).filter(|s| !s.is_empty())?;
            Some(format!(
                "{}.{}",
                ADDITIONAL_CONFIG,
                suffix.to_lowercase().replace('_', "-")
            ))
        }));

        options
            .into_iter()
            .filter_map(|option| {
                let value = self.get(&provider_key(name, &option))?.to_string();
                let key = option
                    .strip_prefix(ADDITIONAL_CONFIG)
                    .and_then(|rest| rest.strip_prefix('.'))
                    .unwrap_or(&option)
                    .to_string();
                Some((key, value))
            })
            .collect()
    }

    fn flatten(&mut self, key: &str, value: &toml::Value) {
        match value {
            toml::Value::Table(table) => {
                for (child, value) in table {
                    self.flatten(&format!("{}.{}", key, child), value);
                }
            }
            toml::Value::String(s) => self.set(key, s.as_str()),
            toml::Value::Array(items) => {
                let joined = items
                    .iter()
                    .map(|item| match item {
                        toml::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(",");
                self.set(key, joined);
            }
            other => self.set(key, other.to_string()),
        }
    }
}

/// Environment variable that overrides `key`
pub fn env_var_name(key: &str) -> String {
    key.trim()
        .chars()
        .map(|c| match c {
            '.' | '-' => '_',
            c => c.to_ascii_uppercase(),
        })
        .collect()
}

fn provider_key(name: &str, option: &str) -> String {
    format!("{}.{}.{}", PROVIDERS_SECTION, name, option)
}

/// Lowercase the `providers.<name>` prefix; the option part is kept as written.
fn normalize_key(key: &str) -> String {
    let mut parts = key.trim().splitn(3, '.');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(section), Some(name), rest) if section.eq_ignore_ascii_case(PROVIDERS_SECTION) => {
            let mut normalized = format!("{}.{}", PROVIDERS_SECTION, name.to_lowercase());
            if let Some(rest) = rest {
                normalized.push('.');
                normalized.push_str(rest);
            }
            normalized
        }
        _ => key.trim().to_string(),
    }
}

fn split_provider_key(key: &str) -> Option<(&str, &str)> {
    let rest = key
        .strip_prefix(PROVIDERS_SECTION)?
        .strip_prefix('.')?;
    let (name, option) = rest.split_once('.')?;
    if name.is_empty() || option.is_empty() {
        return None;
    }
    Some((name, option))
}

fn parse_bool(provider: &str, field: &str, raw: &str) -> Result<bool, ConfigError> {
    parse_value(provider, field, &raw.to_ascii_lowercase())
}

fn parse_value<T>(provider: &str, field: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        provider: provider.to_string(),
        field: field.to_string(),
        message: format!("`{}`: {}", raw, e),
    })
}
