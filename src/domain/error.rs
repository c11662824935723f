//! Error types shared by every layer of the client.

use serde::Serialize;
use thiserror::Error;

/// Stable error codes exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidArgument,
    InvalidConfiguration,
    ProviderNotSupported,
    Unsupported,
    Timeout,
    NetworkError,
    ApiError,
    InvalidResponse,
    NotFound,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::InvalidConfiguration => "INVALID_CONFIGURATION",
            Self::ProviderNotSupported => "PROVIDER_NOT_SUPPORTED",
            Self::Unsupported => "UNSUPPORTED",
            Self::Timeout => "TIMEOUT",
            Self::NetworkError => "NETWORK_ERROR",
            Self::ApiError => "API_ERROR",
            Self::InvalidResponse => "INVALID_RESPONSE",
            Self::NotFound => "NOT_FOUND",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Top-level error returned by every public operation.
#[derive(Debug, Error)]
pub enum OnRampError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Provider not supported: {0}")]
    ProviderNotSupported(String),

    #[error("{provider} does not support {operation}")]
    NotSupported {
        provider: String,
        operation: String,
    },

    #[error("{provider}: {source}")]
    Provider {
        provider: String,
        #[source]
        source: ProviderError,
    },
}

impl OnRampError {
    /// Shorthand for a single-field validation failure.
    pub fn invalid_argument(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(ValidationError::InvalidField {
            field: field.into(),
            message: message.into(),
        })
    }

    pub fn provider(provider: impl Into<String>, source: ProviderError) -> Self {
        Self::Provider {
            provider: provider.into(),
            source,
        }
    }

    pub fn not_supported(provider: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::NotSupported {
            provider: provider.into(),
            operation: operation.into(),
        }
    }

    pub fn not_configured(provider: impl Into<String>) -> Self {
        Self::Configuration(ConfigError::NotConfigured {
            provider: provider.into(),
        })
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation(_) => ErrorCode::InvalidArgument,
            Self::Configuration(_) => ErrorCode::InvalidConfiguration,
            Self::ProviderNotSupported(_) => ErrorCode::ProviderNotSupported,
            Self::NotSupported { .. } => ErrorCode::Unsupported,
            Self::Provider { source, .. } => source.code(),
        }
    }

    /// Name of the provider the error originated from, when known.
    pub fn provider_name(&self) -> Option<&str> {
        match self {
            Self::NotSupported { provider, .. } | Self::Provider { provider, .. } => {
                Some(provider.as_str())
            }
            Self::Configuration(err) => err.provider(),
            Self::ProviderNotSupported(name) => Some(name.as_str()),
            Self::Validation(_) => None,
        }
    }

    /// Whether the adapter retry loop may attempt the call again.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Provider { source, .. } => source.is_retryable(),
            _ => false,
        }
    }
}

/// Caller input that failed validation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field}: {message}")]
    InvalidField { field: String, message: String },

    #[error("{0}")]
    Invalid(String),
}

impl From<validator::ValidationErrors> for ValidationError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<(String, String)> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string());
                    (field.to_string(), message)
                })
            })
            .collect();
        fields.sort();

        match fields.len() {
            0 => Self::Invalid(errors.to_string()),
            1 => {
                let (field, message) = fields.remove(0);
                Self::InvalidField { field, message }
            }
            _ => Self::Invalid(
                fields
                    .into_iter()
                    .map(|(field, message)| format!("{field}: {message}"))
                    .collect::<Vec<_>>()
                    .join("; "),
            ),
        }
    }
}

impl From<validator::ValidationErrors> for OnRampError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.into())
    }
}

/// Problems with provider configuration or the configuration source.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{provider} has not been configured")]
    NotConfigured { provider: String },

    #[error("{provider}: missing required field `{field}`")]
    MissingField { provider: String, field: String },

    #[error("{provider}: invalid value for `{field}`: {message}")]
    InvalidValue {
        provider: String,
        field: String,
        message: String,
    },

    #[error("no configuration section for provider `{0}`")]
    MissingProviderSection(String),

    #[error("{provider} is disabled in configuration")]
    Disabled { provider: String },

    #[error("configuration source error: {0}")]
    Source(String),
}

impl ConfigError {
    pub fn provider(&self) -> Option<&str> {
        match self {
            Self::NotConfigured { provider }
            | Self::MissingField { provider, .. }
            | Self::InvalidValue { provider, .. }
            | Self::Disabled { provider } => Some(provider.as_str()),
            Self::MissingProviderSection(name) => Some(name.as_str()),
            Self::Source(_) => None,
        }
    }
}

/// Failures while talking to a provider, already translated from transport terms.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("API error (HTTP {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("not found: {0}")]
    NotFound(String),
}

impl ProviderError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Timeout(_) => ErrorCode::Timeout,
            Self::Network(_) => ErrorCode::NetworkError,
            Self::ApiError { .. } => ErrorCode::ApiError,
            Self::InvalidResponse(_) => ErrorCode::InvalidResponse,
            Self::NotFound(_) => ErrorCode::NotFound,
        }
    }

    /// 408, 429 and 5xx are transient; every other 4xx is the caller's problem.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::Network(_) => true,
            Self::ApiError { status_code, .. } => {
                matches!(status_code, 408 | 429) || (500..600).contains(status_code)
            }
            Self::InvalidResponse(_) | Self::NotFound(_) => false,
        }
    }
}
