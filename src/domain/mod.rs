//! Domain layer containing the normalized model, provider contract, and error definitions.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::{ProviderConfig, ProviderConfigBuilder};
pub use error::{ConfigError, ErrorCode, OnRampError, ProviderError, ValidationError};
pub use traits::OnRampProvider;
pub use types::{
    AmountSpec, Asset, Order, OrderRequest, OrderStatus, PaymentMethod, Quote, QuoteRequest,
    Transaction, TransactionStatus, ValidateExt,
};
