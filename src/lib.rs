//! Provider-agnostic fiat-to-crypto on-ramp client.
//!
//! Callers obtain an [`OnRampProvider`] from the [`ProviderFactory`] and work
//! with the normalized model in [`domain`], whatever provider sits behind it.
//!
//! ```no_run
//! use onramp_client::{AmountSpec, OnRampProvider, ProviderConfig, ProviderFactory, QuoteRequest};
//! use rust_decimal::Decimal;
//!
//! # async fn run() -> Result<(), onramp_client::OnRampError> {
//! let factory = ProviderFactory::builtin();
//! let config = ProviderConfig::builder("onramper", "pk_test").build();
//! let provider = factory.create("onramper", config)?;
//!
//! let quote = provider
//!     .get_quote(&QuoteRequest::new("USD", "BTC", AmountSpec::InFiat(Decimal::from(100))))
//!     .await?;
//! println!("{} BTC for {} USD", quote.crypto_amount, quote.total_fiat_amount);
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod config;
pub mod domain;
pub mod infra;
pub mod telemetry;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use app::{ProviderFactory, ProviderRegistry};
pub use config::ConfigSource;
pub use domain::{
    AmountSpec, Asset, ConfigError, ErrorCode, OnRampError, OnRampProvider, Order, OrderRequest,
    OrderStatus, PaymentMethod, ProviderConfig, ProviderError, Quote, QuoteRequest, Transaction,
    TransactionStatus, ValidateExt, ValidationError,
};
pub use infra::OnramperProvider;
