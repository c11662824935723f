//! Domain traits defining the contract every on-ramp provider implements.

use async_trait::async_trait;

use super::config::ProviderConfig;
use super::error::OnRampError;
use super::types::{Asset, Order, OrderRequest, PaymentMethod, Quote, QuoteRequest, Transaction};

/// Uniform operation surface over one external on-ramp provider.
///
/// An adapter is created unconfigured; until [`configure`](Self::configure)
/// succeeds every I/O operation fails with `INVALID_CONFIGURATION`.
/// Input validation runs before any I/O, so invalid arguments fail on the
/// first poll of the returned future.
#[async_trait]
pub trait OnRampProvider: Send + Sync + std::fmt::Debug {
    /// Canonical lowercase provider name
    fn provider_name(&self) -> &'static str;

    /// Bind credentials and endpoints. Replaces any previous configuration
    /// atomically; calls already in flight finish with the old one.
    fn configure(&self, config: ProviderConfig) -> Result<(), OnRampError>;

    /// `true` when configured with usable credentials. Never fails.
    async fn validate_configuration(&self) -> bool;

    /// Probe the provider's health endpoint. Never fails.
    async fn is_service_available(&self) -> bool;

    /// List assets currently purchasable through this provider
    async fn get_supported_assets(&self) -> Result<Vec<Asset>, OnRampError>;

    /// Price a purchase with exactly one side of the pair fixed
    async fn get_quote(&self, request: &QuoteRequest) -> Result<Quote, OnRampError>;

    /// Start a purchase; the returned order is pending payment or processing
    async fn create_order(&self, request: &OrderRequest) -> Result<Order, OnRampError>;

    /// Fetch the provider's current view of an order
    async fn get_order_status(&self, order_id: &str) -> Result<Order, OnRampError>;

    /// List payment methods for a currency pair
    async fn get_payment_methods(
        &self,
        fiat_currency: &str,
        crypto_currency: &str,
    ) -> Result<Vec<PaymentMethod>, OnRampError>;

    /// List a user's past purchases. Providers without a history API keep
    /// this default.
    async fn get_transaction_history(
        &self,
        user_id: &str,
    ) -> Result<Vec<Transaction>, OnRampError> {
        let _ = user_id;
        Err(OnRampError::not_supported(
            self.provider_name(),
            "transaction history",
        ))
    }
}
