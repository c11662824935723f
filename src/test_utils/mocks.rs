//! Mock implementations for testing.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;
use validator::Validate;

use crate::domain::{
    AmountSpec, Asset, OnRampError, OnRampProvider, Order, OrderRequest, OrderStatus,
    PaymentMethod, ProviderConfig, ProviderError, Quote, QuoteRequest,
};

pub const MOCK_PROVIDER_NAME: &str = "mock";

/// Configuration for mock behavior
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    pub should_fail: bool,
    pub error_message: Option<String>,
}

impl MockConfig {
    #[must_use]
    pub fn success() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            should_fail: true,
            error_message: Some(message.into()),
        }
    }
}

/// In-memory provider without a transaction history API
#[derive(Debug)]
pub struct MockOnRampProvider {
    orders: Arc<Mutex<HashMap<String, Order>>>,
    config: MockConfig,
    configured: AtomicBool,
    is_healthy: AtomicBool,
    calls: AtomicUsize,
}

impl Default for MockOnRampProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockOnRampProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(MockConfig::success())
    }

    #[must_use]
    pub fn with_config(config: MockConfig) -> Self {
        Self {
            orders: Arc::new(Mutex::new(HashMap::new())),
            config,
            configured: AtomicBool::new(false),
            is_healthy: AtomicBool::new(true),
            calls: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_config(MockConfig::failure(message))
    }

    /// Registry constructor
    pub fn constructor() -> Arc<dyn OnRampProvider> {
        Arc::new(Self::new())
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.is_healthy.store(healthy, Ordering::Relaxed);
    }

    /// Move a stored order to `status`, as the provider would after payment.
    pub fn set_order_status(&self, order_id: &str, status: OrderStatus) -> bool {
        let mut orders = self.orders.lock().unwrap();
        match orders.get_mut(order_id) {
            Some(order) => {
                order.status = status;
                order.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }

    /// Number of I/O operations that reached the mock
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn rate(crypto_currency: &str) -> Decimal {
        match crypto_currency.to_uppercase().as_str() {
            "BTC" => Decimal::from(40_000),
            "ETH" => Decimal::from(2_000),
            _ => Decimal::ONE,
        }
    }

    fn check_ready(&self) -> Result<(), OnRampError> {
        if !self.configured.load(Ordering::SeqCst) {
            return Err(OnRampError::not_configured(MOCK_PROVIDER_NAME));
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.config.should_fail {
            let msg = self
                .config
                .error_message
                .clone()
                .unwrap_or_else(|| "Mock error".to_string());
            return Err(OnRampError::provider(
                MOCK_PROVIDER_NAME,
                ProviderError::Network(msg),
            ));
        }
        Ok(())
    }

    fn price(request_amount: &AmountSpec, rate: Decimal) -> (Decimal, Decimal) {
        match request_amount {
            AmountSpec::InFiat(fiat) => (*fiat, (*fiat / rate).round_dp(8)),
            AmountSpec::InCrypto(crypto) => ((*crypto * rate).round_dp(2), *crypto),
        }
    }
}

#[async_trait]
impl OnRampProvider for MockOnRampProvider {
    fn provider_name(&self) -> &'static str {
        MOCK_PROVIDER_NAME
    }

    fn configure(&self, config: ProviderConfig) -> Result<(), OnRampError> {
        config.validate()?;
        self.configured.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn validate_configuration(&self) -> bool {
        self.configured.load(Ordering::SeqCst)
    }

    async fn is_service_available(&self) -> bool {
        self.configured.load(Ordering::SeqCst) && self.is_healthy.load(Ordering::Relaxed)
    }

    async fn get_supported_assets(&self) -> Result<Vec<Asset>, OnRampError> {
        self.check_ready()?;
        Ok(["BTC", "ETH"]
            .into_iter()
            .map(|code| Asset {
                crypto_code: code.to_string(),
                fiat_code: "USD".to_string(),
                min_amount: Decimal::from(10),
                max_amount: Decimal::from(10_000),
                network: None,
                available: true,
                provider_name: MOCK_PROVIDER_NAME.to_string(),
            })
            .collect())
    }

    async fn get_quote(&self, request: &QuoteRequest) -> Result<Quote, OnRampError> {
        self.check_ready()?;
        request.validate()?;

        let rate = Self::rate(&request.crypto_currency);
        let (fiat_amount, crypto_amount) = Self::price(&request.amount, rate);
        let fee = (fiat_amount * Decimal::new(1, 2)).round_dp(2);

        Ok(Quote {
            fiat_amount,
            crypto_amount,
            fiat_currency: request.fiat_currency.clone(),
            crypto_currency: request.crypto_currency.clone(),
            exchange_rate: rate,
            fee,
            total_fiat_amount: fiat_amount + fee,
            payment_method_id: request.payment_method_id.clone(),
            valid_until: Some(Utc::now() + chrono::Duration::minutes(5)),
            provider_name: MOCK_PROVIDER_NAME.to_string(),
        })
    }

    async fn create_order(&self, request: &OrderRequest) -> Result<Order, OnRampError> {
        self.check_ready()?;
        request.validate()?;

        let rate = Self::rate(&request.crypto_currency);
        let (fiat_amount, crypto_amount) = Self::price(&request.amount, rate);
        let order_id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let order = Order {
            order_id: order_id.clone(),
            status: OrderStatus::PendingPayment,
            payment_url: Some(format!("https://pay.mock/{}", order_id)),
            fiat_amount,
            crypto_amount,
            fiat_currency: request.fiat_currency.clone(),
            crypto_currency: request.crypto_currency.clone(),
            wallet_address: Some(request.wallet_address.clone()),
            payment_method_id: request.payment_method_id.clone(),
            provider_name: MOCK_PROVIDER_NAME.to_string(),
            provider_order_id: Some(order_id.clone()),
            created_at: now,
            updated_at: now,
            expires_at: Some(now + chrono::Duration::minutes(30)),
            transaction_hash: None,
            user_id: request.user_id.clone(),
            redirect_url: Some(request.redirect_url.clone()),
        };

        self.orders.lock().unwrap().insert(order_id, order.clone());
        Ok(order)
    }

    async fn get_order_status(&self, order_id: &str) -> Result<Order, OnRampError> {
        if order_id.trim().is_empty() {
            return Err(OnRampError::invalid_argument("order_id", "must not be blank"));
        }
        self.check_ready()?;

        self.orders
            .lock()
            .unwrap()
            .get(order_id)
            .cloned()
            .ok_or_else(|| {
                OnRampError::provider(
                    MOCK_PROVIDER_NAME,
                    ProviderError::NotFound(format!("order {}", order_id)),
                )
            })
    }

    async fn get_payment_methods(
        &self,
        fiat_currency: &str,
        _crypto_currency: &str,
    ) -> Result<Vec<PaymentMethod>, OnRampError> {
        self.check_ready()?;
        Ok(vec![PaymentMethod {
            method_id: "card".to_string(),
            name: "Credit Card".to_string(),
            min_limit: Some(Decimal::from(10)),
            max_limit: Some(Decimal::from(10_000)),
            supported_currencies: Some(vec![fiat_currency.to_string()]),
            processing_time: Some("instant".to_string()),
            available: true,
            provider_name: MOCK_PROVIDER_NAME.to_string(),
            icon_url: None,
            description: None,
        }])
    }
}
