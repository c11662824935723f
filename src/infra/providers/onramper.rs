//! Onramper aggregator adapter.
//!
//! Maps the uniform provider contract onto Onramper's REST API:
//!
//! | Operation           | Route                                   |
//! |---------------------|-----------------------------------------|
//! | supported assets    | `GET /supported`                        |
//! | quote               | `GET /quotes/{fiat}/{crypto}?amount=`   |
//! | create order        | `POST /checkout/intent`                 |
//! | order status        | `GET /transactions/{id}`                |
//! | payment methods     | `GET /payments?fiat=&crypto=`           |
//! | transaction history | `GET /transactions?userId=`             |

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use validator::Validate;

use crate::domain::{
    Asset, OnRampError, OnRampProvider, Order, OrderRequest, OrderStatus, PaymentMethod,
    ProviderConfig, ProviderError, Quote, QuoteRequest, Transaction, TransactionStatus,
    ValidationError,
};

use super::base::{ProviderCore, ProviderEndpoints, header_value};

pub const PROVIDER_NAME: &str = "onramper";
pub const PRODUCTION_BASE_URL: &str = "https://api.onramper.com";
pub const SANDBOX_BASE_URL: &str = "https://api-stg.onramper.com";

/// Header carrying the account secret on order lookups
pub const SECRET_HEADER: &str = "x-onramper-secret";

/// Onramper's supported-assets feed does not name a fiat side
pub const DEFAULT_FIAT_CODE: &str = "USD";

const ENDPOINTS: ProviderEndpoints = ProviderEndpoints {
    production_url: PRODUCTION_BASE_URL,
    sandbox_url: SANDBOX_BASE_URL,
    health_path: "/supported",
};

// ============================================================================
// WIRE TYPES
// ============================================================================

#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    message: Option<Vec<T>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireAsset {
    #[allow(dead_code)]
    id: Option<String>,
    #[allow(dead_code)]
    name: Option<String>,
    symbol: Option<String>,
    network: Option<String>,
    #[allow(dead_code)]
    #[serde(rename = "type")]
    kind: Option<String>,
    min_amount: Option<Decimal>,
    max_amount: Option<Decimal>,
    available: Option<bool>,
    fiat_currency: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireQuote {
    #[allow(dead_code)]
    onramp: Option<String>,
    fiat_amount: Option<Decimal>,
    crypto_amount: Option<Decimal>,
    rate: Option<Decimal>,
    fee: Option<Decimal>,
    total_fiat_amount: Option<Decimal>,
    payment_method: Option<String>,
    #[serde(default)]
    errors: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckoutIntentRequest<'a> {
    fiat_currency: &'a str,
    crypto_currency: &'a str,
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    fiat_amount: Option<Decimal>,
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    crypto_amount: Option<Decimal>,
    wallet_address: &'a str,
    redirect_url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    payment_method: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckoutIntentResponse {
    transaction_information: Option<TransactionInformation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionInformation {
    id: Option<String>,
    status: Option<String>,
    #[allow(dead_code)]
    redirect_type: Option<String>,
    url: Option<String>,
    fiat_amount: Option<Decimal>,
    crypto_amount: Option<Decimal>,
    fiat_currency: Option<String>,
    crypto_currency: Option<String>,
    wallet_address: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireTransaction {
    id: Option<String>,
    status: Option<String>,
    fiat_amount: Option<Decimal>,
    crypto_amount: Option<Decimal>,
    fiat_currency: Option<String>,
    crypto_currency: Option<String>,
    wallet_address: Option<String>,
    payment_method: Option<String>,
    #[allow(dead_code)]
    onramp: Option<String>,
    created_at: Option<String>,
    updated_at: Option<String>,
    tx_hash: Option<String>,
    fee: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePaymentMethod {
    id: Option<String>,
    name: Option<String>,
    min_limit: Option<Decimal>,
    max_limit: Option<Decimal>,
    supported_currencies: Option<Vec<String>>,
    processing_time: Option<String>,
    available: Option<bool>,
    icon: Option<String>,
    description: Option<String>,
}

// ============================================================================
// STATUS MAPPING
// ============================================================================

/// Normalize an Onramper status; unknown values are treated as awaiting payment.
pub fn map_order_status(status: Option<&str>) -> OrderStatus {
    let Some(status) = status else {
        return OrderStatus::PendingPayment;
    };
    match status.trim().to_lowercase().as_str() {
        "pending" | "waiting" | "new" => OrderStatus::PendingPayment,
        "processing" | "paid" => OrderStatus::Processing,
        "completed" | "success" => OrderStatus::Completed,
        "failed" | "error" => OrderStatus::Failed,
        "cancelled" | "canceled" => OrderStatus::Cancelled,
        "expired" => OrderStatus::Expired,
        other => {
            debug!(status = %other, "Unmapped Onramper order status");
            OrderStatus::PendingPayment
        }
    }
}

/// Normalize an Onramper status for history entries; unknown values stay pending.
pub fn map_transaction_status(status: Option<&str>) -> TransactionStatus {
    let Some(status) = status else {
        return TransactionStatus::Pending;
    };
    match status.trim().to_lowercase().as_str() {
        "pending" | "waiting" | "new" | "processing" | "paid" => TransactionStatus::Pending,
        "completed" | "success" => TransactionStatus::Success,
        "failed" | "error" | "expired" => TransactionStatus::Failed,
        "cancelled" | "canceled" => TransactionStatus::Cancelled,
        other => {
            debug!(status = %other, "Unmapped Onramper transaction status");
            TransactionStatus::Pending
        }
    }
}

// ============================================================================
// RESPONSE MAPPING
// ============================================================================

fn required<T>(value: Option<T>, field: &str) -> Result<T, ProviderError> {
    value.ok_or_else(|| ProviderError::InvalidResponse(format!("missing field `{}`", field)))
}

fn checked<T: Validate>(value: T) -> Result<T, ProviderError> {
    value
        .validate()
        .map_err(|e| ProviderError::InvalidResponse(ValidationError::from(e).to_string()))?;
    Ok(value)
}

fn parse_timestamp(
    raw: Option<&str>,
    field: &str,
) -> Result<Option<DateTime<Utc>>, ProviderError> {
    raw.filter(|s| !s.trim().is_empty())
        .map(|s| {
            DateTime::parse_from_rfc3339(s.trim())
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| {
                    ProviderError::InvalidResponse(format!("`{}` is not RFC 3339: {}", field, e))
                })
        })
        .transpose()
}

fn to_assets(items: Vec<WireAsset>) -> Vec<Asset> {
    items
        .into_iter()
        .filter(|a| a.available == Some(true))
        .filter_map(|a| {
            let symbol = a.symbol.filter(|s| !s.trim().is_empty())?;
            let asset = Asset {
                crypto_code: symbol,
                fiat_code: a
                    .fiat_currency
                    .unwrap_or_else(|| DEFAULT_FIAT_CODE.to_string()),
                min_amount: a.min_amount.unwrap_or(Decimal::ZERO).max(Decimal::ZERO),
                max_amount: a.max_amount.unwrap_or(Decimal::MAX),
                network: a.network,
                available: true,
                provider_name: PROVIDER_NAME.to_string(),
            };
            match asset.validate() {
                Ok(()) => Some(asset),
                Err(e) => {
                    warn!(crypto_code = %asset.crypto_code, error = %e, "Skipping malformed asset");
                    None
                }
            }
        })
        .collect()
}

fn to_quote(items: Vec<WireQuote>, request: &QuoteRequest) -> Result<Quote, ProviderError> {
    let quote = items
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::InvalidResponse("empty quote response".to_string()))?;

    if !quote.errors.is_empty() && quote.fiat_amount.is_none() {
        return Err(ProviderError::InvalidResponse(quote.errors.join("; ")));
    }

    let fiat_amount = required(quote.fiat_amount, "fiatAmount")?;
    let total_fiat_amount = required(quote.total_fiat_amount, "totalFiatAmount")?;
    // Omitted fee is whatever the total charges on top of the fiat amount
    let fee = quote.fee.unwrap_or(total_fiat_amount - fiat_amount);

    checked(Quote {
        fiat_amount,
        crypto_amount: required(quote.crypto_amount, "cryptoAmount")?,
        fiat_currency: request.fiat_currency.clone(),
        crypto_currency: request.crypto_currency.clone(),
        exchange_rate: required(quote.rate, "rate")?,
        fee,
        total_fiat_amount,
        payment_method_id: quote.payment_method.or_else(|| request.payment_method_id.clone()),
        valid_until: None,
        provider_name: PROVIDER_NAME.to_string(),
    })
}

fn to_created_order(
    response: CheckoutIntentResponse,
    request: &OrderRequest,
) -> Result<Order, ProviderError> {
    let info = required(response.transaction_information, "transactionInformation")?;
    let order_id = required(info.id, "transactionInformation.id")?;
    let status = map_order_status(info.status.as_deref());

    if !matches!(status, OrderStatus::PendingPayment | OrderStatus::Processing) {
        return Err(ProviderError::InvalidResponse(format!(
            "order {} was created in state {}",
            order_id, status
        )));
    }

    let now = Utc::now();
    checked(Order {
        provider_order_id: Some(order_id.clone()),
        order_id,
        status,
        payment_url: info.url,
        fiat_amount: required(
            info.fiat_amount.or(request.amount.fiat_amount()),
            "transactionInformation.fiatAmount",
        )?,
        crypto_amount: required(
            info.crypto_amount.or(request.amount.crypto_amount()),
            "transactionInformation.cryptoAmount",
        )?,
        fiat_currency: info
            .fiat_currency
            .unwrap_or_else(|| request.fiat_currency.clone()),
        crypto_currency: info
            .crypto_currency
            .unwrap_or_else(|| request.crypto_currency.clone()),
        wallet_address: info
            .wallet_address
            .or_else(|| Some(request.wallet_address.clone())),
        payment_method_id: request.payment_method_id.clone(),
        provider_name: PROVIDER_NAME.to_string(),
        created_at: now,
        updated_at: now,
        expires_at: None,
        transaction_hash: None,
        user_id: request.user_id.clone(),
        redirect_url: Some(request.redirect_url.clone()),
    })
}

fn to_order(tx: WireTransaction) -> Result<Order, ProviderError> {
    let order_id = required(tx.id, "id")?;
    let now = Utc::now();
    let created_at = parse_timestamp(tx.created_at.as_deref(), "createdAt")?.unwrap_or(now);
    let updated_at = parse_timestamp(tx.updated_at.as_deref(), "updatedAt")?
        .unwrap_or(now)
        .max(created_at);

    checked(Order {
        provider_order_id: Some(order_id.clone()),
        order_id,
        status: map_order_status(tx.status.as_deref()),
        payment_url: None,
        fiat_amount: required(tx.fiat_amount, "fiatAmount")?,
        crypto_amount: required(tx.crypto_amount, "cryptoAmount")?,
        fiat_currency: required(tx.fiat_currency, "fiatCurrency")?,
        crypto_currency: required(tx.crypto_currency, "cryptoCurrency")?,
        wallet_address: tx.wallet_address,
        payment_method_id: tx.payment_method,
        provider_name: PROVIDER_NAME.to_string(),
        created_at,
        updated_at,
        expires_at: None,
        transaction_hash: tx.tx_hash,
        user_id: None,
        redirect_url: None,
    })
}

fn to_transaction(tx: WireTransaction, user_id: &str) -> Result<Transaction, ProviderError> {
    let transaction_id = required(tx.id, "id")?;
    let timestamp =
        parse_timestamp(tx.created_at.as_deref(), "createdAt")?.unwrap_or_else(Utc::now);

    checked(Transaction {
        order_id: Some(transaction_id.clone()),
        provider_transaction_id: Some(transaction_id.clone()),
        transaction_id,
        status: map_transaction_status(tx.status.as_deref()),
        fiat_amount: required(tx.fiat_amount, "fiatAmount")?,
        crypto_amount: required(tx.crypto_amount, "cryptoAmount")?,
        fiat_currency: required(tx.fiat_currency, "fiatCurrency")?,
        crypto_currency: required(tx.crypto_currency, "cryptoCurrency")?,
        timestamp,
        fee: tx.fee,
        wallet_address: tx.wallet_address,
        transaction_hash: tx.tx_hash,
        provider_name: PROVIDER_NAME.to_string(),
        payment_method_id: tx.payment_method,
        user_id: Some(user_id.to_string()),
        exchange_rate: None,
    })
}

fn to_payment_methods(items: Vec<WirePaymentMethod>) -> Vec<PaymentMethod> {
    items
        .into_iter()
        .filter(|m| m.available == Some(true))
        .filter_map(|m| {
            let method = PaymentMethod {
                method_id: m.id?,
                name: m.name?,
                min_limit: m.min_limit,
                max_limit: m.max_limit,
                supported_currencies: m.supported_currencies,
                processing_time: m.processing_time,
                available: true,
                provider_name: PROVIDER_NAME.to_string(),
                icon_url: m.icon,
                description: m.description,
            };
            match method.validate() {
                Ok(()) => Some(method),
                Err(e) => {
                    warn!(
                        method_id = %method.method_id,
                        error = %e,
                        "Skipping malformed payment method"
                    );
                    None
                }
            }
        })
        .collect()
}

// ============================================================================
// ADAPTER
// ============================================================================

/// Onramper implementation of [`OnRampProvider`]
#[derive(Debug)]
pub struct OnramperProvider {
    core: ProviderCore,
}

impl Default for OnramperProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl OnramperProvider {
    /// Create an unconfigured adapter
    pub fn new() -> Self {
        Self {
            core: ProviderCore::new(PROVIDER_NAME, ENDPOINTS),
        }
    }

    /// Create and configure in one step
    pub fn with_config(config: ProviderConfig) -> Result<Self, OnRampError> {
        let provider = Self::new();
        provider.configure(config)?;
        Ok(provider)
    }

    fn wrap(err: ProviderError) -> OnRampError {
        OnRampError::provider(PROVIDER_NAME, err)
    }
}

#[async_trait]
impl OnRampProvider for OnramperProvider {
    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn configure(&self, config: ProviderConfig) -> Result<(), OnRampError> {
        self.core.configure(config)
    }

    async fn validate_configuration(&self) -> bool {
        self.core.validate_configuration()
    }

    async fn is_service_available(&self) -> bool {
        self.core.is_service_available().await
    }

    #[instrument(skip(self), fields(provider = PROVIDER_NAME))]
    async fn get_supported_assets(&self) -> Result<Vec<Asset>, OnRampError> {
        let client = self.core.client()?;

        let response: ListResponse<WireAsset> = client
            .execute(PROVIDER_NAME, "get_supported_assets", || {
                client.transport.get("/supported", &[], None)
            })
            .await?;

        let assets = to_assets(response.message.unwrap_or_default());
        info!(count = assets.len(), "Retrieved supported assets from Onramper");
        Ok(assets)
    }

    #[instrument(
        skip(self, request),
        fields(
            provider = PROVIDER_NAME,
            fiat = %request.fiat_currency,
            crypto = %request.crypto_currency
        )
    )]
    async fn get_quote(&self, request: &QuoteRequest) -> Result<Quote, OnRampError> {
        let client = self.core.client()?;
        request.validate()?;

        let path = format!(
            "/quotes/{}/{}",
            urlencoding::encode(&request.fiat_currency.trim().to_lowercase()),
            urlencoding::encode(&request.crypto_currency.trim().to_lowercase()),
        );
        let query = match request.amount.fiat_amount() {
            Some(amount) => vec![("amount", amount.to_string())],
            None => vec![("cryptoAmount", request.amount.value().to_string())],
        };

        let response: ListResponse<WireQuote> = client
            .execute(PROVIDER_NAME, "get_quote", || {
                client.transport.get(&path, &query, None)
            })
            .await?;

        let quote = to_quote(response.message.unwrap_or_default(), request).map_err(Self::wrap)?;
        info!(
            fiat_amount = %quote.fiat_amount,
            crypto_amount = %quote.crypto_amount,
            rate = %quote.exchange_rate,
            "Retrieved quote from Onramper"
        );
        Ok(quote)
    }

    #[instrument(
        skip(self, request),
        fields(
            provider = PROVIDER_NAME,
            fiat = %request.fiat_currency,
            crypto = %request.crypto_currency
        )
    )]
    async fn create_order(&self, request: &OrderRequest) -> Result<Order, OnRampError> {
        let client = self.core.client()?;
        request.validate()?;

        let body = CheckoutIntentRequest {
            fiat_currency: &request.fiat_currency,
            crypto_currency: &request.crypto_currency,
            fiat_amount: request.amount.fiat_amount(),
            crypto_amount: request.amount.crypto_amount(),
            wallet_address: &request.wallet_address,
            redirect_url: &request.redirect_url,
            payment_method: request.payment_method_id.as_deref(),
        };

        let response: CheckoutIntentResponse = client
            .execute(PROVIDER_NAME, "create_order", || {
                client.transport.post("/checkout/intent", &body)
            })
            .await?;

        let order = to_created_order(response, request).map_err(Self::wrap)?;
        info!(order_id = %order.order_id, status = %order.status, "Created Onramper order");
        Ok(order)
    }

    #[instrument(skip(self), fields(provider = PROVIDER_NAME))]
    async fn get_order_status(&self, order_id: &str) -> Result<Order, OnRampError> {
        let client = self.core.client()?;
        if order_id.trim().is_empty() {
            return Err(OnRampError::invalid_argument("order_id", "must not be blank"));
        }

        let mut headers = HeaderMap::new();
        if let Some(secret) = client.config.api_secret() {
            let mut value = header_value(PROVIDER_NAME, "api_secret", secret)?;
            value.set_sensitive(true);
            headers.insert(SECRET_HEADER, value);
        }
        let path = format!("/transactions/{}", urlencoding::encode(order_id.trim()));

        let response: WireTransaction = client
            .execute(PROVIDER_NAME, "get_order_status", || {
                client.transport.get(&path, &[], Some(headers.clone()))
            })
            .await
            .map_err(|e| match e {
                OnRampError::Provider {
                    source: ProviderError::ApiError { status_code: 404, .. },
                    ..
                } => Self::wrap(ProviderError::NotFound(format!("order {}", order_id))),
                other => other,
            })?;

        let order = to_order(response).map_err(Self::wrap)?;
        info!(
            order_id = %order.order_id,
            status = %order.status,
            "Retrieved Onramper order status"
        );
        Ok(order)
    }

    #[instrument(skip(self), fields(provider = PROVIDER_NAME))]
    async fn get_payment_methods(
        &self,
        fiat_currency: &str,
        crypto_currency: &str,
    ) -> Result<Vec<PaymentMethod>, OnRampError> {
        let client = self.core.client()?;
        if fiat_currency.trim().is_empty() {
            return Err(OnRampError::invalid_argument("fiat_currency", "must not be blank"));
        }
        if crypto_currency.trim().is_empty() {
            return Err(OnRampError::invalid_argument("crypto_currency", "must not be blank"));
        }

        let query = [
            ("fiat", fiat_currency.trim().to_string()),
            ("crypto", crypto_currency.trim().to_string()),
        ];
        let response: ListResponse<WirePaymentMethod> = client
            .execute(PROVIDER_NAME, "get_payment_methods", || {
                client.transport.get("/payments", &query, None)
            })
            .await?;

        let methods = to_payment_methods(response.message.unwrap_or_default());
        info!(count = methods.len(), "Retrieved payment methods from Onramper");
        Ok(methods)
    }

    #[instrument(skip(self), fields(provider = PROVIDER_NAME))]
    async fn get_transaction_history(
        &self,
        user_id: &str,
    ) -> Result<Vec<Transaction>, OnRampError> {
        let client = self.core.client()?;
        if user_id.trim().is_empty() {
            return Err(OnRampError::invalid_argument("user_id", "must not be blank"));
        }

        let query = [("userId", user_id.trim().to_string())];
        let response: ListResponse<WireTransaction> = client
            .execute(PROVIDER_NAME, "get_transaction_history", || {
                client.transport.get("/transactions", &query, None)
            })
            .await?;

        let transactions = response
            .message
            .unwrap_or_default()
            .into_iter()
            .map(|tx| to_transaction(tx, user_id.trim()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(Self::wrap)?;
        info!(count = transactions.len(), "Retrieved transaction history from Onramper");
        Ok(transactions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AmountSpec, ErrorCode};
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_order_status_mapping_is_case_insensitive() {
        let table = [
            ("pending", OrderStatus::PendingPayment),
            ("waiting", OrderStatus::PendingPayment),
            ("processing", OrderStatus::Processing),
            ("completed", OrderStatus::Completed),
            ("success", OrderStatus::Completed),
            ("failed", OrderStatus::Failed),
            ("error", OrderStatus::Failed),
            ("cancelled", OrderStatus::Cancelled),
            ("expired", OrderStatus::Expired),
        ];

        for (raw, expected) in table {
            assert_eq!(map_order_status(Some(raw)), expected);
            assert_eq!(map_order_status(Some(&raw.to_uppercase())), expected);
            assert_eq!(
                map_order_status(Some(&raw.to_lowercase())),
                map_order_status(Some(&raw.to_uppercase()))
            );
        }
    }

    #[test]
    fn test_unknown_status_falls_back_to_pending() {
        assert_eq!(map_order_status(Some("foobar")), OrderStatus::PendingPayment);
        assert_eq!(map_order_status(None), OrderStatus::PendingPayment);
        assert_eq!(
            map_transaction_status(Some("foobar")),
            TransactionStatus::Pending
        );
        assert_eq!(map_transaction_status(None), TransactionStatus::Pending);
    }

    #[test]
    fn test_transaction_status_mapping() {
        assert_eq!(
            map_transaction_status(Some("Completed")),
            TransactionStatus::Success
        );
        assert_eq!(
            map_transaction_status(Some("PROCESSING")),
            TransactionStatus::Pending
        );
        assert_eq!(
            map_transaction_status(Some("error")),
            TransactionStatus::Failed
        );
        assert_eq!(
            map_transaction_status(Some("cancelled")),
            TransactionStatus::Cancelled
        );
    }

    #[test]
    fn test_assets_keep_only_available_entries() {
        let items: Vec<WireAsset> = serde_json::from_value(json!([
            {
                "symbol": "BTC",
                "network": "bitcoin",
                "minAmount": 10,
                "maxAmount": 5000,
                "available": true
            },
            {"symbol": "ETH", "available": false},
            {"symbol": "USDC", "network": "polygon", "available": true},
            {"symbol": "", "available": true}
        ]))
        .unwrap();

        let assets = to_assets(items);
        assert_eq!(assets.len(), 2);

        assert_eq!(assets[0].crypto_code, "BTC");
        assert_eq!(assets[0].network.as_deref(), Some("bitcoin"));
        assert_eq!(assets[0].min_amount, dec!(10));
        assert_eq!(assets[0].max_amount, dec!(5000));
        assert_eq!(assets[0].fiat_code, DEFAULT_FIAT_CODE);

        assert_eq!(assets[1].crypto_code, "USDC");
        assert_eq!(assets[1].min_amount, Decimal::ZERO);
        assert_eq!(assets[1].max_amount, Decimal::MAX);
        assert!(assets.iter().all(|a| a.provider_name == PROVIDER_NAME));
    }

    #[test]
    fn test_quote_requires_amounts() {
        let request = QuoteRequest::new("USD", "BTC", AmountSpec::InFiat(dec!(100)));
        let items: Vec<WireQuote> =
            serde_json::from_value(json!([{"fiatAmount": 100.0, "rate": 40000.0}])).unwrap();

        let err = to_quote(items, &request).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidResponse);

        let err = to_quote(vec![], &request).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidResponse);
    }

    #[test]
    fn test_quote_without_fee_derives_it_from_total() {
        let request = QuoteRequest::new("USD", "BTC", AmountSpec::InFiat(dec!(100)));
        let items: Vec<WireQuote> = serde_json::from_value(json!([{
            "fiatAmount": 100.0,
            "cryptoAmount": 0.0025,
            "rate": 40000.0,
            "totalFiatAmount": 102.5
        }]))
        .unwrap();

        let quote = to_quote(items, &request).unwrap();
        assert_eq!(quote.fee, dec!(2.5));
        assert_eq!(quote.total_fiat_amount, dec!(102.5));
        assert_eq!(quote.fiat_amount + quote.fee, quote.total_fiat_amount);
    }

    #[test]
    fn test_quote_with_provider_errors_is_rejected() {
        let request = QuoteRequest::new("USD", "BTC", AmountSpec::InFiat(dec!(100)));
        let items: Vec<WireQuote> =
            serde_json::from_value(json!([{"errors": ["amount below minimum"]}])).unwrap();

        let err = to_quote(items, &request).unwrap_err();
        assert!(err.to_string().contains("amount below minimum"));
    }

    #[test]
    fn test_created_order_in_terminal_state_is_invalid() {
        let request = OrderRequest::new(
            "USD",
            "BTC",
            AmountSpec::InFiat(dec!(50)),
            "bc1q...",
            "https://cb",
        );
        let response: CheckoutIntentResponse = serde_json::from_value(json!({
            "transactionInformation": {"id": "ord-9", "status": "failed", "cryptoAmount": 0.001}
        }))
        .unwrap();

        let err = to_created_order(response, &request).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidResponse);
    }

    #[test]
    fn test_created_order_falls_back_to_request_fields() {
        let request = OrderRequest::new(
            "USD",
            "BTC",
            AmountSpec::InFiat(dec!(50)),
            "bc1q...",
            "https://cb",
        );
        let response: CheckoutIntentResponse = serde_json::from_value(json!({
            "transactionInformation": {"id": "ord-2", "status": "processing", "cryptoAmount": 0.001}
        }))
        .unwrap();

        let order = to_created_order(response, &request).unwrap();
        assert_eq!(order.status, OrderStatus::Processing);
        assert_eq!(order.fiat_amount, dec!(50));
        assert_eq!(order.fiat_currency, "USD");
        assert_eq!(order.wallet_address.as_deref(), Some("bc1q..."));
        assert_eq!(order.redirect_url.as_deref(), Some("https://cb"));
    }

    #[test]
    fn test_order_timestamps_are_parsed() {
        let tx: WireTransaction = serde_json::from_value(json!({
            "id": "ord-1",
            "status": "processing",
            "fiatAmount": 50,
            "cryptoAmount": 0.001,
            "fiatCurrency": "USD",
            "cryptoCurrency": "BTC",
            "createdAt": "2024-03-01T10:00:00Z",
            "updatedAt": "2024-03-01T10:05:00+00:00",
            "txHash": "0xabc"
        }))
        .unwrap();

        let order = to_order(tx).unwrap();
        assert_eq!(order.created_at.to_rfc3339(), "2024-03-01T10:00:00+00:00");
        assert_eq!(order.updated_at.to_rfc3339(), "2024-03-01T10:05:00+00:00");
        assert_eq!(order.transaction_hash.as_deref(), Some("0xabc"));
    }

    #[test]
    fn test_malformed_timestamp_is_invalid_response() {
        let tx: WireTransaction = serde_json::from_value(json!({
            "id": "t-1",
            "fiatAmount": 50,
            "cryptoAmount": 0.001,
            "fiatCurrency": "USD",
            "cryptoCurrency": "BTC",
            "createdAt": "yesterday"
        }))
        .unwrap();

        let err = to_transaction(tx, "u1").unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidResponse);
    }

    #[test]
    fn test_checkout_body_carries_only_the_fixed_amount() {
        let body = CheckoutIntentRequest {
            fiat_currency: "USD",
            crypto_currency: "BTC",
            fiat_amount: None,
            crypto_amount: Some(dec!(0.5)),
            wallet_address: "bc1q...",
            redirect_url: "https://cb",
            payment_method: None,
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["cryptoAmount"], json!(0.5));
        assert!(json.get("fiatAmount").is_none());
        assert!(json.get("paymentMethod").is_none());
        assert_eq!(json["walletAddress"], "bc1q...");
    }

    #[tokio::test]
    async fn test_operations_require_configuration() {
        let provider = OnramperProvider::new();
        assert_eq!(provider.provider_name(), "onramper");
        assert!(!provider.validate_configuration().await);
        assert!(!provider.is_service_available().await);

        let err = provider.get_supported_assets().await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidConfiguration);

        let err = provider.get_order_status("ord-1").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidConfiguration);

        let err = provider.get_transaction_history("u1").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidConfiguration);
    }
}
