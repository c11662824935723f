//! Normalized on-ramp data model with validation support.

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError as FieldError};

use super::error::{OnRampError, ProviderError};

/// Lifecycle of a purchase order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Waiting for the user to pay
    #[default]
    PendingPayment,
    /// Payment received, crypto delivery in progress
    Processing,
    Completed,
    Failed,
    Cancelled,
    Expired,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        Self::PendingPayment,
        Self::Processing,
        Self::Completed,
        Self::Failed,
        Self::Cancelled,
        Self::Expired,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PendingPayment => "pending_payment",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
        }
    }

    /// Whether the order can still change state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Failed | Self::Cancelled | Self::Expired
        )
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending_payment" => Ok(Self::PendingPayment),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            "expired" => Ok(Self::Expired),
            _ => Err(ProviderError::InvalidResponse(format!(
                "Invalid order status: {}",
                s
            ))),
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Settlement state of a completed purchase
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    #[default]
    Pending,
    Success,
    Failed,
    Cancelled,
}

impl TransactionStatus {
    pub const ALL: [TransactionStatus; 4] =
        [Self::Pending, Self::Success, Self::Failed, Self::Cancelled];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::str::FromStr for TransactionStatus {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(ProviderError::InvalidResponse(format!(
                "Invalid transaction status: {}",
                s
            ))),
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which side of the currency pair the caller fixed.
///
/// Quotes and orders take exactly one amount; the provider computes the other.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AmountSpec {
    InFiat(Decimal),
    InCrypto(Decimal),
}

impl AmountSpec {
    /// Build from a pair of optional amounts, rejecting both-set and neither-set.
    pub fn from_options(
        fiat_amount: Option<Decimal>,
        crypto_amount: Option<Decimal>,
    ) -> Result<Self, OnRampError> {
        match (fiat_amount, crypto_amount) {
            (Some(fiat), None) => Ok(Self::InFiat(fiat)),
            (None, Some(crypto)) => Ok(Self::InCrypto(crypto)),
            (Some(_), Some(_)) => Err(OnRampError::invalid_argument(
                "amount",
                "only one of fiat_amount or crypto_amount may be provided",
            )),
            (None, None) => Err(OnRampError::invalid_argument(
                "amount",
                "either fiat_amount or crypto_amount is required",
            )),
        }
    }

    pub fn value(&self) -> Decimal {
        match self {
            Self::InFiat(v) | Self::InCrypto(v) => *v,
        }
    }

    pub fn fiat_amount(&self) -> Option<Decimal> {
        match self {
            Self::InFiat(v) => Some(*v),
            Self::InCrypto(_) => None,
        }
    }

    pub fn crypto_amount(&self) -> Option<Decimal> {
        match self {
            Self::InCrypto(v) => Some(*v),
            Self::InFiat(_) => None,
        }
    }
}

/// A purchasable crypto asset as offered by one provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
#[validate(schema(function = "validate_asset_bounds"))]
pub struct Asset {
    #[validate(custom(function = "not_blank"))]
    pub crypto_code: String,
    #[validate(custom(function = "not_blank"))]
    pub fiat_code: String,
    pub min_amount: Decimal,
    pub max_amount: Decimal,
    pub network: Option<String>,
    pub available: bool,
    #[validate(custom(function = "not_blank"))]
    pub provider_name: String,
}

/// A way to pay for an order (card, bank transfer, ...)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct PaymentMethod {
    #[validate(custom(function = "not_blank"))]
    pub method_id: String,
    #[validate(custom(function = "not_blank"))]
    pub name: String,
    pub min_limit: Option<Decimal>,
    pub max_limit: Option<Decimal>,
    pub supported_currencies: Option<Vec<String>>,
    pub processing_time: Option<String>,
    pub available: bool,
    #[validate(custom(function = "not_blank"))]
    pub provider_name: String,
    pub icon_url: Option<String>,
    pub description: Option<String>,
}

/// Price offer for a prospective purchase
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
#[validate(schema(function = "validate_quote_totals"))]
pub struct Quote {
    #[validate(custom(function = "positive"))]
    pub fiat_amount: Decimal,
    #[validate(custom(function = "positive"))]
    pub crypto_amount: Decimal,
    #[validate(custom(function = "not_blank"))]
    pub fiat_currency: String,
    #[validate(custom(function = "not_blank"))]
    pub crypto_currency: String,
    #[validate(custom(function = "positive"))]
    pub exchange_rate: Decimal,
    #[validate(custom(function = "non_negative"))]
    pub fee: Decimal,
    #[validate(custom(function = "positive"))]
    pub total_fiat_amount: Decimal,
    pub payment_method_id: Option<String>,
    pub valid_until: Option<DateTime<Utc>>,
    #[validate(custom(function = "not_blank"))]
    pub provider_name: String,
}

/// A purchase started with a provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
#[validate(schema(function = "validate_order_timestamps"))]
pub struct Order {
    #[validate(custom(function = "not_blank"))]
    pub order_id: String,
    pub status: OrderStatus,
    pub payment_url: Option<String>,
    pub fiat_amount: Decimal,
    pub crypto_amount: Decimal,
    #[validate(custom(function = "not_blank"))]
    pub fiat_currency: String,
    #[validate(custom(function = "not_blank"))]
    pub crypto_currency: String,
    pub wallet_address: Option<String>,
    pub payment_method_id: Option<String>,
    #[validate(custom(function = "not_blank"))]
    pub provider_name: String,
    pub provider_order_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub transaction_hash: Option<String>,
    pub user_id: Option<String>,
    pub redirect_url: Option<String>,
}

/// A settled (or settling) purchase as reported in a user's history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct Transaction {
    #[validate(custom(function = "not_blank"))]
    pub transaction_id: String,
    pub order_id: Option<String>,
    pub status: TransactionStatus,
    pub fiat_amount: Decimal,
    pub crypto_amount: Decimal,
    #[validate(custom(function = "not_blank"))]
    pub fiat_currency: String,
    #[validate(custom(function = "not_blank"))]
    pub crypto_currency: String,
    pub timestamp: DateTime<Utc>,
    pub fee: Option<Decimal>,
    pub wallet_address: Option<String>,
    pub transaction_hash: Option<String>,
    #[validate(custom(function = "not_blank"))]
    pub provider_name: String,
    pub payment_method_id: Option<String>,
    pub user_id: Option<String>,
    pub exchange_rate: Option<Decimal>,
    pub provider_transaction_id: Option<String>,
}

/// Inputs for pricing a purchase
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct QuoteRequest {
    #[validate(custom(function = "not_blank"))]
    pub fiat_currency: String,
    #[validate(custom(function = "not_blank"))]
    pub crypto_currency: String,
    #[validate(custom(function = "positive_amount"))]
    pub amount: AmountSpec,
    pub payment_method_id: Option<String>,
    pub user_id: Option<String>,
}

impl QuoteRequest {
    #[must_use]
    pub fn new(
        fiat_currency: impl Into<String>,
        crypto_currency: impl Into<String>,
        amount: AmountSpec,
    ) -> Self {
        Self {
            fiat_currency: fiat_currency.into(),
            crypto_currency: crypto_currency.into(),
            amount,
            payment_method_id: None,
            user_id: None,
        }
    }
}

/// Inputs for starting a purchase
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct OrderRequest {
    #[validate(custom(function = "not_blank"))]
    pub fiat_currency: String,
    #[validate(custom(function = "not_blank"))]
    pub crypto_currency: String,
    #[validate(custom(function = "positive_amount"))]
    pub amount: AmountSpec,
    #[validate(custom(function = "not_blank"))]
    pub wallet_address: String,
    #[validate(custom(function = "not_blank"))]
    pub redirect_url: String,
    pub payment_method_id: Option<String>,
    pub user_id: Option<String>,
}

impl OrderRequest {
    #[must_use]
    pub fn new(
        fiat_currency: impl Into<String>,
        crypto_currency: impl Into<String>,
        amount: AmountSpec,
        wallet_address: impl Into<String>,
        redirect_url: impl Into<String>,
    ) -> Self {
        Self {
            fiat_currency: fiat_currency.into(),
            crypto_currency: crypto_currency.into(),
            amount,
            wallet_address: wallet_address.into(),
            redirect_url: redirect_url.into(),
            payment_method_id: None,
            user_id: None,
        }
    }
}

/// Validate-and-return for any model type.
pub trait ValidateExt: Validate + Sized {
    /// Consume the value, returning it only if every rule holds.
    fn validated(self) -> Result<Self, OnRampError> {
        self.validate()?;
        Ok(self)
    }
}

impl<T: Validate> ValidateExt for T {}

fn field_error(code: &'static str, message: &'static str) -> FieldError {
    FieldError::new(code).with_message(Cow::Borrowed(message))
}

fn not_blank(value: &str) -> Result<(), FieldError> {
    if value.trim().is_empty() {
        return Err(field_error("blank", "must not be blank"));
    }
    Ok(())
}

fn positive(value: &Decimal) -> Result<(), FieldError> {
    if *value <= Decimal::ZERO {
        return Err(field_error("not_positive", "must be greater than 0"));
    }
    Ok(())
}

fn non_negative(value: &Decimal) -> Result<(), FieldError> {
    if *value < Decimal::ZERO {
        return Err(field_error("negative", "must not be negative"));
    }
    Ok(())
}

fn positive_amount(value: &AmountSpec) -> Result<(), FieldError> {
    positive(&value.value())
}

fn validate_asset_bounds(asset: &Asset) -> Result<(), FieldError> {
    if asset.min_amount < Decimal::ZERO {
        return Err(field_error("min_amount", "min_amount must not be negative"));
    }
    if asset.min_amount > asset.max_amount {
        return Err(field_error(
            "amount_bounds",
            "min_amount must not exceed max_amount",
        ));
    }
    Ok(())
}

fn validate_quote_totals(quote: &Quote) -> Result<(), FieldError> {
    if quote.total_fiat_amount < quote.fiat_amount {
        return Err(field_error(
            "total_below_amount",
            "total_fiat_amount must not be below fiat_amount",
        ));
    }
    // Providers round fees independently; allow 1% of the fiat amount.
    let tolerance = quote.fiat_amount * Decimal::new(1, 2);
    let drift = (quote.total_fiat_amount - (quote.fiat_amount + quote.fee)).abs();
    if drift > tolerance {
        return Err(field_error(
            "total_mismatch",
            "total_fiat_amount must equal fiat_amount + fee",
        ));
    }
    Ok(())
}

fn validate_order_timestamps(order: &Order) -> Result<(), FieldError> {
    if order.updated_at < order.created_at {
        return Err(field_error(
            "timestamps",
            "updated_at must not precede created_at",
        ));
    }
    Ok(())
}
