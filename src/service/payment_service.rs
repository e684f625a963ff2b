use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

use crate::config::PaymentConfig;
use crate::util::error::ServiceError;

#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Provider rejected the request ({status}): {message}")]
    Provider { status: u16, message: String },
    #[error("Provider response had no client secret")]
    MissingClientSecret,
}

impl From<PaymentError> for ServiceError {
    fn from(err: PaymentError) -> Self {
        ServiceError::ProviderError(err.to_string())
    }
}

/// External payment provider.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Creates a charge intent and returns its client secret.
    async fn create_intent(&self, amount_minor: i64, currency: &str)
        -> Result<String, PaymentError>;
}

/// Stripe Payment Intents over its form-encoded REST API.
pub struct StripePaymentGateway {
    http_client: reqwest::Client,
    config: PaymentConfig,
}

#[derive(Debug, Deserialize)]
struct StripePaymentIntent {
    id: String,
    client_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
}

impl StripePaymentGateway {
    pub fn new(config: PaymentConfig) -> Result<Self, PaymentError> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.timeout_secs))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(StripePaymentGateway { http_client, config })
    }
}

#[async_trait]
impl PaymentGateway for StripePaymentGateway {
    #[instrument(skip(self))]
    async fn create_intent(
        &self,
        amount_minor: i64,
        currency: &str,
    ) -> Result<String, PaymentError> {
        let url = format!("{}/v1/payment_intents", self.config.api_base);
        let amount = amount_minor.to_string();
        let form = [
            ("amount", amount.as_str()),
            ("currency", currency),
            ("payment_method_types[]", "card"),
        ];

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.config.secret_key)
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<StripeErrorBody>().await {
                Ok(body) => body.error.message.unwrap_or_else(|| "unknown error".to_string()),
                Err(_) => "unreadable error body".to_string(),
            };
            error!(status = status.as_u16(), "Payment provider error: {}", message);
            return Err(PaymentError::Provider { status: status.as_u16(), message });
        }

        let intent: StripePaymentIntent = response.json().await?;
        info!(intent_id = %intent.id, "Payment intent created");
        intent.client_secret.ok_or(PaymentError::MissingClientSecret)
    }
}

/// Converts a major-unit amount to minor units (x100) without rounding.
///
/// Missing amounts, fractions of a minor unit and results below 1 are rejected.
pub fn to_minor_units(amount: Option<Decimal>) -> Result<i64, ServiceError> {
    let amount =
        amount.ok_or_else(|| ServiceError::InvalidAmount("price is required".to_string()))?;
    let minor = amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .ok_or_else(|| ServiceError::InvalidAmount(format!("price {} is too large", amount)))?;
    if !minor.fract().is_zero() {
        return Err(ServiceError::InvalidAmount(format!(
            "price {} is not a whole number of minor units",
            amount
        )));
    }
    if minor < Decimal::ONE {
        return Err(ServiceError::InvalidAmount(format!(
            "price {} is below the minimum charge",
            amount
        )));
    }
    minor
        .to_i64()
        .ok_or_else(|| ServiceError::InvalidAmount(format!("price {} is too large", amount)))
}

/// Lowercased 3-letter currency code, or `default` when none was given.
pub fn normalize_currency(currency: Option<&str>, default: &str) -> Result<String, ServiceError> {
    let code = currency.map(str::trim).unwrap_or(default).to_ascii_lowercase();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ServiceError::InvalidInput(format!("Invalid currency code: {}", code)));
    }
    Ok(code)
}

#[async_trait]
pub trait PaymentService: Send + Sync {
    async fn create_intent(
        &self,
        amount: Option<Decimal>,
        currency: Option<String>,
    ) -> Result<String, ServiceError>;
}

pub struct PaymentServiceImpl {
    pub gateway: Arc<dyn PaymentGateway>,
    pub default_currency: String,
}

impl PaymentServiceImpl {
    pub fn new(gateway: Arc<dyn PaymentGateway>, default_currency: String) -> Self {
        Self { gateway, default_currency }
    }
}

#[async_trait]
impl PaymentService for PaymentServiceImpl {
    #[instrument(skip(self), fields(amount = ?amount))]
    async fn create_intent(
        &self,
        amount: Option<Decimal>,
        currency: Option<String>,
    ) -> Result<String, ServiceError> {
        let amount_minor = to_minor_units(amount).map_err(|e| {
            warn!("Rejected payment amount: {}", e);
            e
        })?;
        let currency = normalize_currency(currency.as_deref(), &self.default_currency)?;

        let client_secret = self.gateway.create_intent(amount_minor, &currency).await?;
        if client_secret.is_empty() {
            return Err(ServiceError::ProviderError("Empty client secret".to_string()));
        }
        info!(amount_minor, currency = %currency, "Payment intent ready");
        Ok(client_secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Option<Decimal> {
        Some(Decimal::from_str(s).unwrap())
    }

    #[test]
    fn test_minor_units_conversion() {
        assert_eq!(to_minor_units(dec("10")).unwrap(), 1000);
        assert_eq!(to_minor_units(dec("19.99")).unwrap(), 1999);
        assert_eq!(to_minor_units(dec("0.5")).unwrap(), 50);
        assert_eq!(to_minor_units(dec("0.01")).unwrap(), 1);
    }

    #[test]
    fn test_invalid_amounts() {
        for amount in [None, dec("0"), dec("-3"), dec("0.005"), dec("1.001")] {
            assert!(
                matches!(to_minor_units(amount), Err(ServiceError::InvalidAmount(_))),
                "accepted {:?}",
                amount
            );
        }
    }

    #[test]
    fn test_currency_normalization() {
        assert_eq!(normalize_currency(None, "usd").unwrap(), "usd");
        assert_eq!(normalize_currency(Some(" EUR "), "usd").unwrap(), "eur");
        assert!(normalize_currency(Some("dollars"), "usd").is_err());
        assert!(normalize_currency(Some("u5d"), "usd").is_err());
    }
}
