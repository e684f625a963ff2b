use std::env;
use tracing::{debug, error, info};

use crate::config::{parse_env_or, ConfigError};

/// Payment provider (Stripe) configuration
#[derive(Debug, Clone)]
pub struct PaymentConfig {
    /// Secret API key used as bearer credential
    pub secret_key: String,
    /// Base URL of the provider API
    pub api_base: String,
    /// ISO 4217 code used when a request does not name one
    pub default_currency: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl PaymentConfig {
    /// Expected environment variables:
    /// - STRIPE_SECRET_KEY: provider secret key (required)
    /// - STRIPE_API_BASE: API base URL (defaults to https://api.stripe.com)
    /// - PAYMENT_DEFAULT_CURRENCY: defaults to `usd`
    /// - PAYMENT_TIMEOUT: seconds (defaults to 10)
    pub fn from_env() -> Result<Self, ConfigError> {
        info!("Loading payment configuration from environment variables");

        let secret_key = env::var("STRIPE_SECRET_KEY").map_err(|_| {
            error!("STRIPE_SECRET_KEY environment variable not found");
            ConfigError::EnvVarNotFound("STRIPE_SECRET_KEY".to_string())
        })?;
        let api_base =
            env::var("STRIPE_API_BASE").unwrap_or_else(|_| "https://api.stripe.com".to_string());
        let default_currency = env::var("PAYMENT_DEFAULT_CURRENCY")
            .unwrap_or_else(|_| "usd".to_string())
            .to_ascii_lowercase();
        let timeout_secs = parse_env_or("PAYMENT_TIMEOUT", 10u64)?;
        debug!("Payment provider base: {}, currency: {}", api_base, default_currency);

        let config = PaymentConfig {
            secret_key,
            api_base: api_base.trim_end_matches('/').to_string(),
            default_currency,
            timeout_secs,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secret_key.is_empty() {
            return Err(ConfigError::ValidationError(
                "STRIPE_SECRET_KEY cannot be empty".to_string(),
            ));
        }
        if self.default_currency.len() != 3
            || !self.default_currency.chars().all(|c| c.is_ascii_alphabetic())
        {
            return Err(ConfigError::ValidationError(format!(
                "PAYMENT_DEFAULT_CURRENCY must be a 3-letter code, got {}",
                self.default_currency
            )));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "PAYMENT_TIMEOUT must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        PaymentConfig {
            secret_key: "sk_test_placeholder".to_string(),
            api_base: "https://api.stripe.com".to_string(),
            default_currency: "usd".to_string(),
            timeout_secs: 10,
        }
    }
}
