pub mod app_conf;
pub mod mongo_conf;
pub mod jwt_conf;
pub mod cookie_conf;
pub mod payment_conf;
pub mod admin_user_conf;

pub use app_conf::AppConfig;
pub use mongo_conf::MongoConfig;
pub use jwt_conf::JwtConfig;
pub use cookie_conf::{CookieConfig, SameSite};
pub use payment_conf::PaymentConfig;
pub use admin_user_conf::AdminUserConfig;

/// Common configuration error type
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Reads an optional variable and parses it, falling back to `default` when unset.
pub(crate) fn parse_env_or<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr + std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().map_err(|_| {
            tracing::error!("Invalid {} value: {}", key, raw);
            ConfigError::InvalidValue(format!("Invalid {} value: {}", key, raw))
        }),
        Err(_) => {
            tracing::warn!("{} not set, using default: {}", key, default);
            Ok(default)
        }
    }
}
