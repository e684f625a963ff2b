use std::env;
use serde::{Serialize, Deserialize};
use crate::config::ConfigError;

/// Identity of the administrator seeded at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminUserConfig {
    pub email: String,
    pub name: Option<String>,
}

impl AdminUserConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(AdminUserConfig {
            email: env::var("ADMIN_EMAIL")
                .map_err(|_| ConfigError::EnvVarNotFound("ADMIN_EMAIL".to_string()))?,
            name: env::var("ADMIN_NAME").ok(),
        })
    }
}
