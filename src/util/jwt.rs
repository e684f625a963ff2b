use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::model::user::normalize_email;

/// JWT token claims structure
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    /// Subject (normalized user email)
    pub sub: String,
    /// User email
    pub email: String,
    /// Display name, when the client supplied one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
    /// JWT ID (unique identifier for the token)
    pub jti: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

/// The subset of user fields a token is issued for.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenIdentity {
    pub email: String,
    pub name: Option<String>,
}

/// Error types for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Failed to encode JWT token: {0}")]
    EncodingFailed(String),
    #[error("Failed to decode JWT token: {0}")]
    DecodingFailed(String),
    #[error("Token has expired")]
    TokenExpired,
    #[error("Invalid token format")]
    InvalidToken,
    #[error("Missing token")]
    MissingToken,
}

pub trait JwtTokenUtils: Send + Sync {
    fn issue_token(&self, identity: &TokenIdentity) -> Result<String, JwtError>;
    fn validate_token(&self, token: &str) -> Result<Claims, JwtError>;
    /// Lifetime of every issued token, in seconds.
    fn token_lifetime_secs(&self) -> i64;
}

#[derive(Debug, Clone)]
pub struct JwtTokenUtilsImpl {
    pub jwt_config: JwtConfig,
}

impl JwtTokenUtilsImpl {
    pub fn new(jwt_config: JwtConfig) -> Self {
        JwtTokenUtilsImpl { jwt_config }
    }

    /// Create JWT utils from environment variables
    pub fn from_env() -> Result<Self, crate::config::ConfigError> {
        let jwt_config = JwtConfig::from_env()?;
        Ok(JwtTokenUtilsImpl::new(jwt_config))
    }

    /// Issues a token with a custom lifetime. Negative values produce an already expired token.
    pub fn issue_token_expiring_in(
        &self,
        identity: &TokenIdentity,
        expires_in_minutes: i64,
    ) -> Result<String, JwtError> {
        let email = normalize_email(&identity.email);
        if email.is_empty() {
            error!("Refusing to issue a token without an email");
            return Err(JwtError::EncodingFailed("email claim is required".to_string()));
        }
        debug!("Generating token for: {}", email);

        let now = Utc::now();
        let expiration = now + Duration::minutes(expires_in_minutes);
        let claims = Claims {
            sub: email.clone(),
            email,
            name: identity.name.clone(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            jti: Uuid::new_v4().to_string(),
            iss: self.jwt_config.jwt_issuer.clone(),
        };

        let header = Header::new(Algorithm::HS256);
        let encoding_key = EncodingKey::from_secret(self.jwt_config.jwt_secret.as_bytes());

        match encode(&header, &claims, &encoding_key) {
            Ok(token) => {
                info!("Successfully generated token for: {}", claims.sub);
                Ok(token)
            }
            Err(err) => {
                error!("Failed to encode JWT token: {}", err);
                Err(JwtError::EncodingFailed(err.to_string()))
            }
        }
    }
}

impl JwtTokenUtils for JwtTokenUtilsImpl {
    fn issue_token(&self, identity: &TokenIdentity) -> Result<String, JwtError> {
        self.issue_token_expiring_in(identity, self.jwt_config.token_expiration)
    }

    fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        debug!("Validating JWT token");

        let decoding_key = DecodingKey::from_secret(self.jwt_config.jwt_secret.as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        if let Some(issuer) = &self.jwt_config.jwt_issuer {
            validation.set_issuer(&[issuer]);
        }

        match decode::<Claims>(token, &decoding_key, &validation) {
            Ok(token_data) => {
                debug!("Token validation successful for: {}", token_data.claims.sub);
                Ok(token_data.claims)
            }
            Err(err) => match err.kind() {
                ErrorKind::ExpiredSignature => {
                    warn!("Token has expired");
                    Err(JwtError::TokenExpired)
                }
                _ => {
                    warn!("Failed to decode JWT token: {}", err);
                    Err(JwtError::DecodingFailed(err.to_string()))
                }
            },
        }
    }

    fn token_lifetime_secs(&self) -> i64 {
        self.jwt_config.token_expiration_secs()
    }
}
