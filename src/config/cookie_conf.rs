use cookie::Cookie;
use std::env;
use std::str::FromStr;
use time::{Duration, OffsetDateTime};
use tracing::{info, warn};

use crate::config::ConfigError;

/// Name of the cookie carrying the identity token.
pub const TOKEN_COOKIE_NAME: &str = "token";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    None,
    Lax,
    Strict,
}

impl From<SameSite> for cookie::SameSite {
    fn from(same_site: SameSite) -> Self {
        match same_site {
            SameSite::None => cookie::SameSite::None,
            SameSite::Lax => cookie::SameSite::Lax,
            SameSite::Strict => cookie::SameSite::Strict,
        }
    }
}

impl FromStr for SameSite {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(SameSite::None),
            "lax" => Ok(SameSite::Lax),
            "strict" => Ok(SameSite::Strict),
            other => Err(ConfigError::InvalidValue(format!("COOKIE_SAME_SITE: {}", other))),
        }
    }
}

/// Attributes of the identity cookie.
#[derive(Debug, Clone)]
pub struct CookieConfig {
    pub secure: bool,
    pub same_site: SameSite,
}

impl CookieConfig {
    /// Expected environment variables:
    /// - COOKIE_SECURE: `true`/`false` (defaults to true)
    /// - COOKIE_SAME_SITE: `None`, `Lax` or `Strict`
    ///   (defaults to None, the cookie is sent cross-site)
    pub fn from_env() -> Result<Self, ConfigError> {
        info!("Loading cookie configuration from environment variables");
        let secure = match env::var("COOKIE_SECURE") {
            Ok(raw) => raw
                .trim()
                .parse::<bool>()
                .map_err(|_| ConfigError::InvalidValue(format!("COOKIE_SECURE: {}", raw)))?,
            Err(_) => true,
        };
        let same_site = match env::var("COOKIE_SAME_SITE") {
            Ok(raw) => raw.parse::<SameSite>()?,
            Err(_) => SameSite::None,
        };

        let config = CookieConfig { secure, same_site };
        config.validate()?;
        Ok(config)
    }

    /// Browsers drop `SameSite=None` cookies that are not `Secure`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.same_site == SameSite::None && !self.secure {
            warn!("COOKIE_SAME_SITE=None requires COOKIE_SECURE=true");
            return Err(ConfigError::ValidationError(
                "SameSite=None cookies must be Secure".to_string(),
            ));
        }
        Ok(())
    }

    fn base_cookie<'c>(&self, value: &'c str) -> cookie::CookieBuilder<'c> {
        Cookie::build((TOKEN_COOKIE_NAME, value))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(self.same_site.into())
    }

    /// `Set-Cookie` value delivering a freshly issued token.
    pub fn token_cookie(&self, token: &str, max_age_secs: i64) -> String {
        self.base_cookie(token)
            .max_age(Duration::seconds(max_age_secs))
            .build()
            .to_string()
    }

    /// `Set-Cookie` value that makes the browser drop the token.
    pub fn removal_cookie(&self) -> String {
        self.base_cookie("")
            .max_age(Duration::ZERO)
            .expires(OffsetDateTime::UNIX_EPOCH)
            .build()
            .to_string()
    }
}

impl Default for CookieConfig {
    fn default() -> Self {
        CookieConfig {
            secure: true,
            same_site: SameSite::None,
        }
    }
}
