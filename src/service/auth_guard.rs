use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::model::user::{User, UserRole};
use crate::repository::user_repo::UserRepository;
use crate::util::error::ServiceError;
use crate::util::jwt::Claims;

/// Role checks against the identity store.
///
/// Every call reads the stored record, so a role change takes effect on the
/// caller's next request without reissuing the token.
#[derive(Clone)]
pub struct AuthGuard {
    user_repo: Arc<dyn UserRepository>,
}

impl AuthGuard {
    pub fn new(user_repo: Arc<dyn UserRepository>) -> Self {
        AuthGuard { user_repo }
    }

    /// Succeeds with the caller's record when their stored role is `role`.
    #[instrument(skip(self, claims), fields(email = %claims.email, required = %role))]
    pub async fn require_role(
        &self,
        claims: &Claims,
        role: UserRole,
    ) -> Result<User, ServiceError> {
        let user = self.user_repo.find_by_email(&claims.email).await?.ok_or_else(|| {
            warn!("No user record for authenticated identity");
            ServiceError::Forbidden("No user record for this identity".to_string())
        })?;

        if user.role != role {
            warn!(actual = %user.role, "Role check failed");
            return Err(ServiceError::Forbidden(format!("{} role required", role)));
        }
        debug!("Role check passed");
        Ok(user)
    }

    /// Stored role of the caller; `None` when there is no record.
    pub async fn current_role(&self, email: &str) -> Result<Option<UserRole>, ServiceError> {
        Ok(self.user_repo.find_by_email(email).await?.map(|user| user.role))
    }
}
