use async_trait::async_trait;
use bson::oid::ObjectId;
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::model::user::{normalize_email, User, UserProfile, UserRole};
use crate::repository::user_repo::UserRepository;
use crate::util::error::ServiceError;

#[async_trait]
pub trait UserService: Send + Sync {
    /// Registration and social login: creates the record or merges the profile in.
    async fn upsert(&self, profile: UserProfile) -> Result<User, ServiceError>;
    async fn create_if_absent(&self, profile: UserProfile) -> Result<User, ServiceError>;
    async fn find_by_email(&self, email: &str) -> Result<User, ServiceError>;
    async fn list_all(&self) -> Result<Vec<User>, ServiceError>;
    /// Immediate role change by an administrator.
    async fn update_role(&self, id: &str, role: Option<UserRole>) -> Result<User, ServiceError>;
    async fn request_role_change(&self, email: &str, role: UserRole) -> Result<User, ServiceError>;
    async fn approve_role_change(&self, id: &str) -> Result<User, ServiceError>;
    async fn list_role_requests(&self) -> Result<Vec<User>, ServiceError>;
}

pub struct UserServiceImpl {
    pub user_repo: Arc<dyn UserRepository>,
}

impl UserServiceImpl {
    pub fn new(user_repo: Arc<dyn UserRepository>) -> Self {
        Self { user_repo }
    }

    /// Creates the configured administrator unless a user with that email already exists.
    #[instrument(skip(self, name), fields(email = %email))]
    pub async fn seed_admin(&self, email: &str, name: Option<String>) -> Result<(), ServiceError> {
        if self.user_repo.find_by_email(email).await?.is_some() {
            info!("Admin user already exists, skipping creation.");
            return Ok(());
        }
        let profile = UserProfile { email: email.to_string(), name, photo: None, phone: None };
        let mut admin = User::from_profile(profile, Utc::now().timestamp_millis());
        admin.role = UserRole::Admin;
        self.user_repo.insert(admin).await?;
        info!("First admin user created.");
        Ok(())
    }
}

fn parse_id(id: &str) -> Result<ObjectId, ServiceError> {
    ObjectId::parse_str(id)
        .map_err(|_| ServiceError::InvalidInput(format!("Invalid user id: {}", id)))
}

fn validated_profile(mut profile: UserProfile) -> Result<UserProfile, ServiceError> {
    profile.email = normalize_email(&profile.email);
    if profile.email.is_empty() {
        return Err(ServiceError::InvalidInput("email is required".to_string()));
    }
    Ok(profile)
}

#[async_trait]
impl UserService for UserServiceImpl {
    #[instrument(skip(self, profile), fields(email = %profile.email))]
    async fn upsert(&self, profile: UserProfile) -> Result<User, ServiceError> {
        let profile = validated_profile(profile)?;
        let user = self
            .user_repo
            .upsert_by_email(&profile, Utc::now().timestamp_millis())
            .await
            .map_err(|e| {
                error!("Failed to upsert user: {e}");
                ServiceError::from(e)
            })?;
        info!("User upserted");
        Ok(user)
    }

    #[instrument(skip(self, profile), fields(email = %profile.email))]
    async fn create_if_absent(&self, profile: UserProfile) -> Result<User, ServiceError> {
        let profile = validated_profile(profile)?;
        let user = User::from_profile(profile, Utc::now().timestamp_millis());
        let inserted = self.user_repo.insert(user).await;
        match &inserted {
            Ok(_) => info!("User created"),
            Err(e) => warn!("User not created: {e}"),
        }
        Ok(inserted?)
    }

    #[instrument(skip(self))]
    async fn find_by_email(&self, email: &str) -> Result<User, ServiceError> {
        self.user_repo
            .find_by_email(email)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("No user with email {}", normalize_email(email)))
            })
    }

    #[instrument(skip(self))]
    async fn list_all(&self) -> Result<Vec<User>, ServiceError> {
        Ok(self.user_repo.list_all().await?)
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn update_role(&self, id: &str, role: Option<UserRole>) -> Result<User, ServiceError> {
        let role = role.ok_or_else(|| ServiceError::InvalidInput("role is required".to_string()))?;
        if role == UserRole::Requested {
            return Err(ServiceError::InvalidInput(
                "Requested is not an assignable role".to_string(),
            ));
        }
        let object_id = parse_id(id)?;
        let user = self
            .user_repo
            .set_role(&object_id, role)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("No user with id {}", id)))?;
        info!(role = %user.role, "User role updated");
        Ok(user)
    }

    #[instrument(skip(self), fields(requested = %role))]
    async fn request_role_change(&self, email: &str, role: UserRole) -> Result<User, ServiceError> {
        if role == UserRole::Requested {
            return Err(ServiceError::InvalidInput(
                "Requested is not an assignable role".to_string(),
            ));
        }
        let user = self
            .user_repo
            .request_role(email, role)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("No user with email {}", normalize_email(email)))
            })?;
        info!("Role change requested");
        Ok(user)
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn approve_role_change(&self, id: &str) -> Result<User, ServiceError> {
        let object_id = parse_id(id)?;
        let user = self
            .user_repo
            .find_by_id(&object_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("No user with id {}", id)))?;

        let requested = match (user.role, user.requested_role) {
            (UserRole::Requested, Some(requested)) => requested,
            _ => {
                return Err(ServiceError::InvalidInput(format!(
                    "User {} has no pending role request",
                    user.email
                )))
            }
        };

        let approved = self
            .user_repo
            .set_role(&object_id, requested)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("No user with id {}", id)))?;
        info!(role = %approved.role, "Role change approved");
        Ok(approved)
    }

    #[instrument(skip(self))]
    async fn list_role_requests(&self) -> Result<Vec<User>, ServiceError> {
        Ok(self.user_repo.list_by_role(UserRole::Requested).await?)
    }
}
