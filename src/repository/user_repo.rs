use crate::model::user::{normalize_email, User, UserProfile, UserRole};
use crate::repository::mongo::{MongoStore, USERS_COLLECTION};
use crate::repository::repository_error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use futures::stream::TryStreamExt;
use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};
use tracing::{error, info, instrument};

/// Identity store. Every email argument is normalized before it reaches the collection.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Creates the record or merges the present profile fields into it.
    async fn upsert_by_email(&self, profile: &UserProfile, timestamp: i64)
        -> RepositoryResult<User>;
    /// Fails with `AlreadyExists` when the email is taken.
    async fn insert(&self, user: User) -> RepositoryResult<User>;
    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>>;
    async fn find_by_id(&self, id: &ObjectId) -> RepositoryResult<Option<User>>;
    async fn list_all(&self) -> RepositoryResult<Vec<User>>;
    async fn list_by_role(&self, role: UserRole) -> RepositoryResult<Vec<User>>;
    /// Sets the effective role and drops any pending request. `None` if no record matched.
    async fn set_role(&self, id: &ObjectId, role: UserRole) -> RepositoryResult<Option<User>>;
    /// Parks the user in `Requested` with the wanted role on the side.
    async fn request_role(&self, email: &str, requested: UserRole)
        -> RepositoryResult<Option<User>>;
    async fn increment_delivery_count(&self, email: &str) -> RepositoryResult<()>;
    async fn set_delivery_count(&self, email: &str, count: i64) -> RepositoryResult<()>;
}

pub struct MongoUserRepository {
    collection: mongodb::Collection<User>,
}

impl MongoUserRepository {
    pub fn new(store: &MongoStore) -> Self {
        MongoUserRepository {
            collection: store.database().collection::<User>(USERS_COLLECTION),
        }
    }

    fn after_update() -> FindOneAndUpdateOptions {
        FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build()
    }
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    #[instrument(skip(self, profile), fields(email = %profile.email))]
    async fn upsert_by_email(
        &self,
        profile: &UserProfile,
        timestamp: i64,
    ) -> RepositoryResult<User> {
        let email = normalize_email(&profile.email);
        let mut set = doc! { "timestamp": timestamp };
        if let Some(name) = &profile.name {
            set.insert("name", name.as_str());
        }
        if let Some(photo) = &profile.photo {
            set.insert("photo", photo.as_str());
        }
        if let Some(phone) = &profile.phone {
            set.insert("phone", phone.as_str());
        }
        // Role and counters are only written when the record is created.
        let update = doc! {
            "$set": set,
            "$setOnInsert": { "role": UserRole::User.as_str(), "deliveryCount": 0_i64 },
        };
        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();

        let user = self
            .collection
            .find_one_and_update(doc! { "email": &email }, update, options)
            .await
            .map_err(|e| {
                error!("Failed to upsert user: {}", e);
                RepositoryError::from(e)
            })?;
        info!("User upserted");
        user.ok_or_else(|| {
            RepositoryError::database(format!("Upsert returned no document for {}", email))
        })
    }

    #[instrument(skip(self, user), fields(email = %user.email))]
    async fn insert(&self, mut user: User) -> RepositoryResult<User> {
        user.email = normalize_email(&user.email);
        if self.find_by_email(&user.email).await?.is_some() {
            return Err(RepositoryError::already_exists(format!(
                "User {} already exists",
                user.email
            )));
        }
        user.id = Some(ObjectId::new());
        // A concurrent insert still loses on the unique index (mapped to AlreadyExists).
        self.collection.insert_one(user.clone(), None).await.map_err(|e| {
            error!("Failed to insert user: {}", e);
            RepositoryError::from(e)
        })?;
        info!("User inserted");
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        let filter = doc! { "email": normalize_email(email) };
        let user = self.collection.find_one(filter, None).await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: &ObjectId) -> RepositoryResult<Option<User>> {
        let user = self.collection.find_one(doc! { "_id": id }, None).await?;
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn list_all(&self) -> RepositoryResult<Vec<User>> {
        let users: Vec<User> = self.collection.find(None, None).await?.try_collect().await?;
        info!("Fetched {} users", users.len());
        Ok(users)
    }

    #[instrument(skip(self), fields(role = %role))]
    async fn list_by_role(&self, role: UserRole) -> RepositoryResult<Vec<User>> {
        let users: Vec<User> = self
            .collection
            .find(doc! { "role": role.as_str() }, None)
            .await?
            .try_collect()
            .await?;
        Ok(users)
    }

    #[instrument(skip(self), fields(id = %id, role = %role))]
    async fn set_role(&self, id: &ObjectId, role: UserRole) -> RepositoryResult<Option<User>> {
        let update = doc! {
            "$set": { "role": role.as_str() },
            "$unset": { "requestedRole": "" },
        };
        let user = self
            .collection
            .find_one_and_update(doc! { "_id": id }, update, Self::after_update())
            .await?;
        Ok(user)
    }

    #[instrument(skip(self), fields(email = %email, requested = %requested))]
    async fn request_role(
        &self,
        email: &str,
        requested: UserRole,
    ) -> RepositoryResult<Option<User>> {
        let update = doc! {
            "$set": { "role": UserRole::Requested.as_str(), "requestedRole": requested.as_str() },
        };
        let user = self
            .collection
            .find_one_and_update(
                doc! { "email": normalize_email(email) },
                update,
                Self::after_update(),
            )
            .await?;
        Ok(user)
    }

    #[instrument(skip(self), fields(email = %email))]
    async fn increment_delivery_count(&self, email: &str) -> RepositoryResult<()> {
        let result = self
            .collection
            .update_one(
                doc! { "email": normalize_email(email) },
                doc! { "$inc": { "deliveryCount": 1_i64 } },
                None,
            )
            .await?;
        if result.matched_count == 0 {
            return Err(RepositoryError::not_found(format!("No user found for {}", email)));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(email = %email, count))]
    async fn set_delivery_count(&self, email: &str, count: i64) -> RepositoryResult<()> {
        let result = self
            .collection
            .update_one(
                doc! { "email": normalize_email(email) },
                doc! { "$set": { "deliveryCount": count } },
                None,
            )
            .await?;
        if result.matched_count == 0 {
            return Err(RepositoryError::not_found(format!("No user found for {}", email)));
        }
        Ok(())
    }
}
