use crate::model::parcel::{Parcel, ParcelChanges, ParcelStatus};
use crate::model::user::normalize_email;
use crate::repository::mongo::{as_i64, MongoStore, PARCELS_COLLECTION};
use crate::repository::repository_error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Document};
use futures::stream::TryStreamExt;
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument};
use tracing::{error, info, instrument};

#[async_trait]
pub trait ParcelRepository: Send + Sync {
    async fn create(&self, parcel: Parcel) -> RepositoryResult<Parcel>;
    async fn get_by_id(&self, id: &ObjectId) -> RepositoryResult<Option<Parcel>>;
    async fn list_by_owner(&self, email: &str) -> RepositoryResult<Vec<Parcel>>;
    async fn list_by_assignee(&self, email: &str) -> RepositoryResult<Vec<Parcel>>;
    async fn list_all(&self, status: Option<ParcelStatus>) -> RepositoryResult<Vec<Parcel>>;
    /// Applies `changes` only while the stored status still equals `expected`.
    /// Returns `None` when nothing matched (missing document or status moved on).
    async fn update_if_status(
        &self,
        id: &ObjectId,
        expected: ParcelStatus,
        changes: &ParcelChanges,
    ) -> RepositoryResult<Option<Parcel>>;
    /// Number of delivered parcels per deliverer email.
    async fn delivered_counts(&self) -> RepositoryResult<Vec<(String, i64)>>;
}

pub struct MongoParcelRepository {
    collection: mongodb::Collection<Parcel>,
}

impl MongoParcelRepository {
    pub fn new(store: &MongoStore) -> Self {
        MongoParcelRepository {
            collection: store.database().collection::<Parcel>(PARCELS_COLLECTION),
        }
    }

    async fn find_many(&self, filter: Document) -> RepositoryResult<Vec<Parcel>> {
        let options = FindOptions::builder().sort(doc! { "bookingDate": -1 }).build();
        let parcels: Vec<Parcel> = self
            .collection
            .find(filter, options)
            .await
            .map_err(|e| {
                error!("Failed to list parcels: {}", e);
                RepositoryError::from(e)
            })?
            .try_collect()
            .await?;
        info!("Fetched {} parcels", parcels.len());
        Ok(parcels)
    }
}

#[async_trait]
impl ParcelRepository for MongoParcelRepository {
    #[instrument(skip(self, parcel), fields(owner = %parcel.email))]
    async fn create(&self, mut parcel: Parcel) -> RepositoryResult<Parcel> {
        parcel.id = Some(ObjectId::new());
        parcel.email = normalize_email(&parcel.email);
        match self.collection.insert_one(parcel.clone(), None).await {
            Ok(_) => {
                info!("Parcel created successfully");
                Ok(parcel)
            }
            Err(e) => {
                error!("Failed to create parcel: {}", e);
                Err(RepositoryError::database(format!("Failed to create parcel: {}", e)))
            }
        }
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn get_by_id(&self, id: &ObjectId) -> RepositoryResult<Option<Parcel>> {
        let parcel = self.collection.find_one(doc! { "_id": id }, None).await?;
        Ok(parcel)
    }

    #[instrument(skip(self))]
    async fn list_by_owner(&self, email: &str) -> RepositoryResult<Vec<Parcel>> {
        self.find_many(doc! { "email": normalize_email(email) }).await
    }

    #[instrument(skip(self))]
    async fn list_by_assignee(&self, email: &str) -> RepositoryResult<Vec<Parcel>> {
        self.find_many(doc! { "assigned": normalize_email(email) }).await
    }

    #[instrument(skip(self))]
    async fn list_all(&self, status: Option<ParcelStatus>) -> RepositoryResult<Vec<Parcel>> {
        let filter = match status {
            Some(status) => doc! { "status": status.as_str() },
            None => Document::new(),
        };
        self.find_many(filter).await
    }

    #[instrument(skip(self, changes), fields(id = %id, expected = %expected))]
    async fn update_if_status(
        &self,
        id: &ObjectId,
        expected: ParcelStatus,
        changes: &ParcelChanges,
    ) -> RepositoryResult<Option<Parcel>> {
        let set = bson::to_document(changes)?;
        let filter = doc! { "_id": id, "status": expected.as_str() };
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        let updated = self
            .collection
            .find_one_and_update(filter, doc! { "$set": set }, options)
            .await
            .map_err(|e| {
                error!("Failed to update parcel: {}", e);
                RepositoryError::from(e)
            })?;
        match &updated {
            Some(parcel) => info!(status = %parcel.status, "Parcel updated"),
            None => info!("No parcel matched id and expected status"),
        }
        Ok(updated)
    }

    #[instrument(skip(self))]
    async fn delivered_counts(&self) -> RepositoryResult<Vec<(String, i64)>> {
        let pipeline = vec![
            doc! { "$match": {
                "status": ParcelStatus::Delivered.as_str(),
                "deliveredBy": { "$type": "string" },
            } },
            doc! { "$group": { "_id": "$deliveredBy", "count": { "$sum": 1 } } },
        ];
        let groups: Vec<Document> = self
            .collection
            .aggregate(pipeline, None)
            .await?
            .try_collect()
            .await?;
        groups
            .iter()
            .map(|group| {
                let email = group
                    .get_str("_id")
                    .map_err(|e| RepositoryError::serialization(format!("Bad group key: {}", e)))?;
                let count = as_i64(group.get("count"))
                    .ok_or_else(|| RepositoryError::serialization("Bad delivered count"))?;
                Ok((email.to_string(), count))
            })
            .collect()
    }
}
