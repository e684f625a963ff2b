use crate::model::review::{RatingSummary, Review};
use crate::model::user::normalize_email;
use crate::repository::mongo::{as_i64, MongoStore, REVIEWS_COLLECTION};
use crate::repository::repository_error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Document};
use futures::stream::TryStreamExt;
use mongodb::options::FindOptions;
use tracing::{error, info, instrument};

#[async_trait]
pub trait ReviewRepository: Send + Sync {
    async fn create(&self, review: Review) -> RepositoryResult<Review>;
    async fn list_by_delivery_person(&self, email: &str) -> RepositoryResult<Vec<Review>>;
    /// Rating totals grouped by reviewed delivery person.
    async fn rating_summaries(&self) -> RepositoryResult<Vec<RatingSummary>>;
}

pub struct MongoReviewRepository {
    collection: mongodb::Collection<Review>,
}

impl MongoReviewRepository {
    pub fn new(store: &MongoStore) -> Self {
        MongoReviewRepository {
            collection: store.database().collection::<Review>(REVIEWS_COLLECTION),
        }
    }
}

fn summary_from_group(group: &Document) -> RepositoryResult<RatingSummary> {
    let deliver_mail = group
        .get_str("_id")
        .map_err(|e| RepositoryError::serialization(format!("Bad review group key: {}", e)))?
        .to_string();
    let total = as_i64(group.get("total"))
        .ok_or_else(|| RepositoryError::serialization("Bad rating total"))?;
    let count = as_i64(group.get("count"))
        .ok_or_else(|| RepositoryError::serialization("Bad rating count"))?;
    Ok(RatingSummary { deliver_mail, total, count })
}

#[async_trait]
impl ReviewRepository for MongoReviewRepository {
    #[instrument(
        skip(self, review),
        fields(deliver_mail = %review.deliver_mail, rating = review.rating)
    )]
    async fn create(&self, mut review: Review) -> RepositoryResult<Review> {
        review.id = Some(ObjectId::new());
        review.deliver_mail = normalize_email(&review.deliver_mail);
        self.collection.insert_one(review.clone(), None).await.map_err(|e| {
            error!("Failed to create review: {}", e);
            RepositoryError::database(format!("Failed to create review: {}", e))
        })?;
        info!("Review created successfully");
        Ok(review)
    }

    #[instrument(skip(self))]
    async fn list_by_delivery_person(&self, email: &str) -> RepositoryResult<Vec<Review>> {
        let options = FindOptions::builder().sort(doc! { "createdAt": -1 }).build();
        let reviews: Vec<Review> = self
            .collection
            .find(doc! { "deliverMail": normalize_email(email) }, options)
            .await?
            .try_collect()
            .await?;
        info!("Fetched {} reviews", reviews.len());
        Ok(reviews)
    }

    #[instrument(skip(self))]
    async fn rating_summaries(&self) -> RepositoryResult<Vec<RatingSummary>> {
        let pipeline = vec![doc! {
            "$group": {
                "_id": "$deliverMail",
                "total": { "$sum": "$rating" },
                "count": { "$sum": 1 },
            }
        }];
        let groups: Vec<Document> = self
            .collection
            .aggregate(pipeline, None)
            .await?
            .try_collect()
            .await?;
        groups.iter().map(summary_from_group).collect()
    }
}
