use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::dto::review_dto::{CreateReviewRequest, DeliveryManSummary};
use crate::model::review::{average_rating, Review};
use crate::model::user::{normalize_email, UserRole};
use crate::repository::review_repo::ReviewRepository;
use crate::repository::user_repo::UserRepository;
use crate::util::error::ServiceError;

#[async_trait]
pub trait ReviewService: Send + Sync {
    async fn create(
        &self,
        reviewer_email: &str,
        request: CreateReviewRequest,
    ) -> Result<Review, ServiceError>;
    async fn list_by_delivery_person(&self, email: &str) -> Result<Vec<Review>, ServiceError>;
    async fn average_rating(&self, email: &str) -> Result<f64, ServiceError>;
    /// Every delivery person with their rating, busiest first.
    async fn list_delivery_men(&self) -> Result<Vec<DeliveryManSummary>, ServiceError>;
}

pub struct ReviewServiceImpl {
    pub review_repo: Arc<dyn ReviewRepository>,
    pub user_repo: Arc<dyn UserRepository>,
}

impl ReviewServiceImpl {
    pub fn new(
        review_repo: Arc<dyn ReviewRepository>,
        user_repo: Arc<dyn UserRepository>,
    ) -> Self {
        Self { review_repo, user_repo }
    }
}

#[async_trait]
impl ReviewService for ReviewServiceImpl {
    #[instrument(
        skip(self, request),
        fields(reviewer = %reviewer_email, deliver_mail = %request.deliver_mail)
    )]
    async fn create(
        &self,
        reviewer_email: &str,
        request: CreateReviewRequest,
    ) -> Result<Review, ServiceError> {
        if !(1..=5).contains(&request.rating) {
            return Err(ServiceError::InvalidInput("rating must be between 1 and 5".to_string()));
        }
        let deliver_mail = normalize_email(&request.deliver_mail);
        let target = self.user_repo.find_by_email(&deliver_mail).await?;
        if !matches!(&target, Some(user) if user.role == UserRole::DeliveryMan) {
            warn!("Review target is not a delivery person");
            return Err(ServiceError::InvalidInput(format!(
                "{} is not a delivery person",
                deliver_mail
            )));
        }

        let review = Review {
            id: None,
            deliver_mail,
            rating: request.rating,
            feedback: request.feedback,
            reviewer_email: normalize_email(reviewer_email),
            reviewer_name: request.reviewer_name,
            reviewer_photo: request.reviewer_photo,
            parcel_id: request.parcel_id,
            created_at: Utc::now().to_rfc3339(),
        };
        let created = self.review_repo.create(review).await?;
        info!("Review submitted");
        Ok(created)
    }

    #[instrument(skip(self))]
    async fn list_by_delivery_person(&self, email: &str) -> Result<Vec<Review>, ServiceError> {
        Ok(self.review_repo.list_by_delivery_person(email).await?)
    }

    #[instrument(skip(self))]
    async fn average_rating(&self, email: &str) -> Result<f64, ServiceError> {
        let reviews = self.review_repo.list_by_delivery_person(email).await?;
        Ok(average_rating(&reviews))
    }

    #[instrument(skip(self))]
    async fn list_delivery_men(&self) -> Result<Vec<DeliveryManSummary>, ServiceError> {
        let summaries: HashMap<String, _> = self
            .review_repo
            .rating_summaries()
            .await?
            .into_iter()
            .map(|summary| (summary.deliver_mail.clone(), summary))
            .collect();

        let mut delivery_men: Vec<DeliveryManSummary> = self
            .user_repo
            .list_by_role(UserRole::DeliveryMan)
            .await?
            .into_iter()
            .map(|user| match summaries.get(&user.email) {
                Some(summary) => {
                    let (average, count) = (summary.average(), summary.count);
                    DeliveryManSummary::new(user, average, count)
                }
                None => DeliveryManSummary::new(user, 0.0, 0),
            })
            .collect();
        delivery_men.sort_by(|a, b| {
            b.delivery_count
                .cmp(&a.delivery_count)
                .then_with(|| a.email.cmp(&b.email))
        });
        info!("Listed {} delivery men", delivery_men.len());
        Ok(delivery_men)
    }
}
