mod common;

use common::TestContext;
use parcel_backend::dto::review_dto::CreateReviewRequest;
use parcel_backend::model::user::UserRole;
use parcel_backend::repository::user_repo::UserRepository;
use parcel_backend::service::review_service::ReviewService;
use parcel_backend::util::error::ServiceError;

fn review_for(deliver_mail: &str, rating: u8) -> CreateReviewRequest {
    CreateReviewRequest {
        deliver_mail: deliver_mail.to_string(),
        rating,
        feedback: "On time".to_string(),
        parcel_id: None,
        reviewer_name: Some("Reviewer".to_string()),
        reviewer_photo: None,
    }
}

#[tokio::test]
async fn test_average_rating_of_unreviewed_is_zero() {
    let ctx = TestContext::new();
    ctx.users.seed("d@x.com", UserRole::DeliveryMan);
    let average = ctx.services.review_service.average_rating("d@x.com").await.unwrap();
    assert_eq!(average, 0.0);
}

#[tokio::test]
async fn test_average_rating() {
    let ctx = TestContext::new();
    ctx.users.seed("d@x.com", UserRole::DeliveryMan);
    let service = &ctx.services.review_service;

    service.create("u@x.com", review_for("d@x.com", 3)).await.unwrap();
    service.create("u@x.com", review_for("D@x.com", 5)).await.unwrap();

    assert_eq!(service.average_rating("d@x.com").await.unwrap(), 4.0);
    assert_eq!(service.list_by_delivery_person("d@x.com").await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_reviewer_comes_from_caller() {
    let ctx = TestContext::new();
    ctx.users.seed("d@x.com", UserRole::DeliveryMan);
    let review = ctx
        .services
        .review_service
        .create("Caller@X.com", review_for("d@x.com", 4))
        .await
        .unwrap();
    assert_eq!(review.reviewer_email, "caller@x.com");
    assert_eq!(review.deliver_mail, "d@x.com");
    assert!(review.id.is_some());
}

#[tokio::test]
async fn test_review_target_must_be_delivery_man() {
    let ctx = TestContext::new();
    ctx.users.seed("u@x.com", UserRole::User);
    let service = &ctx.services.review_service;

    let err = service.create("a@x.com", review_for("u@x.com", 5)).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));
    let err = service.create("a@x.com", review_for("ghost@x.com", 5)).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));
}

#[tokio::test]
async fn test_rating_bounds_enforced() {
    let ctx = TestContext::new();
    ctx.users.seed("d@x.com", UserRole::DeliveryMan);
    let err = ctx
        .services
        .review_service
        .create("u@x.com", review_for("d@x.com", 6))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));
}

#[tokio::test]
async fn test_list_delivery_men_sorted_with_ratings() {
    let ctx = TestContext::new();
    ctx.users.seed("busy@x.com", UserRole::DeliveryMan);
    ctx.users.seed("new@x.com", UserRole::DeliveryMan);
    ctx.users.seed("u@x.com", UserRole::User);
    ctx.users.set_delivery_count("busy@x.com", 7).await.unwrap();
    let service = &ctx.services.review_service;
    for rating in [4, 4, 5] {
        service.create("u@x.com", review_for("busy@x.com", rating)).await.unwrap();
    }

    let men = service.list_delivery_men().await.unwrap();
    assert_eq!(men.len(), 2);
    assert_eq!(men[0].email, "busy@x.com");
    assert_eq!(men[0].delivery_count, 7);
    assert_eq!(men[0].average_rating, 4.3);
    assert_eq!(men[0].review_count, 3);
    assert_eq!(men[1].email, "new@x.com");
    assert_eq!(men[1].average_rating, 0.0);
    assert_eq!(men[1].review_count, 0);
}
