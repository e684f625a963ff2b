use axum::{extract::{Path, State}, http::StatusCode, response::IntoResponse, Extension, Json};
use std::sync::Arc;

use crate::dto::review_dto::CreateReviewRequest;
use crate::service::review_service::{ReviewService, ReviewServiceImpl};
use crate::util::error::HandlerError;
use crate::util::extract::ValidatedJson;
use crate::util::jwt::Claims;

pub async fn create_review_handler(
    State(service): State<Arc<ReviewServiceImpl>>,
    Extension(claims): Extension<Claims>,
    ValidatedJson(payload): ValidatedJson<CreateReviewRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let review = service.create(&claims.email, payload).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

pub async fn list_reviews_handler(
    State(service): State<Arc<ReviewServiceImpl>>,
    Path(email): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    Ok(Json(service.list_by_delivery_person(&email).await?))
}

pub async fn list_delivery_men_handler(
    State(service): State<Arc<ReviewServiceImpl>>,
) -> Result<impl IntoResponse, HandlerError> {
    Ok(Json(service.list_delivery_men().await?))
}
