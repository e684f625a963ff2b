use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use std::sync::Arc;

use crate::dto::parcel_dto::{CreateParcelRequest, ParcelListQuery, UpdateParcelRequest};
use crate::service::parcel_service::{ParcelService, ParcelServiceImpl};
use crate::util::error::HandlerError;
use crate::util::extract::ValidatedJson;
use crate::util::jwt::Claims;

pub async fn create_parcel_handler(
    State(service): State<Arc<ParcelServiceImpl>>,
    Extension(claims): Extension<Claims>,
    ValidatedJson(payload): ValidatedJson<CreateParcelRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let parcel = service.create(&claims.email, payload.into()).await?;
    Ok((StatusCode::CREATED, Json(parcel)))
}

pub async fn list_owner_parcels_handler(
    State(service): State<Arc<ParcelServiceImpl>>,
    Extension(claims): Extension<Claims>,
    Path(email): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    Ok(Json(service.list_by_owner(&claims.email, &email).await?))
}

pub async fn list_all_parcels_handler(
    State(service): State<Arc<ParcelServiceImpl>>,
    Query(query): Query<ParcelListQuery>,
) -> Result<impl IntoResponse, HandlerError> {
    Ok(Json(service.list_all(query.status).await?))
}

pub async fn list_assigned_parcels_handler(
    State(service): State<Arc<ParcelServiceImpl>>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, HandlerError> {
    Ok(Json(service.list_by_assignee(&claims.email).await?))
}

pub async fn update_parcel_handler(
    State(service): State<Arc<ParcelServiceImpl>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<UpdateParcelRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    Ok(Json(service.update_status(&id, payload, &claims.email).await?))
}

pub async fn cancel_parcel_handler(
    State(service): State<Arc<ParcelServiceImpl>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    Ok(Json(service.cancel(&id, &claims.email).await?))
}

pub async fn reconcile_delivery_counts_handler(
    State(service): State<Arc<ParcelServiceImpl>>,
) -> Result<impl IntoResponse, HandlerError> {
    Ok(Json(service.reconcile_delivery_counts().await?))
}
