use axum::{extract::{Path, State}, http::StatusCode, response::IntoResponse, Extension, Json};
use std::sync::Arc;

use crate::dto::user_dto::{RegisterUserRequest, RoleChangeRequest, UpdateRoleRequest};
use crate::service::user_service::{UserService, UserServiceImpl};
use crate::util::error::HandlerError;
use crate::util::extract::ValidatedJson;
use crate::util::jwt::Claims;

// Register or merge profile
pub async fn upsert_user_handler(
    State(service): State<Arc<UserServiceImpl>>,
    ValidatedJson(payload): ValidatedJson<RegisterUserRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let user = service.upsert(payload.into()).await?;
    Ok(Json(user))
}

// First insert only
pub async fn create_user_handler(
    State(service): State<Arc<UserServiceImpl>>,
    ValidatedJson(payload): ValidatedJson<RegisterUserRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let user = service.create_if_absent(payload.into()).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn list_users_handler(
    State(service): State<Arc<UserServiceImpl>>,
) -> Result<impl IntoResponse, HandlerError> {
    Ok(Json(service.list_all().await?))
}

pub async fn get_user_handler(
    State(service): State<Arc<UserServiceImpl>>,
    Path(email): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    Ok(Json(service.find_by_email(&email).await?))
}

pub async fn update_role_handler(
    State(service): State<Arc<UserServiceImpl>>,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<UpdateRoleRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    Ok(Json(service.update_role(&id, payload.role).await?))
}

pub async fn request_role_handler(
    State(service): State<Arc<UserServiceImpl>>,
    Extension(claims): Extension<Claims>,
    ValidatedJson(payload): ValidatedJson<RoleChangeRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    Ok(Json(service.request_role_change(&claims.email, payload.role).await?))
}

pub async fn approve_role_handler(
    State(service): State<Arc<UserServiceImpl>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    Ok(Json(service.approve_role_change(&id).await?))
}

pub async fn list_role_requests_handler(
    State(service): State<Arc<UserServiceImpl>>,
) -> Result<impl IntoResponse, HandlerError> {
    Ok(Json(service.list_role_requests().await?))
}
