use axum::{extract::State, http::header, response::IntoResponse, Json};
use std::sync::Arc;
use tracing::info;

use crate::config::CookieConfig;
use crate::dto::user_dto::{IssueTokenRequest, MessageResponse};
use crate::util::error::{HandlerError, ServiceError};
use crate::util::extract::ValidatedJson;
use crate::util::jwt::{JwtTokenUtils, TokenIdentity};

pub struct AuthHandlerState {
    pub jwt_utils: Arc<dyn JwtTokenUtils>,
    pub cookie_config: CookieConfig,
}

// Issue token
pub async fn issue_token_handler(
    State(state): State<Arc<AuthHandlerState>>,
    ValidatedJson(payload): ValidatedJson<IssueTokenRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let identity = TokenIdentity::from(payload);
    let token = state.jwt_utils.issue_token(&identity).map_err(ServiceError::from)?;
    let cookie = state
        .cookie_config
        .token_cookie(&token, state.jwt_utils.token_lifetime_secs());
    info!("Identity token issued");
    Ok(([(header::SET_COOKIE, cookie)], Json(MessageResponse::ok("Token issued"))))
}

// Logout
pub async fn logout_handler(State(state): State<Arc<AuthHandlerState>>) -> impl IntoResponse {
    (
        [(header::SET_COOKIE, state.cookie_config.removal_cookie())],
        Json(MessageResponse::ok("Logged out")),
    )
}
