use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, Request};
use axum::middleware::Next;
use axum::response::Response;
use headers::authorization::Bearer;
use headers::{Authorization, Cookie, HeaderMapExt};
use std::sync::Arc;
use tracing::debug;

use crate::config::cookie_conf::TOKEN_COOKIE_NAME;
use crate::model::user::UserRole;
use crate::service::auth_guard::AuthGuard;
use crate::util::error::HandlerError;
use crate::util::jwt::{Claims, JwtError, JwtTokenUtils};

pub struct AuthState {
    pub jwt_utils: Arc<dyn JwtTokenUtils>,
    pub guard: AuthGuard,
}

/// The `token` cookie wins; an `Authorization: Bearer` header is accepted as a fallback.
pub fn find_token(headers: &HeaderMap) -> Result<String, JwtError> {
    let from_cookie = headers
        .typed_get::<Cookie>()
        .and_then(|cookies| cookies.get(TOKEN_COOKIE_NAME).map(str::to_string))
        .filter(|token| !token.is_empty());
    if let Some(token) = from_cookie {
        return Ok(token);
    }
    headers
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| auth.token().to_string())
        .filter(|token| !token.is_empty())
        .ok_or(JwtError::MissingToken)
}

/// Verifies the identity token and stores its [`Claims`] in the request extensions.
pub async fn verify_token(
    State(state): State<Arc<AuthState>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, HandlerError> {
    let token = find_token(req.headers()).map_err(|e| {
        debug!("No identity token on request");
        HandlerError::unauthorized(e.to_string())
    })?;

    let claims = state
        .jwt_utils
        .validate_token(&token)
        .map_err(|e| HandlerError::unauthorized(e.to_string()))?;
    debug!(email = %claims.email, "Identity verified");

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

async fn require_role(
    state: &AuthState,
    req: Request<Body>,
    next: Next,
    role: UserRole,
) -> Result<Response, HandlerError> {
    let claims = req
        .extensions()
        .get::<Claims>()
        .ok_or_else(|| HandlerError::unauthorized("Missing identity token"))?;
    state.guard.require_role(claims, role).await?;
    Ok(next.run(req).await)
}

/// Must run after [`verify_token`].
pub async fn require_admin(
    State(state): State<Arc<AuthState>>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, HandlerError> {
    require_role(&state, req, next, UserRole::Admin).await
}

/// Must run after [`verify_token`].
pub async fn require_delivery_man(
    State(state): State<Arc<AuthState>>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, HandlerError> {
    require_role(&state, req, next, UserRole::DeliveryMan).await
}
