use axum::{routing::{get, post}, Router};
use std::sync::Arc;

use crate::handler::auth_handler::{issue_token_handler, logout_handler, AuthHandlerState};

pub fn auth_router(state: Arc<AuthHandlerState>) -> Router {
    Router::new()
        .route("/jwt", post(issue_token_handler))
        .route("/logout", get(logout_handler).post(logout_handler))
        .with_state(state)
}
