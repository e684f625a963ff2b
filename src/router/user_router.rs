use axum::{routing::{get, patch, put}, middleware, Router};
use std::sync::Arc;

use crate::handler::user_handler::{
    approve_role_handler,
    create_user_handler,
    get_user_handler,
    list_role_requests_handler,
    list_users_handler,
    request_role_handler,
    update_role_handler,
    upsert_user_handler,
};
use crate::middlewares::auth_middleware::{require_admin, verify_token, AuthState};
use crate::service::user_service::UserServiceImpl;

pub fn user_router(service: Arc<UserServiceImpl>, auth_state: Arc<AuthState>) -> Router {
    // Registration is public
    let public = Router::new()
        .route("/users", put(upsert_user_handler).post(create_user_handler));

    let authenticated = Router::new()
        .route("/users/{email}", get(get_user_handler))
        .route("/users/request-role", patch(request_role_handler))
        .route_layer(middleware::from_fn_with_state(auth_state.clone(), verify_token));

    // Layers run bottom-up: the token is verified before the role is checked
    let admin = Router::new()
        .route("/users", get(list_users_handler))
        .route("/users/role-requests", get(list_role_requests_handler))
        .route("/users/update/{id}", patch(update_role_handler))
        .route("/users/approve-role/{id}", patch(approve_role_handler))
        .route_layer(middleware::from_fn_with_state(auth_state.clone(), require_admin))
        .route_layer(middleware::from_fn_with_state(auth_state, verify_token));

    public
        .merge(authenticated)
        .merge(admin)
        .with_state(service)
}
