use axum::{routing::{get, post}, middleware, Router};
use std::sync::Arc;

use crate::handler::review_handler::{
    create_review_handler, list_delivery_men_handler, list_reviews_handler,
};
use crate::middlewares::auth_middleware::{verify_token, AuthState};
use crate::service::review_service::ReviewServiceImpl;

pub fn review_router(service: Arc<ReviewServiceImpl>, auth_state: Arc<AuthState>) -> Router {
    Router::new()
        .route("/reviews", post(create_review_handler))
        .route("/reviews/{email}", get(list_reviews_handler))
        .route("/delivery-men", get(list_delivery_men_handler))
        .route_layer(middleware::from_fn_with_state(auth_state, verify_token))
        .with_state(service)
}
