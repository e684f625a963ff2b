use axum::{routing::post, middleware, Router};
use std::sync::Arc;

use crate::handler::payment_handler::create_payment_intent_handler;
use crate::middlewares::auth_middleware::{verify_token, AuthState};
use crate::service::payment_service::PaymentServiceImpl;

pub fn payment_router(service: Arc<PaymentServiceImpl>, auth_state: Arc<AuthState>) -> Router {
    Router::new()
        .route("/create-payment-intent", post(create_payment_intent_handler))
        .route_layer(middleware::from_fn_with_state(auth_state, verify_token))
        .with_state(service)
}
