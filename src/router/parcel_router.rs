use axum::{routing::{get, patch, post}, middleware, Router};
use std::sync::Arc;

use crate::handler::parcel_handler::{
    cancel_parcel_handler,
    create_parcel_handler,
    list_all_parcels_handler,
    list_assigned_parcels_handler,
    list_owner_parcels_handler,
    reconcile_delivery_counts_handler,
    update_parcel_handler,
};
use crate::middlewares::auth_middleware::{
    require_admin, require_delivery_man, verify_token, AuthState,
};
use crate::service::parcel_service::ParcelServiceImpl;

pub fn parcel_router(service: Arc<ParcelServiceImpl>, auth_state: Arc<AuthState>) -> Router {
    // Ownership and assignment are checked per parcel by the service
    let authenticated = Router::new()
        .route("/parcels", post(create_parcel_handler))
        .route("/parcels/{email}", get(list_owner_parcels_handler))
        .route("/parcels/update/{id}", patch(update_parcel_handler))
        .route("/parcels/cancel/{id}", patch(cancel_parcel_handler))
        .route_layer(middleware::from_fn_with_state(auth_state.clone(), verify_token));

    let delivery = Router::new()
        .route("/parcels-assigned", get(list_assigned_parcels_handler))
        .route_layer(middleware::from_fn_with_state(auth_state.clone(), require_delivery_man))
        .route_layer(middleware::from_fn_with_state(auth_state.clone(), verify_token));

    let admin = Router::new()
        .route("/parcels", get(list_all_parcels_handler))
        .route("/admin/reconcile-delivery-counts", post(reconcile_delivery_counts_handler))
        .route_layer(middleware::from_fn_with_state(auth_state.clone(), require_admin))
        .route_layer(middleware::from_fn_with_state(auth_state, verify_token));

    authenticated
        .merge(delivery)
        .merge(admin)
        .with_state(service)
}
