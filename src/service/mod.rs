pub mod auth_guard;
pub mod user_service;
pub mod parcel_service;
pub mod review_service;
pub mod payment_service;
