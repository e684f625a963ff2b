pub mod auth_router;
pub mod user_router;
pub mod parcel_router;
pub mod review_router;
pub mod payment_router;
