pub mod auth_handler;
pub mod user_handler;
pub mod parcel_handler;
pub mod review_handler;
pub mod payment_handler;
