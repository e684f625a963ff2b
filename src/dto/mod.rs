pub mod user_dto;
pub mod parcel_dto;
pub mod review_dto;
pub mod payment_dto;
