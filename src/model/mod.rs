pub mod user;
pub mod parcel;
pub mod review;
