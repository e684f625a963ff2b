pub mod repository_error;
pub mod mongo;
pub mod user_repo;
pub mod parcel_repo;
pub mod review_repo;
