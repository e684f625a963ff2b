pub mod jwt;
pub mod logger;
pub mod error;
pub mod extract;
