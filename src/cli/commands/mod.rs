pub mod auth;
pub mod notify;
pub mod request;
pub mod review;
