pub mod auth;
pub mod bonafide;
pub mod client;
pub mod notifications;
pub mod types;

pub use client::{ApiClient, Body, Call, FormPart, REFRESH_PATH};
pub use notifications::NotificationFeed;
