pub mod api;
pub mod chain;
pub mod cli;
pub mod config;
pub mod error;
pub mod guard;
pub mod poller;
pub mod session;
pub mod validation;

pub use api::ApiClient;
pub use error::ClientError;
pub use session::{Role, SessionContext};
