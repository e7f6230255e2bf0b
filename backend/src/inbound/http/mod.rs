//! HTTP inbound adapter exposing the REST endpoints.

pub mod applications;
pub mod auth;
pub mod error;
pub mod health;
pub mod principal;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::HttpState;
