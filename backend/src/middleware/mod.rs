//! Actix middleware.

pub mod trace;

pub use trace::{RequestId, RequestTracing, REQUEST_ID_HEADER};
