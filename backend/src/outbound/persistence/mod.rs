//! Persistence adapters.
//!
//! The portal runs against in-memory stores; the database proper is an
//! external collaborator reached through the same repository ports.

mod memory;

pub use memory::{InMemoryApplicationRepository, InMemoryUserRepository};
