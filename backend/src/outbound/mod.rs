//! Driven adapters implementing the domain ports.

pub mod auth;
pub mod persistence;
