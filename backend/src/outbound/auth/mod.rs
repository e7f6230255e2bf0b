//! Credential and token adapters.

mod password;
mod tokens;

pub use password::Sha256PasswordHasher;
pub use tokens::InMemoryTokenService;
