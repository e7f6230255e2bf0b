//! Domain ports defining the edges of the hexagon.
//!
//! Ports describe how the domain expects to interact with driven adapters
//! (application store, user store, credential hashing, token issuance).
//! Each trait exposes strongly typed errors so adapters map their failures
//! into predictable variants instead of returning `anyhow::Result`.

use async_trait::async_trait;
use thiserror::Error;

use super::application::{Application, ApplicationId, Status};
use super::principal::Principal;
use super::user::{Email, User, UserId};

/// Errors surfaced by [`ApplicationRepository`] adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplicationPersistenceError {
    /// Store connectivity failure.
    #[error("application store unavailable: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("application store query failed: {message}")]
    Query { message: String },
    /// The targeted application no longer exists.
    #[error("application {id} does not exist")]
    Missing { id: ApplicationId },
    /// A guarded update found a status other than the expected one.
    #[error("application {id} was modified concurrently (status is now {actual})")]
    StatusMoved { id: ApplicationId, actual: Status },
}

impl ApplicationPersistenceError {
    /// Helper for connection-oriented failures.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Helper for query failures.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Errors surfaced by [`UserRepository`] adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserPersistenceError {
    /// Store connectivity failure.
    #[error("user store unavailable: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("user store query failed: {message}")]
    Query { message: String },
    /// Insert collided with an existing account.
    #[error("email {email} is already registered")]
    DuplicateEmail { email: Email },
}

impl UserPersistenceError {
    /// Helper for connection-oriented failures.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Helper for query failures.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Errors surfaced by the token issuing adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Token is unknown, malformed, or expired.
    #[error("token is invalid or expired")]
    Invalid,
    /// Token store is unavailable.
    #[error("token store unavailable: {message}")]
    Unavailable { message: String },
}

impl TokenError {
    /// Helper for store-level failures.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}

/// Filter for application listings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ApplicationFilter {
    /// Restrict to applications owned by this citizen.
    pub owner: Option<UserId>,
    /// Restrict to applications in this status.
    pub status: Option<Status>,
    /// Hard cap on returned rows; `None` means adapter default.
    pub limit: Option<usize>,
}

/// Persistence port for the application aggregate.
///
/// Updates are guarded by the status the caller validated the transition
/// against, so concurrent transitions never interleave into an inconsistent
/// status/history pair (optimistic concurrency on status).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ApplicationRepository: Send + Sync {
    /// Persist a freshly created application.
    async fn insert(&self, application: &Application) -> Result<(), ApplicationPersistenceError>;

    /// Fetch an application by identifier.
    async fn find_by_id(
        &self,
        id: ApplicationId,
    ) -> Result<Option<Application>, ApplicationPersistenceError>;

    /// Replace the stored application, but only while its stored status
    /// still equals `expected`; fails with
    /// [`ApplicationPersistenceError::StatusMoved`] otherwise.
    async fn update_if_status(
        &self,
        application: &Application,
        expected: Status,
    ) -> Result<(), ApplicationPersistenceError>;

    /// List applications matching `filter`, newest `updatedAt` first.
    async fn list(
        &self,
        filter: ApplicationFilter,
    ) -> Result<Vec<Application>, ApplicationPersistenceError>;
}

/// Persistence port for user accounts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new account; duplicate emails are rejected.
    async fn insert(&self, user: &User) -> Result<(), UserPersistenceError>;

    /// Fetch an account by normalised email.
    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, UserPersistenceError>;

    /// Fetch an account by identifier.
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserPersistenceError>;

    /// Fetch the accounts for a set of identifiers (missing ids are simply
    /// absent from the result).
    async fn find_by_ids(&self, ids: &[UserId]) -> Result<Vec<User>, UserPersistenceError>;
}

/// Credential hashing port.
///
/// The domain treats hashes as opaque strings; only the adapter knows the
/// scheme.
#[cfg_attr(test, mockall::automock)]
pub trait PasswordHasher: Send + Sync {
    /// Hash a plaintext password for storage.
    fn hash(&self, password: &str) -> String;

    /// Check a plaintext password against a stored hash.
    fn verify(&self, password: &str, hash: &str) -> bool;
}

/// Access/refresh token pair issued at login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Token issuing and verification port.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenService: Send + Sync {
    /// Issue a fresh access/refresh pair for an authenticated principal.
    async fn issue(&self, principal: Principal) -> Result<TokenPair, TokenError>;

    /// Resolve an access token into the principal it was issued for.
    async fn verify_access(&self, token: &str) -> Result<Principal, TokenError>;

    /// Exchange a refresh token for a new access token.
    async fn refresh(&self, refresh_token: &str) -> Result<String, TokenError>;
}
