//! Domain layer: entities, the lifecycle engine, services, and ports.
//!
//! Nothing in this module knows about HTTP or storage engines. Inbound
//! adapters translate requests into these types; outbound adapters
//! implement the ports.

pub mod application;
pub mod application_service;
pub mod auth;
pub mod auth_service;
pub mod authz;
pub mod error;
pub mod payload;
pub mod ports;
pub mod principal;
pub mod user;

pub use self::application::{
    Application, ApplicationId, AttachmentMeta, HistoryAction, HistoryEntry, ServiceType, Status,
};
pub use self::application_service::{
    ApplicationService, ListedApplication, NewApplication, OwnerIdentity, LIST_LIMIT,
};
pub use self::auth::{AuthValidationError, LoginCredentials, Registration, PASSWORD_MIN_CHARS};
pub use self::auth_service::{AuthService, AuthenticatedSession};
pub use self::error::{DomainError, ErrorCode};
pub use self::payload::Payload;
pub use self::principal::{Principal, Role};
pub use self::user::{Email, IdentityValidationError, User, UserId};
