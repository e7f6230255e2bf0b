//! User identity types.
//!
//! Inbound payloads are parsed into these newtypes before any handler talks
//! to a port or service, keeping raw-string validation out of the services.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::principal::Role;

/// Validation errors raised by the identity newtypes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityValidationError {
    /// Email was empty or structurally invalid.
    #[error("email address is invalid")]
    InvalidEmail,
}

/// Stable user identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Generate a fresh random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for UserId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Validated, lower-cased email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Validate and normalise a raw email input.
    ///
    /// The check is intentionally structural (single `@`, non-empty local
    /// part, dotted domain); deliverability is not this layer's concern.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, IdentityValidationError> {
        let normalized = raw.as_ref().trim().to_ascii_lowercase();
        let Some((local, domain)) = normalized.split_once('@') else {
            return Err(IdentityValidationError::InvalidEmail);
        };
        if local.is_empty() || domain.is_empty() || domain.contains('@') {
            return Err(IdentityValidationError::InvalidEmail);
        }
        let dotted = domain
            .split('.')
            .filter(|segment| !segment.is_empty())
            .count()
            >= 2;
        if !dotted {
            return Err(IdentityValidationError::InvalidEmail);
        }
        Ok(Self(normalized))
    }

    /// Borrow the normalised address.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Email {
    type Error = IdentityValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

/// Registered portal user as stored by the user repository.
///
/// The password hash is opaque to the domain; only the hashing adapter can
/// interpret it.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Role,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Build a new user record with a fresh identifier.
    pub fn new(
        email: Email,
        password_hash: String,
        role: Role,
        first_name: Option<String>,
        last_name: Option<String>,
    ) -> Self {
        Self {
            id: UserId::random(),
            email,
            first_name,
            last_name,
            role,
            password_hash,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("no-at-sign.example.com")]
    #[case("@example.com")]
    #[case("user@")]
    #[case("user@nodot")]
    #[case("user@double@example.com")]
    fn rejects_invalid_emails(#[case] raw: &str) {
        assert_eq!(Email::new(raw), Err(IdentityValidationError::InvalidEmail));
    }

    #[rstest]
    #[case("Citizen@Example.COM", "citizen@example.com")]
    #[case("  clerk@portal.test  ", "clerk@portal.test")]
    fn normalises_valid_emails(#[case] raw: &str, #[case] expected: &str) {
        let email = Email::new(raw).expect("valid email");
        assert_eq!(email.as_str(), expected);
    }

    #[test]
    fn user_id_round_trips_through_serde() {
        let id = UserId::random();
        let json = serde_json::to_string(&id).expect("serializes");
        let back: UserId = serde_json::from_str(&json).expect("deserializes");
        assert_eq!(id, back);
    }
}
