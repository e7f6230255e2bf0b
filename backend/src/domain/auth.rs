//! Authentication input types.
//!
//! Inbound payload parsing stays outside the services: handlers build these
//! validated types first, and passwords are zeroized when dropped.

use zeroize::Zeroizing;

use super::user::{Email, IdentityValidationError};

/// Minimum password length accepted at registration.
pub const PASSWORD_MIN_CHARS: usize = 8;

/// Validation errors raised by the credential constructors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthValidationError {
    /// Email was empty or structurally invalid.
    #[error("email address is invalid")]
    InvalidEmail,
    /// Password shorter than [`PASSWORD_MIN_CHARS`].
    #[error("password must be at least {min} characters")]
    PasswordTooShort { min: usize },
    /// Password was empty.
    #[error("password must not be empty")]
    EmptyPassword,
}

impl From<IdentityValidationError> for AuthValidationError {
    fn from(_: IdentityValidationError) -> Self {
        Self::InvalidEmail
    }
}

/// Validated registration request.
#[derive(Debug, Clone)]
pub struct Registration {
    email: Email,
    password: Zeroizing<String>,
    first_name: Option<String>,
    last_name: Option<String>,
}

impl Registration {
    /// Construct a registration from raw inputs.
    ///
    /// The password keeps caller-provided whitespace to avoid surprising
    /// credential comparisons later.
    pub fn try_from_parts(
        email: &str,
        password: &str,
        first_name: Option<String>,
        last_name: Option<String>,
    ) -> Result<Self, AuthValidationError> {
        let email = Email::new(email)?;
        if password.chars().count() < PASSWORD_MIN_CHARS {
            return Err(AuthValidationError::PasswordTooShort {
                min: PASSWORD_MIN_CHARS,
            });
        }
        Ok(Self {
            email,
            password: Zeroizing::new(password.to_owned()),
            first_name: first_name.filter(|name| !name.trim().is_empty()),
            last_name: last_name.filter(|name| !name.trim().is_empty()),
        })
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn password(&self) -> &str {
        self.password.as_str()
    }

    pub fn first_name(&self) -> Option<&str> {
        self.first_name.as_deref()
    }

    pub fn last_name(&self) -> Option<&str> {
        self.last_name.as_deref()
    }
}

/// Validated login credentials.
#[derive(Debug, Clone)]
pub struct LoginCredentials {
    email: Email,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw email/password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, AuthValidationError> {
        let email = Email::new(email)?;
        if password.is_empty() {
            return Err(AuthValidationError::EmptyPassword);
        }
        Ok(Self {
            email,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}
