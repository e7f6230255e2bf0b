//! Registration, login, and token refresh.
//!
//! Hashing and token mechanics stay behind their ports; this service only
//! sequences them and maps failures into the domain error taxonomy.

use std::sync::Arc;

use tracing::info;

use super::auth::{LoginCredentials, Registration};
use super::error::DomainError;
use super::ports::{
    PasswordHasher, TokenError, TokenPair, TokenService, UserPersistenceError, UserRepository,
};
use super::principal::{Principal, Role};
use super::user::User;

/// Successful login: issued tokens plus the authenticated account.
#[derive(Debug, Clone)]
pub struct AuthenticatedSession {
    pub tokens: TokenPair,
    pub user: User,
}

/// Authentication use-cases exposed to inbound adapters.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenService>,
}

impl AuthService {
    /// Create the service over its driven ports.
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn TokenService>,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
        }
    }

    /// Register a new citizen account.
    ///
    /// Self-registration always yields the `citizen` role; clerk and admin
    /// accounts are provisioned at bootstrap.
    pub async fn register(&self, registration: Registration) -> Result<User, DomainError> {
        let existing = self
            .users
            .find_by_email(registration.email())
            .await
            .map_err(map_user_store_error)?;
        if existing.is_some() {
            return Err(DomainError::conflict("Email already registered"));
        }

        let user = User::new(
            registration.email().clone(),
            self.hasher.hash(registration.password()),
            Role::Citizen,
            registration.first_name().map(ToOwned::to_owned),
            registration.last_name().map(ToOwned::to_owned),
        );
        match self.users.insert(&user).await {
            Ok(()) => {
                info!(user_id = %user.id, "citizen registered");
                Ok(user)
            }
            // Lost a registration race on the same address.
            Err(UserPersistenceError::DuplicateEmail { .. }) => {
                Err(DomainError::conflict("Email already registered"))
            }
            Err(err) => Err(map_user_store_error(err)),
        }
    }

    /// Authenticate and issue an access/refresh token pair.
    ///
    /// Unknown accounts and wrong passwords are indistinguishable to the
    /// caller.
    pub async fn login(
        &self,
        credentials: LoginCredentials,
    ) -> Result<AuthenticatedSession, DomainError> {
        let user = self
            .users
            .find_by_email(credentials.email())
            .await
            .map_err(map_user_store_error)?
            .ok_or_else(invalid_credentials)?;

        if !self
            .hasher
            .verify(credentials.password(), &user.password_hash)
        {
            return Err(invalid_credentials());
        }

        let tokens = self
            .tokens
            .issue(Principal::new(user.id, user.role))
            .await
            .map_err(map_token_error)?;
        info!(user_id = %user.id, role = %user.role, "login succeeded");
        Ok(AuthenticatedSession { tokens, user })
    }

    /// Exchange a refresh token for a fresh access token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, DomainError> {
        self.tokens
            .refresh(refresh_token)
            .await
            .map_err(map_token_error)
    }
}

fn invalid_credentials() -> DomainError {
    DomainError::unauthorized("Invalid credentials")
}

fn map_token_error(error: TokenError) -> DomainError {
    match error {
        TokenError::Invalid => DomainError::unauthorized("Invalid or expired token"),
        TokenError::Unavailable { message } => {
            DomainError::internal(format!("token store failure: {message}"))
        }
    }
}

fn map_user_store_error(error: UserPersistenceError) -> DomainError {
    DomainError::internal(format!("user store failure: {error}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::ErrorCode;
    use crate::domain::ports::{MockPasswordHasher, MockTokenService, MockUserRepository};
    use crate::domain::user::Email;

    fn registration() -> Registration {
        Registration::try_from_parts("citizen@example.com", "hunter2hunter2", None, None)
            .expect("valid registration")
    }

    fn stored_user() -> User {
        let email = Email::new("citizen@example.com").expect("valid email");
        User::new(email, "stored-hash".into(), Role::Citizen, None, None)
    }

    fn service(
        users: MockUserRepository,
        hasher: MockPasswordHasher,
        tokens: MockTokenService,
    ) -> AuthService {
        AuthService::new(Arc::new(users), Arc::new(hasher), Arc::new(tokens))
    }

    #[tokio::test]
    async fn register_hashes_and_persists_a_citizen() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .times(1)
            .return_once(|_| Ok(None));
        users
            .expect_insert()
            .withf(|user| user.role == Role::Citizen && user.password_hash == "hashed")
            .times(1)
            .return_once(|_| Ok(()));
        let mut hasher = MockPasswordHasher::new();
        hasher
            .expect_hash()
            .times(1)
            .return_once(|_| "hashed".into());

        let service = service(users, hasher, MockTokenService::new());
        let user = service
            .register(registration())
            .await
            .expect("registration succeeds");
        assert_eq!(user.email.as_str(), "citizen@example.com");
    }

    #[tokio::test]
    async fn register_rejects_taken_email() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .times(1)
            .return_once(|_| Ok(Some(stored_user())));
        users.expect_insert().times(0);

        let service = service(users, MockPasswordHasher::new(), MockTokenService::new());
        let err = service
            .register(registration())
            .await
            .expect_err("duplicate email");
        assert_eq!(err.code(), ErrorCode::Conflict);
    }

    #[tokio::test]
    async fn login_issues_tokens_for_valid_credentials() {
        let user = stored_user();
        let principal = Principal::new(user.id, user.role);
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .times(1)
            .return_once(move |_| Ok(Some(user)));
        let mut hasher = MockPasswordHasher::new();
        hasher
            .expect_verify()
            .withf(|password, hash| password == "hunter2hunter2" && hash == "stored-hash")
            .times(1)
            .return_once(|_, _| true);
        let mut tokens = MockTokenService::new();
        tokens
            .expect_issue()
            .withf(move |issued_for| *issued_for == principal)
            .times(1)
            .return_once(|_| {
                Ok(TokenPair {
                    access: "access".into(),
                    refresh: "refresh".into(),
                })
            });

        let credentials = LoginCredentials::try_from_parts("citizen@example.com", "hunter2hunter2")
            .expect("valid credentials");
        let session = service(users, hasher, tokens)
            .login(credentials)
            .await
            .expect("login succeeds");
        assert_eq!(session.tokens.access, "access");
    }

    #[tokio::test]
    async fn login_rejects_wrong_password() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .times(1)
            .return_once(|_| Ok(Some(stored_user())));
        let mut hasher = MockPasswordHasher::new();
        hasher.expect_verify().times(1).return_once(|_, _| false);
        let mut tokens = MockTokenService::new();
        tokens.expect_issue().times(0);

        let credentials = LoginCredentials::try_from_parts("citizen@example.com", "wrong-password")
            .expect("valid shape");
        let err = service(users, hasher, tokens)
            .login(credentials)
            .await
            .expect_err("wrong password");
        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }

    #[tokio::test]
    async fn login_rejects_unknown_account_identically() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .times(1)
            .return_once(|_| Ok(None));

        let credentials = LoginCredentials::try_from_parts("ghost@example.com", "whatever-pw")
            .expect("valid shape");
        let err = service(users, MockPasswordHasher::new(), MockTokenService::new())
            .login(credentials)
            .await
            .expect_err("unknown account");
        assert_eq!(err.code(), ErrorCode::Unauthorized);
        assert_eq!(err.message(), "Invalid credentials");
    }

    #[tokio::test]
    async fn refresh_maps_invalid_token_to_unauthorized() {
        let mut tokens = MockTokenService::new();
        tokens
            .expect_refresh()
            .times(1)
            .return_once(|_| Err(TokenError::Invalid));

        let err = service(MockUserRepository::new(), MockPasswordHasher::new(), tokens)
            .refresh("stale")
            .await
            .expect_err("stale refresh token");
        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }
}
