//! Server construction, bootstrap seeding, and route wiring.

mod config;

pub use config::{ConfigError, SeedCredentials, ServerConfig};

use std::sync::Arc;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{web, App, HttpServer};
use tracing::info;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

#[cfg(debug_assertions)]
use crate::doc::ApiDoc;
use crate::domain::ports::{PasswordHasher, TokenService, UserPersistenceError, UserRepository};
use crate::domain::{ApplicationService, AuthService, Email, Role, User};
use crate::inbound::http::applications::{
    approve_application, create_application, get_application, list_applications,
    reject_application, request_application_info, resubmit_application,
};
use crate::inbound::http::auth::{login, refresh, register};
use crate::inbound::http::health::{live, ready, HealthState};
use crate::inbound::http::HttpState;
use crate::middleware::RequestTracing;
use crate::outbound::auth::{InMemoryTokenService, Sha256PasswordHasher};
use crate::outbound::persistence::{InMemoryApplicationRepository, InMemoryUserRepository};

/// Failures while provisioning the initial accounts.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("seed account email is invalid: {email}")]
    InvalidSeedEmail { email: String },
    #[error("seed account could not be stored: {source}")]
    Store {
        #[from]
        source: UserPersistenceError,
    },
}

/// Build the shared handler state and provision configured reviewer
/// accounts.
///
/// Seeding is idempotent so restarts against a warm store do not fail.
pub async fn build_http_state(config: &ServerConfig) -> Result<HttpState, BootstrapError> {
    let applications = Arc::new(InMemoryApplicationRepository::new());
    let users: Arc<dyn UserRepository> = Arc::new(InMemoryUserRepository::new());
    let hasher: Arc<dyn PasswordHasher> = Arc::new(Sha256PasswordHasher::new());
    let tokens: Arc<dyn TokenService> = Arc::new(InMemoryTokenService::new(
        config.access_ttl(),
        config.refresh_ttl(),
    ));

    seed_account(&users, hasher.as_ref(), Role::Clerk, config.clerk()).await?;
    seed_account(&users, hasher.as_ref(), Role::Admin, config.admin()).await?;

    Ok(HttpState::new(
        ApplicationService::new(applications, Arc::clone(&users)),
        AuthService::new(Arc::clone(&users), hasher, Arc::clone(&tokens)),
        tokens,
    ))
}

async fn seed_account(
    users: &Arc<dyn UserRepository>,
    hasher: &dyn PasswordHasher,
    role: Role,
    credentials: Option<&SeedCredentials>,
) -> Result<(), BootstrapError> {
    let Some(credentials) = credentials else {
        return Ok(());
    };
    let email = Email::new(&credentials.email).map_err(|_| BootstrapError::InvalidSeedEmail {
        email: credentials.email.clone(),
    })?;
    if users.find_by_email(&email).await?.is_some() {
        info!(%role, "seed account already present");
        return Ok(());
    }
    let user = User::new(email, hasher.hash(&credentials.password), role, None, None);
    users.insert(&user).await?;
    info!(%role, user_id = %user.id, "seed account provisioned");
    Ok(())
}

/// Assemble the Actix application: tracing middleware, the `/api` scope,
/// health probes, and (debug builds only) Swagger UI.
pub fn build_app(
    health_state: web::Data<HealthState>,
    http_state: HttpState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let api = web::scope("/api")
        .service(register)
        .service(login)
        .service(refresh)
        .service(create_application)
        .service(list_applications)
        .service(get_application)
        .service(approve_application)
        .service(request_application_info)
        .service(reject_application)
        .service(resubmit_application);

    let app = App::new()
        .app_data(health_state)
        .app_data(web::Data::new(http_state))
        .wrap(RequestTracing)
        .service(api)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
    #[cfg(not(debug_assertions))]
    let app = app;

    app
}

/// Bind and start the HTTP server; readiness flips on once the listener is
/// up.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    http_state: HttpState,
    config: &ServerConfig,
) -> std::io::Result<Server> {
    let server_health_state = health_state.clone();
    let server = HttpServer::new(move || {
        build_app(server_health_state.clone(), http_state.clone())
    })
    .bind(config.bind_addr())?
    .run();

    health_state.mark_ready();
    Ok(server)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn build_http_state_without_seeds_succeeds() {
        let config = ServerConfig::from_env().expect("default config");
        let state = build_http_state(&config)
            .await
            .expect("state builds");
        let _ = state.tokens();
    }

    #[tokio::test]
    async fn seed_account_is_idempotent() {
        let users: Arc<dyn UserRepository> = Arc::new(InMemoryUserRepository::new());
        let hasher = Sha256PasswordHasher::new();
        let credentials = SeedCredentials {
            email: "clerk@example.com".into(),
            password: "clerk-password".into(),
        };

        seed_account(&users, &hasher, Role::Clerk, Some(&credentials))
            .await
            .expect("first seed");
        seed_account(&users, &hasher, Role::Clerk, Some(&credentials))
            .await
            .expect("second seed is a no-op");

        let email = Email::new("clerk@example.com").expect("valid email");
        let stored = users
            .find_by_email(&email)
            .await
            .expect("lookup succeeds")
            .expect("account present");
        assert_eq!(stored.role, Role::Clerk);
    }

    #[tokio::test]
    async fn seed_account_rejects_invalid_email() {
        let users: Arc<dyn UserRepository> = Arc::new(InMemoryUserRepository::new());
        let hasher = Sha256PasswordHasher::new();
        let credentials = SeedCredentials {
            email: "not-an-email".into(),
            password: "whatever-pw".into(),
        };

        let err = seed_account(&users, &hasher, Role::Admin, Some(&credentials))
            .await
            .expect_err("invalid email");
        assert!(matches!(err, BootstrapError::InvalidSeedEmail { .. }));
    }
}
