//! OpenAPI documentation configuration.
//!
//! The generated specification is served by Swagger UI in debug builds at
//! `/docs` and describes the auth, application, and health endpoints.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::inbound::http::applications::{
    ApplicationResponse, CreateApplicationRequest, ListedApplicationResponse, NoteRequest,
    OwnerResponse, RejectRequest, ResubmitRequest,
};
use crate::inbound::http::auth::{
    LoginRequest, LoginResponse, RefreshRequest, RefreshResponse, RegisterRequest,
    RegisterResponse, SessionUser,
};
use crate::inbound::http::error::ApiError;

/// Enrich the generated document with the bearer token security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .description(Some("Opaque access token issued by POST /api/auth/login."))
                    .build(),
            ),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Citizen portal backend API",
        description = "HTTP interface for citizen service applications and their review."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::auth::register,
        crate::inbound::http::auth::login,
        crate::inbound::http::auth::refresh,
        crate::inbound::http::applications::create_application,
        crate::inbound::http::applications::list_applications,
        crate::inbound::http::applications::get_application,
        crate::inbound::http::applications::approve_application,
        crate::inbound::http::applications::request_application_info,
        crate::inbound::http::applications::reject_application,
        crate::inbound::http::applications::resubmit_application,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ApiError,
        ApplicationResponse,
        CreateApplicationRequest,
        ListedApplicationResponse,
        LoginRequest,
        LoginResponse,
        NoteRequest,
        OwnerResponse,
        RefreshRequest,
        RefreshResponse,
        RegisterRequest,
        RegisterResponse,
        RejectRequest,
        ResubmitRequest,
        SessionUser,
    )),
    tags(
        (name = "auth", description = "Registration, login, and token refresh"),
        (name = "applications", description = "Application lifecycle operations"),
        (name = "health", description = "Liveness and readiness probes")
    )
)]
pub struct ApiDoc;
