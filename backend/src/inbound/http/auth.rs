//! Authentication HTTP handlers.
//!
//! ```text
//! POST /api/auth/register
//! POST /api/auth/login
//! POST /api/auth/refresh
//! ```

use actix_web::{post, web, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::{
    AuthValidationError, AuthenticatedSession, DomainError, LoginCredentials, Registration, Role,
    User, UserId,
};
use crate::inbound::http::error::ApiResult;
use crate::inbound::http::state::HttpState;

/// Request payload for account registration.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Request payload for login.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request payload for exchanging a refresh token.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Response payload for a created account.
#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterResponse {
    pub id: UserId,
    pub email: String,
}

impl From<User> for RegisterResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email.as_str().to_owned(),
        }
    }
}

/// The authenticated account as shown to its owner.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionUser {
    pub id: UserId,
    pub email: String,
    pub role: Role,
}

/// Response payload for a successful login.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: SessionUser,
}

impl From<AuthenticatedSession> for LoginResponse {
    fn from(session: AuthenticatedSession) -> Self {
        Self {
            access_token: session.tokens.access,
            refresh_token: session.tokens.refresh,
            user: SessionUser {
                id: session.user.id,
                email: session.user.email.as_str().to_owned(),
                role: session.user.role,
            },
        }
    }
}

/// Response payload for a token refresh.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
}

fn map_validation_error(error: AuthValidationError) -> DomainError {
    let field = match &error {
        AuthValidationError::InvalidEmail => "email",
        AuthValidationError::PasswordTooShort { .. } | AuthValidationError::EmptyPassword => {
            "password"
        }
    };
    DomainError::invalid_request(error.to_string()).with_details(json!({ "field": field }))
}

/// Register a new citizen account.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = RegisterResponse),
        (status = 400, description = "Invalid request", body = crate::inbound::http::error::ApiError),
        (status = 409, description = "Email already registered", body = crate::inbound::http::error::ApiError)
    ),
    tags = ["auth"],
    operation_id = "register"
)]
#[post("/auth/register")]
pub async fn register(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let request = payload.into_inner();
    let registration = Registration::try_from_parts(
        &request.email,
        &request.password,
        request.first_name,
        request.last_name,
    )
    .map_err(map_validation_error)?;
    let user = state.auth().register(registration).await?;
    Ok(HttpResponse::Created().json(RegisterResponse::from(user)))
}

/// Authenticate and receive an access/refresh token pair.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = LoginResponse),
        (status = 400, description = "Invalid request", body = crate::inbound::http::error::ApiError),
        (status = 401, description = "Invalid credentials", body = crate::inbound::http::error::ApiError)
    ),
    tags = ["auth"],
    operation_id = "login"
)]
#[post("/auth/login")]
pub async fn login(
    state: web::Data<HttpState>,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<LoginResponse>> {
    let request = payload.into_inner();
    let credentials = LoginCredentials::try_from_parts(&request.email, &request.password)
        .map_err(map_validation_error)?;
    let session = state.auth().login(credentials).await?;
    Ok(web::Json(LoginResponse::from(session)))
}

/// Exchange a refresh token for a fresh access token.
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New access token", body = RefreshResponse),
        (status = 401, description = "Invalid or expired token", body = crate::inbound::http::error::ApiError)
    ),
    tags = ["auth"],
    operation_id = "refresh"
)]
#[post("/auth/refresh")]
pub async fn refresh(
    state: web::Data<HttpState>,
    payload: web::Json<RefreshRequest>,
) -> ApiResult<web::Json<RefreshResponse>> {
    let access_token = state.auth().refresh(&payload.refresh_token).await?;
    Ok(web::Json(RefreshResponse { access_token }))
}
