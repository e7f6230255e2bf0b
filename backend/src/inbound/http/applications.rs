//! Application lifecycle HTTP handlers.
//!
//! ```text
//! POST /api/applications
//! GET  /api/applications?status=
//! GET  /api/applications/{id}
//! POST /api/applications/{id}/approve
//! POST /api/applications/{id}/request-info
//! POST /api/applications/{id}/reject
//! POST /api/applications/{id}/resubmit
//! ```

use actix_web::{get, post, web, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{
    Application, ApplicationId, AttachmentMeta, DomainError, HistoryEntry, ListedApplication,
    NewApplication, OwnerIdentity, Payload, Principal, ServiceType, Status, UserId,
};
use crate::inbound::http::error::ApiResult;
use crate::inbound::http::state::HttpState;

/// Request payload for creating an application.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateApplicationRequest {
    pub service_type: ServiceType,
    #[schema(value_type = Object)]
    pub payload: Payload,
    #[serde(default)]
    pub submit: bool,
}

/// Request payload for a clerk action that requires a note.
#[derive(Debug, Deserialize, ToSchema)]
pub struct NoteRequest {
    pub note: String,
}

/// Request payload for rejecting an application; the note is optional.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RejectRequest {
    #[serde(default)]
    pub note: Option<String>,
}

/// Request payload for resubmitting an application.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ResubmitRequest {
    pub note: String,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub payload: Option<Payload>,
}

/// Status filter for listings.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ListQuery {
    /// Wire-format status, e.g. `NEEDS_INFO`.
    pub status: Option<String>,
}

/// Response payload for a single application.
///
/// `lastClerkNote` is derived from the history on the way out and is always
/// present, `null` when no clerk has left a note since the last submission.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationResponse {
    pub id: ApplicationId,
    pub owner_id: UserId,
    pub service_type: ServiceType,
    pub status: Status,
    #[schema(value_type = Object)]
    pub payload: Payload,
    pub attachments: Vec<AttachmentMeta>,
    pub history: Vec<HistoryEntry>,
    pub last_clerk_note: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Application> for ApplicationResponse {
    fn from(application: &Application) -> Self {
        Self {
            id: application.id(),
            owner_id: application.owner_id(),
            service_type: application.service_type(),
            status: application.status(),
            payload: application.payload().clone(),
            attachments: application.attachments().to_vec(),
            history: application.history().to_vec(),
            last_clerk_note: application.last_clerk_note().map(ToOwned::to_owned),
            created_at: application.created_at().to_rfc3339(),
            updated_at: application.updated_at().to_rfc3339(),
        }
    }
}

/// Owner identity shown to reviewers in listings.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OwnerResponse {
    pub id: UserId,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl From<OwnerIdentity> for OwnerResponse {
    fn from(owner: OwnerIdentity) -> Self {
        Self {
            id: owner.id,
            email: owner.email.as_str().to_owned(),
            first_name: owner.first_name,
            last_name: owner.last_name,
        }
    }
}

/// One row of a listing.
#[derive(Debug, Serialize, ToSchema)]
pub struct ListedApplicationResponse {
    #[serde(flatten)]
    pub application: ApplicationResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<OwnerResponse>,
}

impl From<ListedApplication> for ListedApplicationResponse {
    fn from(row: ListedApplication) -> Self {
        Self {
            application: ApplicationResponse::from(&row.application),
            owner: row.owner.map(OwnerResponse::from),
        }
    }
}

fn parse_status(value: &str) -> Result<Status, DomainError> {
    serde_json::from_value(json!(value)).map_err(|_| {
        DomainError::invalid_request("unknown status filter").with_details(json!({
            "field": "status",
            "value": value,
        }))
    })
}

/// Create a new application owned by the caller.
#[utoipa::path(
    post,
    path = "/api/applications",
    request_body = CreateApplicationRequest,
    responses(
        (status = 201, description = "Application created", body = ApplicationResponse),
        (status = 400, description = "Invalid request", body = crate::inbound::http::error::ApiError),
        (status = 401, description = "Unauthorised", body = crate::inbound::http::error::ApiError),
        (status = 403, description = "Forbidden", body = crate::inbound::http::error::ApiError)
    ),
    security(("bearer" = [])),
    tags = ["applications"],
    operation_id = "createApplication"
)]
#[post("/applications")]
pub async fn create_application(
    state: web::Data<HttpState>,
    actor: Principal,
    payload: web::Json<CreateApplicationRequest>,
) -> ApiResult<HttpResponse> {
    let request = payload.into_inner();
    let application = state
        .applications()
        .create(
            &actor,
            NewApplication {
                service_type: request.service_type,
                payload: request.payload,
                submit: request.submit,
            },
        )
        .await?;
    Ok(HttpResponse::Created().json(ApplicationResponse::from(&application)))
}

/// List applications visible to the caller.
#[utoipa::path(
    get,
    path = "/api/applications",
    params(ListQuery),
    responses(
        (status = 200, description = "Applications, newest change first", body = [ListedApplicationResponse]),
        (status = 400, description = "Invalid request", body = crate::inbound::http::error::ApiError),
        (status = 401, description = "Unauthorised", body = crate::inbound::http::error::ApiError)
    ),
    security(("bearer" = [])),
    tags = ["applications"],
    operation_id = "listApplications"
)]
#[get("/applications")]
pub async fn list_applications(
    state: web::Data<HttpState>,
    actor: Principal,
    query: web::Query<ListQuery>,
) -> ApiResult<web::Json<Vec<ListedApplicationResponse>>> {
    let status = query
        .into_inner()
        .status
        .as_deref()
        .map(parse_status)
        .transpose()?;
    let rows = state.applications().list(&actor, status).await?;
    Ok(web::Json(
        rows.into_iter().map(ListedApplicationResponse::from).collect(),
    ))
}

/// Fetch one application for review.
#[utoipa::path(
    get,
    path = "/api/applications/{id}",
    params(("id" = Uuid, Path, description = "Application identifier")),
    responses(
        (status = 200, description = "The application", body = ApplicationResponse),
        (status = 403, description = "Forbidden", body = crate::inbound::http::error::ApiError),
        (status = 404, description = "Not found", body = crate::inbound::http::error::ApiError)
    ),
    security(("bearer" = [])),
    tags = ["applications"],
    operation_id = "getApplication"
)]
#[get("/applications/{id}")]
pub async fn get_application(
    state: web::Data<HttpState>,
    actor: Principal,
    path: web::Path<Uuid>,
) -> ApiResult<web::Json<ApplicationResponse>> {
    let id = ApplicationId::from_uuid(path.into_inner());
    let application = state.applications().get(&actor, id).await?;
    Ok(web::Json(ApplicationResponse::from(&application)))
}

/// Approve a submitted application.
#[utoipa::path(
    post,
    path = "/api/applications/{id}/approve",
    params(("id" = Uuid, Path, description = "Application identifier")),
    responses(
        (status = 200, description = "Application approved", body = ApplicationResponse),
        (status = 400, description = "Illegal transition", body = crate::inbound::http::error::ApiError),
        (status = 403, description = "Forbidden", body = crate::inbound::http::error::ApiError),
        (status = 404, description = "Not found", body = crate::inbound::http::error::ApiError),
        (status = 409, description = "Lost a concurrent decision", body = crate::inbound::http::error::ApiError)
    ),
    security(("bearer" = [])),
    tags = ["applications"],
    operation_id = "approveApplication"
)]
#[post("/applications/{id}/approve")]
pub async fn approve_application(
    state: web::Data<HttpState>,
    actor: Principal,
    path: web::Path<Uuid>,
) -> ApiResult<web::Json<ApplicationResponse>> {
    let id = ApplicationId::from_uuid(path.into_inner());
    let application = state.applications().approve(&actor, id).await?;
    Ok(web::Json(ApplicationResponse::from(&application)))
}

/// Ask the owner for more information.
#[utoipa::path(
    post,
    path = "/api/applications/{id}/request-info",
    params(("id" = Uuid, Path, description = "Application identifier")),
    request_body = NoteRequest,
    responses(
        (status = 200, description = "Information requested", body = ApplicationResponse),
        (status = 400, description = "Invalid note or illegal transition", body = crate::inbound::http::error::ApiError),
        (status = 403, description = "Forbidden", body = crate::inbound::http::error::ApiError),
        (status = 404, description = "Not found", body = crate::inbound::http::error::ApiError),
        (status = 409, description = "Lost a concurrent decision", body = crate::inbound::http::error::ApiError)
    ),
    security(("bearer" = [])),
    tags = ["applications"],
    operation_id = "requestApplicationInfo"
)]
#[post("/applications/{id}/request-info")]
pub async fn request_application_info(
    state: web::Data<HttpState>,
    actor: Principal,
    path: web::Path<Uuid>,
    payload: web::Json<NoteRequest>,
) -> ApiResult<web::Json<ApplicationResponse>> {
    let id = ApplicationId::from_uuid(path.into_inner());
    let application = state
        .applications()
        .request_info(&actor, id, &payload.note)
        .await?;
    Ok(web::Json(ApplicationResponse::from(&application)))
}

/// Reject an application, optionally with a note.
#[utoipa::path(
    post,
    path = "/api/applications/{id}/reject",
    params(("id" = Uuid, Path, description = "Application identifier")),
    request_body = RejectRequest,
    responses(
        (status = 200, description = "Application rejected", body = ApplicationResponse),
        (status = 400, description = "Invalid note or illegal transition", body = crate::inbound::http::error::ApiError),
        (status = 403, description = "Forbidden", body = crate::inbound::http::error::ApiError),
        (status = 404, description = "Not found", body = crate::inbound::http::error::ApiError),
        (status = 409, description = "Lost a concurrent decision", body = crate::inbound::http::error::ApiError)
    ),
    security(("bearer" = [])),
    tags = ["applications"],
    operation_id = "rejectApplication"
)]
#[post("/applications/{id}/reject")]
pub async fn reject_application(
    state: web::Data<HttpState>,
    actor: Principal,
    path: web::Path<Uuid>,
    payload: web::Json<RejectRequest>,
) -> ApiResult<web::Json<ApplicationResponse>> {
    let id = ApplicationId::from_uuid(path.into_inner());
    let application = state
        .applications()
        .reject(&actor, id, payload.note.as_deref())
        .await?;
    Ok(web::Json(ApplicationResponse::from(&application)))
}

/// Resubmit an application after a request for information or a rejection.
#[utoipa::path(
    post,
    path = "/api/applications/{id}/resubmit",
    params(("id" = Uuid, Path, description = "Application identifier")),
    request_body = ResubmitRequest,
    responses(
        (status = 200, description = "Application resubmitted", body = ApplicationResponse),
        (status = 400, description = "Invalid note or illegal transition", body = crate::inbound::http::error::ApiError),
        (status = 403, description = "Forbidden", body = crate::inbound::http::error::ApiError),
        (status = 404, description = "Not found", body = crate::inbound::http::error::ApiError),
        (status = 409, description = "Lost a concurrent decision", body = crate::inbound::http::error::ApiError)
    ),
    security(("bearer" = [])),
    tags = ["applications"],
    operation_id = "resubmitApplication"
)]
#[post("/applications/{id}/resubmit")]
pub async fn resubmit_application(
    state: web::Data<HttpState>,
    actor: Principal,
    path: web::Path<Uuid>,
    payload: web::Json<ResubmitRequest>,
) -> ApiResult<web::Json<ApplicationResponse>> {
    let id = ApplicationId::from_uuid(path.into_inner());
    let request = payload.into_inner();
    let application = state
        .applications()
        .resubmit(&actor, id, &request.note, request.payload)
        .await?;
    Ok(web::Json(ApplicationResponse::from(&application)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::application::test_support::submitted_application;
    use crate::domain::ErrorCode;
    use rstest::rstest;
    use serde_json::Value;

    #[rstest]
    #[case("SUBMITTED", Status::Submitted)]
    #[case("NEEDS_INFO", Status::NeedsInfo)]
    #[case("IN_REVIEW", Status::InReview)]
    fn parse_status_accepts_wire_names(#[case] raw: &str, #[case] expected: Status) {
        assert_eq!(parse_status(raw).expect("valid status"), expected);
    }

    #[rstest]
    #[case("submitted")]
    #[case("PENDING")]
    #[case("")]
    fn parse_status_rejects_unknown_values(#[case] raw: &str) {
        let err = parse_status(raw).expect_err("unknown status");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        let details = err
            .details()
            .and_then(|value| value.as_object())
            .expect("details");
        assert_eq!(details.get("field").and_then(|v| v.as_str()), Some("status"));
    }

    #[test]
    fn response_always_carries_last_clerk_note() {
        let owner = UserId::random();
        let application = submitted_application(owner);
        let body = serde_json::to_value(ApplicationResponse::from(&application)).expect("json");
        assert_eq!(body["lastClerkNote"], Value::Null);
        assert_eq!(body["status"], "SUBMITTED");
    }

    #[test]
    fn response_derives_clerk_note_from_history() {
        let owner = UserId::random();
        let clerk = UserId::random();
        let mut application = submitted_application(owner);
        application
            .request_info(clerk, "please upload your photo ID")
            .expect("legal transition");
        let response = ApplicationResponse::from(&application);
        assert_eq!(
            response.last_clerk_note.as_deref(),
            Some("please upload your photo ID")
        );
    }

    #[test]
    fn listing_row_hides_owner_when_absent() {
        let owner = UserId::random();
        let row = ListedApplication {
            application: submitted_application(owner),
            owner: None,
        };
        let body = serde_json::to_value(ListedApplicationResponse::from(row)).expect("json");
        assert!(body.get("owner").is_none());
        assert_eq!(body["ownerId"], json!(owner));
    }

    #[test]
    fn create_request_defaults_to_draft() {
        let body: CreateApplicationRequest = serde_json::from_value(json!({
            "serviceType": "id-renewal",
            "payload": {}
        }))
        .expect("deserialises");
        assert!(!body.submit);
    }
}
