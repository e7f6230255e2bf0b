//! Application aggregate and its lifecycle state machine.
//!
//! Status is modelled as a fold over the append-only history: every
//! status-changing action appends exactly one entry, and the stored `status`
//! always equals the fold of the entries. The transition methods are the
//! only way to mutate an application; authorization lives in
//! [`crate::domain::authz`] and persistence behind
//! [`crate::domain::ports::ApplicationRepository`].

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::error::DomainError;
use super::payload::{self, Payload};
use super::user::UserId;

/// Stable application identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct ApplicationId(Uuid);

impl ApplicationId {
    /// Generate a fresh random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for ApplicationId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Government service an application asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum ServiceType {
    /// Renewal of a national identity document.
    #[serde(rename = "id-renewal")]
    IdRenewal,
}

impl ServiceType {
    /// Wire name of the service type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::IdRenewal => "id-renewal",
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Draft,
    Submitted,
    InReview,
    NeedsInfo,
    Resubmitted,
    Approved,
    /// Reachable only through external issuance tooling; no transition in
    /// this engine produces it.
    Issued,
    Rejected,
}

impl Status {
    /// Wire name of the status.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Submitted => "SUBMITTED",
            Self::InReview => "IN_REVIEW",
            Self::NeedsInfo => "NEEDS_INFO",
            Self::Resubmitted => "RESUBMITTED",
            Self::Approved => "APPROVED",
            Self::Issued => "ISSUED",
            Self::Rejected => "REJECTED",
        }
    }

    /// Whether this status is never exited by a lifecycle operation.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Approved | Self::Issued | Self::Rejected)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audit action recorded with each history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HistoryAction {
    Created,
    Submitted,
    Approved,
    RequestInfo,
    Rejected,
    Resubmitted,
}

impl HistoryAction {
    /// Status an entry with this action folds to, if it changes status.
    ///
    /// `CREATED` carries no status of its own: creation lands in `DRAFT`
    /// unless a `SUBMITTED` entry is appended in the same operation.
    pub fn resulting_status(self) -> Option<Status> {
        match self {
            Self::Created => None,
            Self::Submitted => Some(Status::Submitted),
            Self::Approved => Some(Status::Approved),
            Self::RequestInfo => Some(Status::NeedsInfo),
            Self::Rejected => Some(Status::Rejected),
            Self::Resubmitted => Some(Status::Resubmitted),
        }
    }
}

/// Immutable audit record of one transition.
///
/// `note` is serialized even when absent so rejections without a note carry
/// an explicit `null` in the persisted history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub actor_id: UserId,
    pub action: HistoryAction,
    pub note: Option<String>,
    #[schema(value_type = String, format = DateTime)]
    pub at: DateTime<Utc>,
}

impl HistoryEntry {
    fn new(actor_id: UserId, action: HistoryAction, note: Option<String>, at: DateTime<Utc>) -> Self {
        Self {
            actor_id,
            action,
            note,
            at,
        }
    }
}

/// Attachment metadata carried alongside an application.
///
/// Uploads themselves are handled by an external storage collaborator; this
/// core only records what was attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentMeta {
    pub key: String,
    pub filename: String,
    pub mime_type: String,
    pub size: u64,
}

/// Minimum trimmed length for clerk and resubmission notes.
const NOTE_MIN_CHARS: usize = 3;

/// Statuses from which a clerk decision (approve, request info, reject) is
/// legal.
const REVIEWABLE: [Status; 2] = [Status::Submitted, Status::InReview];

/// Statuses from which the owning citizen may resubmit.
const RESUBMITTABLE: [Status; 3] = [Status::NeedsInfo, Status::Rejected, Status::Draft];

/// A citizen's request for a government service and its processing record.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    id: ApplicationId,
    owner_id: UserId,
    service_type: ServiceType,
    status: Status,
    #[schema(value_type = Object)]
    payload: Payload,
    attachments: Vec<AttachmentMeta>,
    history: Vec<HistoryEntry>,
    #[schema(value_type = String, format = DateTime)]
    created_at: DateTime<Utc>,
    #[schema(value_type = String, format = DateTime)]
    updated_at: DateTime<Utc>,
}

impl Application {
    /// Create a new application owned by `owner_id`.
    ///
    /// Validates the payload against the per-service schema, always appends
    /// a `CREATED` entry, and appends a second `SUBMITTED` entry when
    /// `submit` is set.
    pub fn create(
        owner_id: UserId,
        service_type: ServiceType,
        payload: Payload,
        submit: bool,
    ) -> Result<Self, DomainError> {
        payload::validate(service_type, &payload)?;
        let now = Utc::now();
        let mut history = vec![HistoryEntry::new(owner_id, HistoryAction::Created, None, now)];
        let status = if submit {
            history.push(HistoryEntry::new(
                owner_id,
                HistoryAction::Submitted,
                None,
                now,
            ));
            Status::Submitted
        } else {
            Status::Draft
        };
        Ok(Self {
            id: ApplicationId::random(),
            owner_id,
            service_type,
            status,
            payload,
            attachments: Vec::new(),
            history,
            created_at: now,
            updated_at: now,
        })
    }

    /// Approve the application. Legal from `SUBMITTED` or `IN_REVIEW`.
    pub fn approve(&mut self, actor_id: UserId) -> Result<(), DomainError> {
        self.guard(&REVIEWABLE, "approve")?;
        self.transition(actor_id, HistoryAction::Approved, None);
        Ok(())
    }

    /// Ask the citizen for more information. Legal from `SUBMITTED` or
    /// `IN_REVIEW`; the note is mandatory.
    pub fn request_info(&mut self, actor_id: UserId, note: &str) -> Result<(), DomainError> {
        let note = required_note(note)?;
        self.guard(&REVIEWABLE, "request info on")?;
        self.transition(actor_id, HistoryAction::RequestInfo, Some(note));
        Ok(())
    }

    /// Reject the application. Legal from `SUBMITTED` or `IN_REVIEW`; the
    /// note is optional and recorded as `null` when absent.
    pub fn reject(&mut self, actor_id: UserId, note: Option<&str>) -> Result<(), DomainError> {
        self.guard(&REVIEWABLE, "reject")?;
        let note = note
            .map(str::trim)
            .filter(|trimmed| !trimmed.is_empty())
            .map(ToOwned::to_owned);
        self.transition(actor_id, HistoryAction::Rejected, note);
        Ok(())
    }

    /// Resubmit after a draft, rejection, or information request.
    ///
    /// An optional payload patch is shallow-merged: patch keys overwrite,
    /// everything else is preserved.
    pub fn resubmit(
        &mut self,
        actor_id: UserId,
        note: &str,
        payload_patch: Option<Payload>,
    ) -> Result<(), DomainError> {
        let note = required_note(note)?;
        self.guard(&RESUBMITTABLE, "resubmit")?;
        if let Some(patch) = payload_patch {
            payload::merge(&mut self.payload, patch);
        }
        self.transition(actor_id, HistoryAction::Resubmitted, Some(note));
        Ok(())
    }

    fn guard(&self, allowed: &[Status], verb: &str) -> Result<(), DomainError> {
        if allowed.contains(&self.status) {
            Ok(())
        } else {
            Err(DomainError::invalid_transition(format!(
                "cannot {verb} an application while its status is {}",
                self.status
            )))
        }
    }

    fn transition(&mut self, actor_id: UserId, action: HistoryAction, note: Option<String>) {
        // Timestamp taken at acceptance time, not request arrival.
        let now = Utc::now();
        debug_assert!(action.resulting_status().is_some());
        if let Some(next) = action.resulting_status() {
            self.status = next;
        }
        self.history
            .push(HistoryEntry::new(actor_id, action, note, now));
        self.updated_at = now;
    }

    /// Most recent clerk note: the note of the newest `REQUEST_INFO` or
    /// `REJECTED` entry. Purely derived, never stored.
    pub fn last_clerk_note(&self) -> Option<&str> {
        self.history
            .iter()
            .rev()
            .find(|entry| {
                matches!(
                    entry.action,
                    HistoryAction::RequestInfo | HistoryAction::Rejected
                )
            })
            .and_then(|entry| entry.note.as_deref())
    }

    /// Replay the history into the status it implies.
    ///
    /// Used by invariant checks: the stored status must always match this
    /// fold (a history of just `CREATED` folds to `DRAFT`).
    pub fn folded_status(&self) -> Status {
        self.history
            .iter()
            .rev()
            .find_map(|entry| entry.action.resulting_status())
            .unwrap_or(Status::Draft)
    }

    pub fn id(&self) -> ApplicationId {
        self.id
    }

    pub fn owner_id(&self) -> UserId {
        self.owner_id
    }

    pub fn service_type(&self) -> ServiceType {
        self.service_type
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Append-only audit trail, oldest first.
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn attachments(&self) -> &[AttachmentMeta] {
        &self.attachments
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

fn required_note(note: &str) -> Result<String, DomainError> {
    let trimmed = note.trim();
    if trimmed.chars().count() < NOTE_MIN_CHARS {
        return Err(DomainError::invalid_request(format!(
            "note is required (min {NOTE_MIN_CHARS} characters)"
        ))
        .with_details(serde_json::json!({ "field": "note", "code": "note_too_short" })));
    }
    Ok(trimmed.to_owned())
}


#[cfg(test)]
mod tests {
    use super::test_support::{id_renewal_payload, submitted_application};
    use super::*;
    use crate::domain::error::ErrorCode;
    use rstest::rstest;

    #[test]
    fn create_draft_records_single_created_entry() {
        let owner = UserId::random();
        let app = Application::create(owner, ServiceType::IdRenewal, id_renewal_payload(), false)
            .expect("valid payload");
        assert_eq!(app.status(), Status::Draft);
        assert_eq!(app.history().len(), 1);
        assert_eq!(app.history()[0].action, HistoryAction::Created);
        assert_eq!(app.history()[0].actor_id, owner);
        assert_eq!(app.folded_status(), Status::Draft);
    }

    #[test]
    fn create_with_submit_pairs_created_and_submitted() {
        let app = submitted_application(UserId::random());
        assert_eq!(app.status(), Status::Submitted);
        let actions: Vec<_> = app.history().iter().map(|entry| entry.action).collect();
        assert_eq!(actions, [HistoryAction::Created, HistoryAction::Submitted]);
        assert_eq!(app.folded_status(), Status::Submitted);
    }

    #[test]
    fn create_rejects_incomplete_payload() {
        let mut payload = id_renewal_payload();
        payload.insert("idNumber".into(), serde_json::json!("123"));
        let err = Application::create(UserId::random(), ServiceType::IdRenewal, payload, true)
            .expect_err("short id number");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }

    #[test]
    fn approve_from_submitted_appends_entry() {
        let clerk = UserId::random();
        let mut app = submitted_application(UserId::random());
        app.approve(clerk).expect("legal transition");
        assert_eq!(app.status(), Status::Approved);
        assert_eq!(app.history().len(), 3);
        let last = app.history().last().expect("non-empty history");
        assert_eq!(last.action, HistoryAction::Approved);
        assert_eq!(last.actor_id, clerk);
        assert_eq!(last.note, None);
    }

    #[rstest]
    #[case(Status::Approved)]
    #[case(Status::Rejected)]
    #[case(Status::NeedsInfo)]
    fn approve_is_gated_on_reviewable_statuses(#[case] from: Status) {
        let clerk = UserId::random();
        let mut app = submitted_application(UserId::random());
        match from {
            Status::Approved => app.approve(clerk).expect("legal"),
            Status::Rejected => app.reject(clerk, None).expect("legal"),
            Status::NeedsInfo => app.request_info(clerk, "docs?").expect("legal"),
            _ => unreachable!("cases cover clerk decisions only"),
        }
        let err = app.approve(clerk).expect_err("terminal or waiting state");
        assert_eq!(err.code(), ErrorCode::InvalidTransition);
        assert_eq!(app.status(), from);
    }

    #[rstest]
    #[case("", true)]
    #[case("  \t ", true)]
    #[case("ab", true)]
    #[case(" ab ", true)]
    #[case("abc", false)]
    #[case("  abc  ", false)]
    fn request_info_note_rules(#[case] note: &str, #[case] rejected: bool) {
        let mut app = submitted_application(UserId::random());
        let result = app.request_info(UserId::random(), note);
        if rejected {
            let err = result.expect_err("note too short");
            assert_eq!(err.code(), ErrorCode::InvalidRequest);
            assert_eq!(app.status(), Status::Submitted);
            assert_eq!(app.history().len(), 2);
        } else {
            result.expect("note accepted");
            assert_eq!(app.status(), Status::NeedsInfo);
            let last = app.history().last().expect("entry appended");
            assert_eq!(last.note.as_deref(), Some(note.trim()));
        }
    }

    #[test]
    fn reject_without_note_records_explicit_null() {
        let mut app = submitted_application(UserId::random());
        app.reject(UserId::random(), None).expect("legal");
        let last = app.history().last().expect("entry appended");
        assert_eq!(last.action, HistoryAction::Rejected);
        assert_eq!(last.note, None);
        let json = serde_json::to_value(app.history()).expect("serializes");
        let entry = json.as_array().expect("array").last().expect("last entry");
        // The note key must be present and null, not absent.
        assert!(entry.get("note").is_some());
        assert!(entry["note"].is_null());
    }

    #[test]
    fn resubmit_merges_patch_shallowly() {
        let owner = UserId::random();
        let mut app = submitted_application(owner);
        app.request_info(UserId::random(), "address incomplete")
            .expect("legal");

        let mut patch = Payload::new();
        patch.insert("address".into(), serde_json::json!("1 New Street, Berlin"));
        patch.insert("extraField".into(), serde_json::json!("kept"));
        app.resubmit(owner, "updated address", Some(patch))
            .expect("legal");

        assert_eq!(app.status(), Status::Resubmitted);
        assert_eq!(app.payload()["address"], "1 New Street, Berlin");
        assert_eq!(app.payload()["firstName"], "Ada");
        assert_eq!(app.payload()["extraField"], "kept");
    }

    #[test]
    fn resubmit_twice_is_an_invalid_transition() {
        let owner = UserId::random();
        let mut app = submitted_application(owner);
        app.reject(UserId::random(), Some("expired id"))
            .expect("legal");
        app.resubmit(owner, "renewed", None).expect("legal");
        let err = app
            .resubmit(owner, "renewed", None)
            .expect_err("already resubmitted");
        assert_eq!(err.code(), ErrorCode::InvalidTransition);
        assert_eq!(app.history().len(), 4);
    }

    #[test]
    fn last_clerk_note_picks_newest_decision_note() {
        let owner = UserId::random();
        let clerk = UserId::random();
        let mut app = submitted_application(owner);
        assert_eq!(app.last_clerk_note(), None);

        app.request_info(clerk, "upload ID").expect("legal");
        assert_eq!(app.last_clerk_note(), Some("upload ID"));

        app.resubmit(owner, "uploaded", None).expect("legal");
        // Resubmission notes are the citizen's, not the clerk's.
        assert_eq!(app.last_clerk_note(), Some("upload ID"));

        app.reject(clerk, Some("illegible scan")).expect("legal");
        assert_eq!(app.last_clerk_note(), Some("illegible scan"));
    }

    #[test]
    fn last_clerk_note_is_none_after_silent_rejection() {
        let mut app = submitted_application(UserId::random());
        app.reject(UserId::random(), None).expect("legal");
        assert_eq!(app.last_clerk_note(), None);
    }

    #[test]
    fn status_always_matches_history_fold() {
        let owner = UserId::random();
        let clerk = UserId::random();
        let mut app = submitted_application(owner);
        for step in 0..3 {
            match step {
                0 => app.request_info(clerk, "more docs").expect("legal"),
                1 => app.resubmit(owner, "docs attached", None).expect("legal"),
                _ => app.approve(clerk).expect("legal"),
            }
            assert!(!app.history().is_empty());
            assert_eq!(app.status(), app.folded_status());
        }
    }

    #[test]
    fn serialized_status_uses_screaming_snake_case() {
        let app = submitted_application(UserId::random());
        let value = serde_json::to_value(&app).expect("serializes");
        assert_eq!(value["status"], "SUBMITTED");
        assert_eq!(value["serviceType"], "id-renewal");
        assert_eq!(value["history"][1]["action"], "SUBMITTED");
    }
}
