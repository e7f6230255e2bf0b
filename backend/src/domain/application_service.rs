//! Access-controlled application service.
//!
//! Wraps the lifecycle engine with the authorization policy and the
//! persistence port. Every transition is an atomic read-validate-write: the
//! update is guarded by the status the transition was validated against, so
//! concurrent decisions on the same application surface as conflicts
//! instead of silently interleaving.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::info;

use super::application::{Application, ApplicationId, ServiceType, Status};
use super::authz::{self, Operation};
use super::error::DomainError;
use super::payload::Payload;
use super::ports::{
    ApplicationFilter, ApplicationPersistenceError, ApplicationRepository, UserPersistenceError,
    UserRepository,
};
use super::principal::Principal;
use super::user::{Email, User, UserId};

/// Hard cap on rows returned by a listing.
pub const LIST_LIMIT: usize = 200;

/// Input for creating an application.
#[derive(Debug, Clone)]
pub struct NewApplication {
    pub service_type: ServiceType,
    pub payload: Payload,
    pub submit: bool,
}

/// Owner identity attached to listings for reviewers.
#[derive(Debug, Clone, PartialEq)]
pub struct OwnerIdentity {
    pub id: UserId,
    pub email: Email,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl From<User> for OwnerIdentity {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
        }
    }
}

/// One row of a listing; `owner` is populated for reviewers only, so
/// citizens never see other citizens' identity data.
#[derive(Debug, Clone, PartialEq)]
pub struct ListedApplication {
    pub application: Application,
    pub owner: Option<OwnerIdentity>,
}

/// Application use-cases exposed to inbound adapters.
#[derive(Clone)]
pub struct ApplicationService {
    applications: Arc<dyn ApplicationRepository>,
    users: Arc<dyn UserRepository>,
}

impl ApplicationService {
    /// Create the service over its driven ports.
    pub fn new(applications: Arc<dyn ApplicationRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self {
            applications,
            users,
        }
    }

    /// Create a new application owned by the acting citizen.
    ///
    /// The creating principal always becomes the owner; creating on another
    /// citizen's behalf is impossible by construction.
    pub async fn create(
        &self,
        actor: &Principal,
        request: NewApplication,
    ) -> Result<Application, DomainError> {
        authz::authorize(Operation::Create, actor, None)?;
        let application = Application::create(
            actor.id,
            request.service_type,
            request.payload,
            request.submit,
        )?;
        self.applications
            .insert(&application)
            .await
            .map_err(map_application_store_error)?;
        info!(
            application_id = %application.id(),
            status = %application.status(),
            "application created"
        );
        Ok(application)
    }

    /// List applications visible to the actor, newest change first, capped
    /// at [`LIST_LIMIT`]. Reviewers get owner identities attached.
    pub async fn list(
        &self,
        actor: &Principal,
        status: Option<Status>,
    ) -> Result<Vec<ListedApplication>, DomainError> {
        authz::authorize(Operation::List, actor, None)?;
        let owner = (!actor.role.is_reviewer()).then_some(actor.id);
        let filter = ApplicationFilter {
            owner,
            status,
            limit: Some(LIST_LIMIT),
        };
        let applications = self
            .applications
            .list(filter)
            .await
            .map_err(map_application_store_error)?;

        if !actor.role.is_reviewer() {
            return Ok(applications
                .into_iter()
                .map(|application| ListedApplication {
                    application,
                    owner: None,
                })
                .collect());
        }

        let owner_ids: Vec<UserId> = applications
            .iter()
            .map(Application::owner_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let owners: Vec<User> = self
            .users
            .find_by_ids(&owner_ids)
            .await
            .map_err(map_user_store_error)?;

        Ok(applications
            .into_iter()
            .map(|application| {
                let owner = owners
                    .iter()
                    .find(|user| user.id == application.owner_id())
                    .cloned()
                    .map(OwnerIdentity::from);
                ListedApplication { application, owner }
            })
            .collect())
    }

    /// Inspect a single application (reviewers only).
    pub async fn get(
        &self,
        actor: &Principal,
        id: ApplicationId,
    ) -> Result<Application, DomainError> {
        authz::authorize(Operation::Get, actor, None)?;
        self.load(id).await
    }

    /// Approve an application.
    pub async fn approve(
        &self,
        actor: &Principal,
        id: ApplicationId,
    ) -> Result<Application, DomainError> {
        authz::authorize(Operation::Review, actor, None)?;
        let actor_id = actor.id;
        self.transition(id, move |application| application.approve(actor_id))
            .await
    }

    /// Ask the owning citizen for more information.
    pub async fn request_info(
        &self,
        actor: &Principal,
        id: ApplicationId,
        note: &str,
    ) -> Result<Application, DomainError> {
        authz::authorize(Operation::Review, actor, None)?;
        let actor_id = actor.id;
        self.transition(id, move |application| application.request_info(actor_id, note))
            .await
    }

    /// Reject an application, optionally with a note.
    pub async fn reject(
        &self,
        actor: &Principal,
        id: ApplicationId,
        note: Option<&str>,
    ) -> Result<Application, DomainError> {
        authz::authorize(Operation::Review, actor, None)?;
        let actor_id = actor.id;
        self.transition(id, move |application| application.reject(actor_id, note))
            .await
    }

    /// Resubmit an application, optionally patching its payload.
    ///
    /// Ownership is checked against the stored application, so a non-owning
    /// citizen is refused regardless of the application's status.
    pub async fn resubmit(
        &self,
        actor: &Principal,
        id: ApplicationId,
        note: &str,
        payload_patch: Option<Payload>,
    ) -> Result<Application, DomainError> {
        let mut application = self.load(id).await?;
        authz::authorize(Operation::Resubmit, actor, Some(application.owner_id()))?;
        let expected = application.status();
        application.resubmit(actor.id, note, payload_patch)?;
        self.store_transition(&application, expected).await?;
        Ok(application)
    }

    async fn transition<F>(&self, id: ApplicationId, apply: F) -> Result<Application, DomainError>
    where
        F: FnOnce(&mut Application) -> Result<(), DomainError>,
    {
        let mut application = self.load(id).await?;
        let expected = application.status();
        apply(&mut application)?;
        self.store_transition(&application, expected).await?;
        Ok(application)
    }

    async fn store_transition(
        &self,
        application: &Application,
        expected: Status,
    ) -> Result<(), DomainError> {
        self.applications
            .update_if_status(application, expected)
            .await
            .map_err(map_application_store_error)?;
        info!(
            application_id = %application.id(),
            status = %application.status(),
            "application transitioned"
        );
        Ok(())
    }

    async fn load(&self, id: ApplicationId) -> Result<Application, DomainError> {
        self.applications
            .find_by_id(id)
            .await
            .map_err(map_application_store_error)?
            .ok_or_else(|| DomainError::not_found("Application not found"))
    }
}

fn map_application_store_error(error: ApplicationPersistenceError) -> DomainError {
    match error {
        ApplicationPersistenceError::Connection { message }
        | ApplicationPersistenceError::Query { message } => {
            DomainError::internal(format!("application store failure: {message}"))
        }
        ApplicationPersistenceError::Missing { .. } => {
            DomainError::not_found("Application not found")
        }
        ApplicationPersistenceError::StatusMoved { actual, .. } => DomainError::conflict(format!(
            "application was modified concurrently (status is now {actual})"
        )),
    }
}

fn map_user_store_error(error: UserPersistenceError) -> DomainError {
    DomainError::internal(format!("user store failure: {error}"))
}
