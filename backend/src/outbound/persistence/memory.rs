//! In-memory repository adapters.
//!
//! Database connection management is an external concern for this service,
//! so the shipped adapters keep everything in mutex-guarded maps. The
//! application update is atomic with respect to the status guard: the check
//! and the write happen under one lock, which satisfies the
//! read-modify-write contract of the repository port.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::ports::{
    ApplicationFilter, ApplicationPersistenceError, ApplicationRepository, UserPersistenceError,
    UserRepository,
};
use crate::domain::{Application, ApplicationId, Email, Status, User, UserId};

/// Default listing cap when the filter does not set one.
const DEFAULT_LIST_LIMIT: usize = 200;

/// Mutex-guarded map of applications.
#[derive(Default)]
pub struct InMemoryApplicationRepository {
    store: Mutex<HashMap<ApplicationId, Application>>,
}

impl InMemoryApplicationRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(
        &self,
    ) -> Result<MutexGuard<'_, HashMap<ApplicationId, Application>>, ApplicationPersistenceError>
    {
        self.store
            .lock()
            .map_err(|_| ApplicationPersistenceError::connection("application store poisoned"))
    }
}

#[async_trait]
impl ApplicationRepository for InMemoryApplicationRepository {
    async fn insert(&self, application: &Application) -> Result<(), ApplicationPersistenceError> {
        let mut store = self.guard()?;
        store.insert(application.id(), application.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: ApplicationId,
    ) -> Result<Option<Application>, ApplicationPersistenceError> {
        let store = self.guard()?;
        Ok(store.get(&id).cloned())
    }

    async fn update_if_status(
        &self,
        application: &Application,
        expected: Status,
    ) -> Result<(), ApplicationPersistenceError> {
        let mut store = self.guard()?;
        let id = application.id();
        let stored = store
            .get_mut(&id)
            .ok_or(ApplicationPersistenceError::Missing { id })?;
        if stored.status() != expected {
            return Err(ApplicationPersistenceError::StatusMoved {
                id,
                actual: stored.status(),
            });
        }
        *stored = application.clone();
        Ok(())
    }

    async fn list(
        &self,
        filter: ApplicationFilter,
    ) -> Result<Vec<Application>, ApplicationPersistenceError> {
        let store = self.guard()?;
        let mut rows: Vec<Application> = store
            .values()
            .filter(|application| {
                filter
                    .owner
                    .is_none_or(|owner| application.owner_id() == owner)
            })
            .filter(|application| {
                filter
                    .status
                    .is_none_or(|status| application.status() == status)
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.updated_at().cmp(&a.updated_at()));
        rows.truncate(filter.limit.unwrap_or(DEFAULT_LIST_LIMIT));
        Ok(rows)
    }
}

/// Mutex-guarded map of user accounts.
#[derive(Default)]
pub struct InMemoryUserRepository {
    store: Mutex<HashMap<UserId, User>>,
}

impl InMemoryUserRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> Result<MutexGuard<'_, HashMap<UserId, User>>, UserPersistenceError> {
        self.store
            .lock()
            .map_err(|_| UserPersistenceError::connection("user store poisoned"))
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn insert(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut store = self.guard()?;
        if store.values().any(|existing| existing.email == user.email) {
            return Err(UserPersistenceError::DuplicateEmail {
                email: user.email.clone(),
            });
        }
        store.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, UserPersistenceError> {
        let store = self.guard()?;
        Ok(store.values().find(|user| &user.email == email).cloned())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserPersistenceError> {
        let store = self.guard()?;
        Ok(store.get(&id).cloned())
    }

    async fn find_by_ids(&self, ids: &[UserId]) -> Result<Vec<User>, UserPersistenceError> {
        let store = self.guard()?;
        Ok(ids
            .iter()
            .filter_map(|id| store.get(id).cloned())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::application::test_support::submitted_application;
    use crate::domain::Role;

    fn user(email: &str) -> User {
        let email = Email::new(email).expect("valid email");
        User::new(email, "hash".into(), Role::Citizen, None, None)
    }

    #[tokio::test]
    async fn application_round_trip() {
        let repo = InMemoryApplicationRepository::new();
        let application = submitted_application(UserId::random());
        repo.insert(&application).await.expect("insert");

        let fetched = repo
            .find_by_id(application.id())
            .await
            .expect("find")
            .expect("present");
        assert_eq!(fetched, application);
    }

    #[tokio::test]
    async fn guarded_update_rejects_stale_status() {
        let repo = InMemoryApplicationRepository::new();
        let clerk = UserId::random();
        let submitted = submitted_application(UserId::random());
        repo.insert(&submitted).await.expect("insert");

        // First decision wins.
        let mut approved = submitted.clone();
        approved.approve(clerk).expect("legal");
        repo.update_if_status(&approved, Status::Submitted)
            .await
            .expect("first update");

        // Second decision validated against the old status loses.
        let mut rejected = submitted.clone();
        rejected.reject(clerk, None).expect("legal");
        let err = repo
            .update_if_status(&rejected, Status::Submitted)
            .await
            .expect_err("status moved");
        assert_eq!(
            err,
            ApplicationPersistenceError::StatusMoved {
                id: submitted.id(),
                actual: Status::Approved,
            }
        );

        let stored = repo
            .find_by_id(submitted.id())
            .await
            .expect("find")
            .expect("present");
        assert_eq!(stored.status(), Status::Approved);
        assert_eq!(stored.history().len(), 3);
    }

    #[tokio::test]
    async fn guarded_update_of_missing_application_fails() {
        let repo = InMemoryApplicationRepository::new();
        let application = submitted_application(UserId::random());
        let err = repo
            .update_if_status(&application, Status::Submitted)
            .await
            .expect_err("nothing stored");
        assert!(matches!(err, ApplicationPersistenceError::Missing { .. }));
    }

    #[tokio::test]
    async fn list_filters_by_owner_and_status() {
        let repo = InMemoryApplicationRepository::new();
        let owner = UserId::random();
        let other = UserId::random();
        let mine = submitted_application(owner);
        let theirs = submitted_application(other);
        repo.insert(&mine).await.expect("insert");
        repo.insert(&theirs).await.expect("insert");

        let rows = repo
            .list(ApplicationFilter {
                owner: Some(owner),
                status: None,
                limit: None,
            })
            .await
            .expect("list");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].owner_id(), owner);

        let rows = repo
            .list(ApplicationFilter {
                owner: None,
                status: Some(Status::Draft),
                limit: None,
            })
            .await
            .expect("list");
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn list_orders_newest_first_and_caps() {
        let repo = InMemoryApplicationRepository::new();
        let owner = UserId::random();
        let clerk = UserId::random();
        let older = submitted_application(owner);
        repo.insert(&older).await.expect("insert");

        let mut newer = submitted_application(owner);
        newer.approve(clerk).expect("legal");
        repo.insert(&newer).await.expect("insert");

        let rows = repo
            .list(ApplicationFilter::default())
            .await
            .expect("list");
        assert_eq!(rows[0].id(), newer.id());

        let rows = repo
            .list(ApplicationFilter {
                owner: None,
                status: None,
                limit: Some(1),
            })
            .await
            .expect("list");
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let repo = InMemoryUserRepository::new();
        repo.insert(&user("citizen@example.com")).await.expect("insert");
        let err = repo
            .insert(&user("citizen@example.com"))
            .await
            .expect_err("duplicate");
        assert!(matches!(err, UserPersistenceError::DuplicateEmail { .. }));
    }

    #[tokio::test]
    async fn find_by_ids_skips_unknown() {
        let repo = InMemoryUserRepository::new();
        let known = user("a@example.com");
        repo.insert(&known).await.expect("insert");

        let found = repo
            .find_by_ids(&[known.id, UserId::random()])
            .await
            .expect("find");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, known.id);
    }
}
