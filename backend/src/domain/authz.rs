//! Authorization policy for application operations.
//!
//! All role and ownership rules live in this one table instead of being
//! scattered across handlers. Callers name the operation; the policy decides
//! from the actor's role and, where relevant, ownership.

use super::error::DomainError;
use super::principal::{Principal, Role};
use super::user::UserId;

/// Application operation being authorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Create a new application.
    Create,
    /// List applications (visibility is narrowed separately per role).
    List,
    /// Inspect a single application.
    Get,
    /// Clerk decision: approve, request info, or reject.
    Review,
    /// Resubmit after draft, rejection, or information request.
    Resubmit,
}

/// Decide whether `actor` may perform `operation`.
///
/// `owner` is the owning citizen of the targeted application, where one
/// exists; `Create` and `List` pass `None`.
pub fn authorize(
    operation: Operation,
    actor: &Principal,
    owner: Option<UserId>,
) -> Result<(), DomainError> {
    match operation {
        Operation::Create => {
            if actor.role == Role::Citizen {
                Ok(())
            } else {
                Err(DomainError::forbidden(
                    "only citizens may create applications",
                ))
            }
        }
        Operation::List => Ok(()),
        Operation::Get | Operation::Review => {
            if actor.role.is_reviewer() {
                Ok(())
            } else {
                Err(DomainError::forbidden(
                    "only clerks and admins may review applications",
                ))
            }
        }
        Operation::Resubmit => {
            let is_owner = owner.is_some_and(|owner_id| owner_id == actor.id);
            if is_owner || actor.role == Role::Admin {
                Ok(())
            } else {
                Err(DomainError::forbidden(
                    "not allowed to resubmit this application",
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::ErrorCode;
    use rstest::rstest;

    fn actor(role: Role) -> Principal {
        Principal::new(UserId::random(), role)
    }

    #[rstest]
    #[case(Role::Citizen, true)]
    #[case(Role::Clerk, false)]
    #[case(Role::Admin, false)]
    fn only_citizens_create(#[case] role: Role, #[case] allowed: bool) {
        let result = authorize(Operation::Create, &actor(role), None);
        assert_eq!(result.is_ok(), allowed);
    }

    #[rstest]
    #[case(Role::Citizen)]
    #[case(Role::Clerk)]
    #[case(Role::Admin)]
    fn everyone_lists(#[case] role: Role) {
        authorize(Operation::List, &actor(role), None).expect("listing is always allowed");
    }

    #[rstest]
    #[case(Operation::Get)]
    #[case(Operation::Review)]
    fn citizens_cannot_review(#[case] operation: Operation) {
        let err = authorize(operation, &actor(Role::Citizen), None).expect_err("forbidden");
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }

    #[rstest]
    #[case(Role::Clerk)]
    #[case(Role::Admin)]
    fn reviewers_review(#[case] role: Role) {
        authorize(Operation::Review, &actor(role), None).expect("reviewers allowed");
    }

    #[test]
    fn owner_resubmits_own_application() {
        let citizen = actor(Role::Citizen);
        authorize(Operation::Resubmit, &citizen, Some(citizen.id)).expect("owner allowed");
    }

    #[rstest]
    #[case(Role::Citizen)]
    #[case(Role::Clerk)]
    fn non_owner_resubmit_is_forbidden(#[case] role: Role) {
        let err = authorize(Operation::Resubmit, &actor(role), Some(UserId::random()))
            .expect_err("not the owner");
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }

    #[test]
    fn admin_resubmits_on_behalf_of_citizen() {
        authorize(Operation::Resubmit, &actor(Role::Admin), Some(UserId::random()))
            .expect("admins may resubmit for anyone");
    }
}
