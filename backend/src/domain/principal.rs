//! Authenticated actor identity.
//!
//! The authentication collaborator resolves each request's credential into a
//! [`Principal`]; the domain trusts it as given and never inspects tokens.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::user::UserId;

/// Portal role attached to every authenticated actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Submits and resubmits their own applications.
    Citizen,
    /// Reviews submitted applications.
    Clerk,
    /// Reviews applications and may resubmit on a citizen's behalf.
    Admin,
}

impl Role {
    /// Wire name of the role.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Citizen => "citizen",
            Self::Clerk => "clerk",
            Self::Admin => "admin",
        }
    }

    /// Whether this role reviews applications (approve, request info,
    /// reject, inspect any application).
    pub fn is_reviewer(self) -> bool {
        matches!(self, Self::Clerk | Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated actor performing an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: UserId,
    pub role: Role,
}

impl Principal {
    /// Pair an identifier with a role.
    pub fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }
}
