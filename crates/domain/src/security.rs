use std::collections::BTreeSet;
use std::str::FromStr;

use ruleflow_core::{AppError, AppResult, UserIdentity};
use serde::{Deserialize, Serialize};

/// Privileges checked by workflow definition lifecycle operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Allows reading workflow definitions.
    WorkflowRead,
    /// Allows creating workflow definitions.
    WorkflowCreate,
    /// Allows updating, activating and deactivating workflow definitions.
    WorkflowUpdate,
}

impl Permission {
    /// Returns a stable storage value for this permission.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WorkflowRead => "workflow.read",
            Self::WorkflowCreate => "workflow.create",
            Self::WorkflowUpdate => "workflow.update",
        }
    }
}

impl FromStr for Permission {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "workflow.read" => Ok(Self::WorkflowRead),
            "workflow.create" => Ok(Self::WorkflowCreate),
            "workflow.update" => Ok(Self::WorkflowUpdate),
            _ => Err(AppError::Validation(format!(
                "unknown permission value '{value}'"
            ))),
        }
    }
}

/// Authenticated user together with the privileges granted to them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    identity: UserIdentity,
    permissions: BTreeSet<Permission>,
}

impl Actor {
    /// Creates an actor.
    #[must_use]
    pub fn new(identity: UserIdentity, permissions: impl IntoIterator<Item = Permission>) -> Self {
        Self {
            identity,
            permissions: permissions.into_iter().collect(),
        }
    }

    /// Returns the actor identity.
    #[must_use]
    pub fn identity(&self) -> &UserIdentity {
        &self.identity
    }

    /// Fails with `Forbidden` unless the actor holds the permission.
    pub fn require(&self, permission: Permission) -> AppResult<()> {
        if self.permissions.contains(&permission) {
            return Ok(());
        }

        Err(AppError::Forbidden(format!(
            "user '{}' lacks permission '{}'",
            self.identity.user_id(),
            permission.as_str()
        )))
    }
}
