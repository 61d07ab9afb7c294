use serde::{Deserialize, Serialize};

/// Stable audit actions emitted by authorization mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Emitted when a role is created.
    RoleCreated,
    /// Emitted when a role is deleted.
    RoleDeleted,
    /// Emitted when a permission is created.
    PermissionCreated,
    /// Emitted when a permission is deleted.
    PermissionDeleted,
    /// Emitted when a role is assigned to a subject.
    RoleAssigned,
    /// Emitted when a role assignment is revoked.
    RoleRevoked,
    /// Emitted when a subject's role set is replaced.
    RolesSynced,
    /// Emitted when a permission is granted straight to a subject.
    PermissionAssigned,
    /// Emitted when a direct permission grant is revoked.
    PermissionRevoked,
    /// Emitted when a subject's direct permission set is replaced.
    PermissionsSynced,
    /// Emitted when a permission is granted to a role.
    RolePermissionGranted,
    /// Emitted when a permission is removed from a role.
    RolePermissionRevoked,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RoleCreated => "rbac.role.created",
            Self::RoleDeleted => "rbac.role.deleted",
            Self::PermissionCreated => "rbac.permission.created",
            Self::PermissionDeleted => "rbac.permission.deleted",
            Self::RoleAssigned => "rbac.role.assigned",
            Self::RoleRevoked => "rbac.role.revoked",
            Self::RolesSynced => "rbac.roles.synced",
            Self::PermissionAssigned => "rbac.permission.assigned",
            Self::PermissionRevoked => "rbac.permission.revoked",
            Self::PermissionsSynced => "rbac.permissions.synced",
            Self::RolePermissionGranted => "rbac.role_permission.granted",
            Self::RolePermissionRevoked => "rbac.role_permission.revoked",
        }
    }
}
