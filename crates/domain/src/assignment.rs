use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use warden_core::{AppError, TenantId};

use crate::{PermissionId, RoleId, SubjectRef};

/// Lifecycle state of an assignment pivot row.
///
/// Revoked rows stay in the store for audit retention and are excluded from
/// every active-state query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    /// The assignment is in effect.
    Active,
    /// The assignment was revoked and is kept as a tombstone.
    Revoked,
}

impl AssignmentStatus {
    /// Returns a stable storage value for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Revoked => "revoked",
        }
    }
}

impl std::str::FromStr for AssignmentStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "active" => Ok(Self::Active),
            "revoked" => Ok(Self::Revoked),
            _ => Err(AppError::Validation(format!(
                "unknown assignment status '{value}'"
            ))),
        }
    }
}

/// Pivot row linking a subject to a role.
///
/// `tenant_id` is the subject's tenant at assignment time, which may differ
/// from the role's own tenant when a global role is assigned to a
/// tenant-scoped subject. Uniqueness holds over
/// `(tenant_id, subject, role_id)` among active rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    subject: SubjectRef,
    role_id: RoleId,
    tenant_id: Option<TenantId>,
    status: AssignmentStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    revoked_at: Option<DateTime<Utc>>,
}

impl RoleAssignment {
    /// Creates a new active assignment stamped with the subject's tenant.
    #[must_use]
    pub fn new(subject: SubjectRef, role_id: RoleId, tenant_id: Option<TenantId>) -> Self {
        let now = Utc::now();

        Self {
            subject,
            role_id,
            tenant_id,
            status: AssignmentStatus::Active,
            created_at: now,
            updated_at: now,
            revoked_at: None,
        }
    }

    /// Returns the assigned subject.
    #[must_use]
    pub fn subject(&self) -> SubjectRef {
        self.subject
    }

    /// Returns the assigned role.
    #[must_use]
    pub fn role_id(&self) -> RoleId {
        self.role_id
    }

    /// Returns the tenant the assignment was made under.
    #[must_use]
    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub fn status(&self) -> AssignmentStatus {
        self.status
    }

    /// Returns the revocation timestamp for tombstoned rows.
    #[must_use]
    pub fn revoked_at(&self) -> Option<DateTime<Utc>> {
        self.revoked_at
    }

    /// Returns whether the assignment is in effect.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == AssignmentStatus::Active
    }

    /// Tombstones the assignment, recording the revocation time.
    pub fn revoke(&mut self) {
        let now = Utc::now();
        self.status = AssignmentStatus::Revoked;
        self.revoked_at = Some(now);
        self.updated_at = now;
    }

    /// Returns whether the row belongs to the given pivot tenant, where
    /// `None` matches only rows assigned without a tenant.
    #[must_use]
    pub fn matches_tenant(&self, tenant_id: Option<TenantId>) -> bool {
        self.tenant_id == tenant_id
    }
}

/// Pivot row linking a subject directly to a permission.
///
/// Carries the same tenant and tombstone semantics as [`RoleAssignment`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionAssignment {
    subject: SubjectRef,
    permission_id: PermissionId,
    tenant_id: Option<TenantId>,
    status: AssignmentStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    revoked_at: Option<DateTime<Utc>>,
}

impl PermissionAssignment {
    /// Creates a new active assignment stamped with the subject's tenant.
    #[must_use]
    pub fn new(
        subject: SubjectRef,
        permission_id: PermissionId,
        tenant_id: Option<TenantId>,
    ) -> Self {
        let now = Utc::now();

        Self {
            subject,
            permission_id,
            tenant_id,
            status: AssignmentStatus::Active,
            created_at: now,
            updated_at: now,
            revoked_at: None,
        }
    }

    /// Returns the assigned subject.
    #[must_use]
    pub fn subject(&self) -> SubjectRef {
        self.subject
    }

    /// Returns the assigned permission.
    #[must_use]
    pub fn permission_id(&self) -> PermissionId {
        self.permission_id
    }

    /// Returns the tenant the assignment was made under.
    #[must_use]
    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub fn status(&self) -> AssignmentStatus {
        self.status
    }

    /// Returns the revocation timestamp for tombstoned rows.
    #[must_use]
    pub fn revoked_at(&self) -> Option<DateTime<Utc>> {
        self.revoked_at
    }

    /// Returns whether the assignment is in effect.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == AssignmentStatus::Active
    }

    /// Tombstones the assignment, recording the revocation time.
    pub fn revoke(&mut self) {
        let now = Utc::now();
        self.status = AssignmentStatus::Revoked;
        self.revoked_at = Some(now);
        self.updated_at = now;
    }

    /// Returns whether the row belongs to the given pivot tenant, where
    /// `None` matches only rows assigned without a tenant.
    #[must_use]
    pub fn matches_tenant(&self, tenant_id: Option<TenantId>) -> bool {
        self.tenant_id == tenant_id
    }
}
