use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use warden_core::{AppResult, NonEmptyString, TenantId};

use crate::GuardName;

/// Unique identifier for a permission record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermissionId(Uuid);

impl PermissionId {
    /// Creates a new random permission identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a permission identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for PermissionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PermissionId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// A named capability, owned by one tenant or global.
///
/// Shares the `(tenant_id, name, guard)` uniqueness rule with [`crate::Role`],
/// including the case where both tenant columns are absent. Two tenants may
/// each own a permission with the same name; those are distinct entities
/// with distinct identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    id: PermissionId,
    tenant_id: Option<TenantId>,
    name: NonEmptyString,
    guard: GuardName,
    title: Option<String>,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Permission {
    /// Creates a new permission with a fresh identifier and current timestamps.
    pub fn new(
        name: impl Into<String>,
        guard: GuardName,
        tenant_id: Option<TenantId>,
    ) -> AppResult<Self> {
        let now = Utc::now();

        Ok(Self {
            id: PermissionId::new(),
            tenant_id,
            name: NonEmptyString::new(name)?,
            guard,
            title: None,
            description: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Rebuilds a permission from stored column values.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: PermissionId,
        tenant_id: Option<TenantId>,
        name: impl Into<String>,
        guard: GuardName,
        title: Option<String>,
        description: Option<String>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> AppResult<Self> {
        Ok(Self {
            id,
            tenant_id,
            name: NonEmptyString::new(name)?,
            guard,
            title,
            description,
            created_at,
            updated_at,
        })
    }

    /// Attaches a human-readable title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Attaches a free-form description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Returns the stable permission identifier.
    #[must_use]
    pub fn id(&self) -> PermissionId {
        self.id
    }

    /// Returns the owning tenant, or `None` for a global permission.
    #[must_use]
    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    /// Returns the permission name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the guard the permission belongs to.
    #[must_use]
    pub fn guard(&self) -> &GuardName {
        &self.guard
    }

    /// Returns the optional human-readable title.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Returns the optional description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last-update timestamp.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the title when present, otherwise the name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.title.as_deref().unwrap_or(self.name.as_str())
    }

    /// Returns whether the permission is visible to every tenant.
    #[must_use]
    pub fn is_global(&self) -> bool {
        self.tenant_id.is_none()
    }

    /// Returns whether the permission is owned by the given tenant.
    #[must_use]
    pub fn belongs_to_tenant(&self, tenant_id: TenantId) -> bool {
        self.tenant_id == Some(tenant_id)
    }
}
