use uuid::Uuid;
use warden_core::{AppError, AppResult};
use warden_domain::{Permission, PermissionId, Role, RoleId};

/// Caller-supplied reference to a role: an identifier, a name, or the
/// entity itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleRef {
    /// Reference by stable identifier.
    Id(RoleId),
    /// Reference by name, resolved within the subject's visibility scope
    /// under the default guard.
    Name(String),
    /// An already-loaded entity, used as-is.
    Entity(Role),
}

impl RoleRef {
    /// Parses a textual reference: a UUID becomes an id reference,
    /// anything else a name reference. Blank input is rejected.
    pub fn parse(value: &str) -> AppResult<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "role reference must not be empty".to_owned(),
            ));
        }

        match Uuid::parse_str(trimmed) {
            Ok(id) => Ok(Self::Id(RoleId::from_uuid(id))),
            Err(_) => Ok(Self::Name(trimmed.to_owned())),
        }
    }
}

impl From<RoleId> for RoleRef {
    fn from(value: RoleId) -> Self {
        Self::Id(value)
    }
}

impl From<Role> for RoleRef {
    fn from(value: Role) -> Self {
        Self::Entity(value)
    }
}

/// Caller-supplied reference to a permission: an identifier, a name, or
/// the entity itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionRef {
    /// Reference by stable identifier.
    Id(PermissionId),
    /// Reference by name, resolved within the subject's visibility scope
    /// under the default guard.
    Name(String),
    /// An already-loaded entity, used as-is.
    Entity(Permission),
}

impl PermissionRef {
    /// Parses a textual reference: a UUID becomes an id reference,
    /// anything else a name reference. Blank input is rejected.
    pub fn parse(value: &str) -> AppResult<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "permission reference must not be empty".to_owned(),
            ));
        }

        match Uuid::parse_str(trimmed) {
            Ok(id) => Ok(Self::Id(PermissionId::from_uuid(id))),
            Err(_) => Ok(Self::Name(trimmed.to_owned())),
        }
    }
}

impl From<PermissionId> for PermissionRef {
    fn from(value: PermissionId) -> Self {
        Self::Id(value)
    }
}

impl From<Permission> for PermissionRef {
    fn from(value: Permission) -> Self {
        Self::Entity(value)
    }
}
