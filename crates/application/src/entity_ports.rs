use async_trait::async_trait;
use warden_core::{AppResult, TenantContext, TenantId};
use warden_domain::{GuardName, Permission, PermissionId, Role, RoleId, Subject};

/// Visibility scope applied to entity-store queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityScope {
    /// No filtering: anonymous contexts, tenant-less subjects, privileged
    /// unscoped reads, and single-tenant deployments.
    Unscoped,
    /// Rows owned by the tenant plus global rows.
    TenantWithGlobal(TenantId),
}

impl EntityScope {
    /// Resolves the scope for a caller context.
    ///
    /// An anonymous context deliberately resolves to [`Self::Unscoped`]:
    /// with no authenticated subject there is no tenant to filter by, so
    /// all rows are returned. A subject without a tenant is likewise
    /// unfiltered.
    #[must_use]
    pub fn for_context(multi_tenant: bool, context: &TenantContext) -> Self {
        if !multi_tenant {
            return Self::Unscoped;
        }

        match context.tenant_id() {
            Some(tenant_id) => Self::TenantWithGlobal(tenant_id),
            None => Self::Unscoped,
        }
    }

    /// Resolves the scope for a subject whose relations are being read.
    #[must_use]
    pub fn for_subject(multi_tenant: bool, subject: &Subject) -> Self {
        if !multi_tenant {
            return Self::Unscoped;
        }

        match subject.tenant_id() {
            Some(tenant_id) => Self::TenantWithGlobal(tenant_id),
            None => Self::Unscoped,
        }
    }

    /// Returns whether a row with the given tenant column passes the scope.
    #[must_use]
    pub fn admits(&self, tenant_id: Option<TenantId>) -> bool {
        match self {
            Self::Unscoped => true,
            Self::TenantWithGlobal(scope_tenant) => {
                tenant_id.is_none() || tenant_id == Some(*scope_tenant)
            }
        }
    }
}

/// Tenant ownership requested for a new entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TenantSelection {
    /// Inherit the ambient tenant from the caller context.
    #[default]
    Ambient,
    /// Pin to a specific tenant regardless of context.
    Tenant(TenantId),
    /// Create a global entity visible to every tenant.
    Global,
}

impl TenantSelection {
    /// Resolves the tenant to stamp onto a new entity. An explicit
    /// selection always wins over the ambient context; the ambient tenant
    /// is only consulted in multi-tenant mode.
    #[must_use]
    pub fn effective_tenant(&self, multi_tenant: bool, context: &TenantContext) -> Option<TenantId> {
        match self {
            Self::Ambient => multi_tenant.then(|| context.tenant_id()).flatten(),
            Self::Tenant(tenant_id) => Some(*tenant_id),
            Self::Global => None,
        }
    }
}

/// Repository port for role records.
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Persists a new role. Fails with `Conflict` when a role with the same
    /// `(tenant_id, name, guard)` exists, where two rows without a tenant
    /// also collide.
    async fn insert(&self, role: Role) -> AppResult<Role>;

    /// Finds a role by identifier.
    async fn find_by_id(&self, role_id: RoleId) -> AppResult<Option<Role>>;

    /// Finds a role by name and guard within the scope. When the scope
    /// admits both a tenant row and a global row with the same name, the
    /// tenant row wins.
    async fn find_by_name(
        &self,
        name: &str,
        guard: &GuardName,
        scope: EntityScope,
    ) -> AppResult<Option<Role>>;

    /// Lists roles visible in the scope, ordered by name.
    async fn list_all(&self, scope: EntityScope) -> AppResult<Vec<Role>>;

    /// Deletes a role. Fails with `NotFound` when the role does not exist.
    async fn delete(&self, role_id: RoleId) -> AppResult<()>;
}

/// Repository port for permission records.
#[async_trait]
pub trait PermissionRepository: Send + Sync {
    /// Persists a new permission. Fails with `Conflict` when a permission
    /// with the same `(tenant_id, name, guard)` exists, where two rows
    /// without a tenant also collide.
    async fn insert(&self, permission: Permission) -> AppResult<Permission>;

    /// Finds a permission by identifier.
    async fn find_by_id(&self, permission_id: PermissionId) -> AppResult<Option<Permission>>;

    /// Finds a permission by name and guard within the scope. When the
    /// scope admits both a tenant row and a global row with the same name,
    /// the tenant row wins.
    async fn find_by_name(
        &self,
        name: &str,
        guard: &GuardName,
        scope: EntityScope,
    ) -> AppResult<Option<Permission>>;

    /// Lists permissions visible in the scope, ordered by name.
    async fn list_all(&self, scope: EntityScope) -> AppResult<Vec<Permission>>;

    /// Deletes a permission. Fails with `NotFound` when it does not exist.
    async fn delete(&self, permission_id: PermissionId) -> AppResult<()>;
}

#[cfg(test)]
mod tests {
    use warden_core::{TenantContext, TenantId};

    use super::{EntityScope, TenantSelection};

    #[test]
    fn anonymous_context_resolves_to_unscoped() {
        let scope = EntityScope::for_context(true, &TenantContext::Anonymous);
        assert_eq!(scope, EntityScope::Unscoped);
    }

    #[test]
    fn tenant_context_admits_own_and_global_rows() {
        let tenant_id = TenantId::new();
        let other_tenant = TenantId::new();
        let scope =
            EntityScope::for_context(true, &TenantContext::for_tenant("alice", tenant_id));

        assert!(scope.admits(Some(tenant_id)));
        assert!(scope.admits(None));
        assert!(!scope.admits(Some(other_tenant)));
    }

    #[test]
    fn single_tenant_mode_never_filters() {
        let tenant_id = TenantId::new();
        let scope = EntityScope::for_context(false, &TenantContext::for_tenant("alice", tenant_id));
        assert_eq!(scope, EntityScope::Unscoped);
    }

    #[test]
    fn explicit_tenant_selection_wins_over_context() {
        let ambient = TenantId::new();
        let explicit = TenantId::new();
        let context = TenantContext::for_tenant("alice", ambient);

        assert_eq!(
            TenantSelection::Tenant(explicit).effective_tenant(true, &context),
            Some(explicit)
        );
        assert_eq!(TenantSelection::Global.effective_tenant(true, &context), None);
        assert_eq!(
            TenantSelection::Ambient.effective_tenant(true, &context),
            Some(ambient)
        );
    }

    #[test]
    fn ambient_selection_is_global_in_single_tenant_mode() {
        let context = TenantContext::for_tenant("alice", TenantId::new());
        assert_eq!(TenantSelection::Ambient.effective_tenant(false, &context), None);
    }
}
