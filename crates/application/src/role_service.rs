use std::sync::Arc;

use warden_core::{AppError, AppResult, TenantContext};
use warden_domain::{AuditAction, GuardName, Role, RoleGrant};

use crate::{
    AssignmentRepository, AuditEvent, AuditRepository, EntityScope, RbacConfig, RoleRepository,
    TenantSelection,
};

/// Input payload for creating roles.
#[derive(Debug, Clone, Default)]
pub struct CreateRoleInput {
    /// Unique role name within `(tenant, guard)` scope.
    pub name: String,
    /// Guard the role belongs to; the configured default when absent.
    pub guard: Option<GuardName>,
    /// Optional human-readable title.
    pub title: Option<String>,
    /// Optional free-form description.
    pub description: Option<String>,
    /// Tenant ownership for the new role.
    pub tenant: TenantSelection,
}

/// Application service for role entity storage and visibility.
#[derive(Clone)]
pub struct RoleService {
    repository: Arc<dyn RoleRepository>,
    assignment_repository: Arc<dyn AssignmentRepository>,
    audit_repository: Arc<dyn AuditRepository>,
    config: RbacConfig,
}

impl RoleService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        repository: Arc<dyn RoleRepository>,
        assignment_repository: Arc<dyn AssignmentRepository>,
        audit_repository: Arc<dyn AuditRepository>,
        config: RbacConfig,
    ) -> Self {
        Self {
            repository,
            assignment_repository,
            audit_repository,
            config,
        }
    }

    /// Creates a role owned by the effective tenant and emits an audit
    /// event. An explicitly selected tenant wins over the ambient context.
    pub async fn create(&self, context: &TenantContext, input: CreateRoleInput) -> AppResult<Role> {
        let guard = input
            .guard
            .unwrap_or_else(|| self.config.default_guard.clone());
        let tenant_id = input
            .tenant
            .effective_tenant(self.config.multi_tenant, context);

        let mut role = Role::new(input.name, guard, tenant_id)?;
        if let Some(title) = input.title {
            role = role.with_title(title);
        }
        if let Some(description) = input.description {
            role = role.with_description(description);
        }

        let role = self.repository.insert(role).await?;

        self.audit_repository
            .append_event(AuditEvent {
                tenant_id: role.tenant_id(),
                subject: context.audit_subject().to_owned(),
                action: AuditAction::RoleCreated,
                resource_type: "rbac_role".to_owned(),
                resource_id: role.id().to_string(),
                detail: Some(format!("created role '{}'", role.name())),
            })
            .await?;

        Ok(role)
    }

    /// Finds a role by name and guard within the caller's visibility.
    pub async fn find_by_name(
        &self,
        context: &TenantContext,
        name: &str,
        guard: &GuardName,
    ) -> AppResult<Role> {
        let scope = EntityScope::for_context(self.config.multi_tenant, context);

        self.repository
            .find_by_name(name, guard, scope)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{name}' was not found")))
    }

    /// Lists roles visible to the caller: the context tenant's own roles
    /// plus global roles, or every role for anonymous and tenant-less
    /// contexts.
    pub async fn list_all(&self, context: &TenantContext) -> AppResult<Vec<Role>> {
        let scope = EntityScope::for_context(self.config.multi_tenant, context);
        self.repository.list_all(scope).await
    }

    /// Lists every role regardless of tenant, for privileged tooling.
    pub async fn list_all_unscoped(&self) -> AppResult<Vec<Role>> {
        self.repository.list_all(EntityScope::Unscoped).await
    }

    /// Lists visible roles joined with their granted permissions.
    pub async fn list_with_permissions(
        &self,
        context: &TenantContext,
    ) -> AppResult<Vec<RoleGrant>> {
        let roles = self.list_all(context).await?;

        let mut grants = Vec::with_capacity(roles.len());
        for role in roles {
            let permissions = self
                .assignment_repository
                .list_role_permissions(role.id())
                .await?;
            grants.push(RoleGrant::new(role, permissions));
        }

        Ok(grants)
    }

    /// Deletes a role and emits an audit event. The configured super-admin
    /// role is protected and cannot be deleted.
    pub async fn delete(&self, context: &TenantContext, role: &Role) -> AppResult<()> {
        if role.name() == self.config.super_admin_role {
            return Err(AppError::Forbidden(format!(
                "role '{}' is protected and cannot be deleted",
                role.name()
            )));
        }

        self.repository.delete(role.id()).await?;

        self.audit_repository
            .append_event(AuditEvent {
                tenant_id: role.tenant_id(),
                subject: context.audit_subject().to_owned(),
                action: AuditAction::RoleDeleted,
                resource_type: "rbac_role".to_owned(),
                resource_id: role.id().to_string(),
                detail: Some(format!("deleted role '{}'", role.name())),
            })
            .await
    }
}
