use std::sync::Arc;

use warden_core::{AppError, AppResult};
use warden_domain::{AuditAction, Permission, Role, Subject};

use crate::cache_ports::forget_permission_names_quietly;
use crate::{
    AssignmentRepository, AuditEvent, AuditRepository, EntityScope, PermissionNameCache,
    PermissionRef, PermissionRepository, RbacConfig, RoleRef, RoleRepository,
};

/// Application service linking subjects to roles and permissions, and roles
/// to permissions.
///
/// Every subject-facing mutation is keyed by the subject's tenant: pivot
/// rows are stamped with it on assignment and only rows carrying it are
/// revoked or replaced, so identically-named entities assigned under other
/// tenants are never touched. Name references resolve within the subject's
/// visibility (own tenant first, then global) under the default guard.
#[derive(Clone)]
pub struct AssignmentService {
    role_repository: Arc<dyn RoleRepository>,
    permission_repository: Arc<dyn PermissionRepository>,
    assignment_repository: Arc<dyn AssignmentRepository>,
    cache: Arc<dyn PermissionNameCache>,
    audit_repository: Arc<dyn AuditRepository>,
    config: RbacConfig,
}

impl AssignmentService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        role_repository: Arc<dyn RoleRepository>,
        permission_repository: Arc<dyn PermissionRepository>,
        assignment_repository: Arc<dyn AssignmentRepository>,
        cache: Arc<dyn PermissionNameCache>,
        audit_repository: Arc<dyn AuditRepository>,
        config: RbacConfig,
    ) -> Self {
        Self {
            role_repository,
            permission_repository,
            assignment_repository,
            cache,
            audit_repository,
            config,
        }
    }

    /// Assigns roles to a subject. Roles already actively assigned under
    /// the subject's tenant are skipped without error.
    pub async fn assign_roles(&self, subject: &Subject, refs: &[RoleRef]) -> AppResult<()> {
        let roles = self.resolve_roles(subject, refs).await?;
        let role_ids: Vec<_> = roles.iter().map(Role::id).collect();

        self.assignment_repository
            .assign_roles(subject, &role_ids)
            .await?;

        for role in &roles {
            self.append_subject_event(
                subject,
                AuditAction::RoleAssigned,
                "rbac_subject_role",
                role.name(),
                format!(
                    "assigned role '{}' to '{}'",
                    role.name(),
                    subject.subject_ref()
                ),
            )
            .await?;
        }

        forget_permission_names_quietly(self.cache.as_ref()).await;
        Ok(())
    }

    /// Revokes role assignments scoped to the subject's tenant. Roles not
    /// currently assigned are skipped without error.
    pub async fn revoke_roles(&self, subject: &Subject, refs: &[RoleRef]) -> AppResult<()> {
        let roles = self.resolve_roles(subject, refs).await?;
        let role_ids: Vec<_> = roles.iter().map(Role::id).collect();

        self.assignment_repository
            .revoke_roles(subject, &role_ids)
            .await?;

        for role in &roles {
            self.append_subject_event(
                subject,
                AuditAction::RoleRevoked,
                "rbac_subject_role",
                role.name(),
                format!(
                    "revoked role '{}' from '{}'",
                    role.name(),
                    subject.subject_ref()
                ),
            )
            .await?;
        }

        forget_permission_names_quietly(self.cache.as_ref()).await;
        Ok(())
    }

    /// Replaces the subject's role set within the subject's tenant.
    pub async fn sync_roles(&self, subject: &Subject, refs: &[RoleRef]) -> AppResult<()> {
        let roles = self.resolve_roles(subject, refs).await?;
        let role_ids: Vec<_> = roles.iter().map(Role::id).collect();

        self.assignment_repository
            .sync_roles(subject, &role_ids)
            .await?;

        let names: Vec<&str> = roles.iter().map(Role::name).collect();
        self.append_subject_event(
            subject,
            AuditAction::RolesSynced,
            "rbac_subject_role",
            "roles",
            format!(
                "replaced roles of '{}' with [{}]",
                subject.subject_ref(),
                names.join(", ")
            ),
        )
        .await?;

        forget_permission_names_quietly(self.cache.as_ref()).await;
        Ok(())
    }

    /// Grants permissions straight to a subject. Permissions already
    /// actively assigned under the subject's tenant are skipped.
    pub async fn assign_permissions(
        &self,
        subject: &Subject,
        refs: &[PermissionRef],
    ) -> AppResult<()> {
        let permissions = self.resolve_permissions(subject, refs).await?;
        let permission_ids: Vec<_> = permissions.iter().map(Permission::id).collect();

        self.assignment_repository
            .assign_permissions(subject, &permission_ids)
            .await?;

        for permission in &permissions {
            self.append_subject_event(
                subject,
                AuditAction::PermissionAssigned,
                "rbac_subject_permission",
                permission.name(),
                format!(
                    "granted permission '{}' to '{}'",
                    permission.name(),
                    subject.subject_ref()
                ),
            )
            .await?;
        }

        forget_permission_names_quietly(self.cache.as_ref()).await;
        Ok(())
    }

    /// Revokes direct permission grants scoped to the subject's tenant.
    pub async fn revoke_permissions(
        &self,
        subject: &Subject,
        refs: &[PermissionRef],
    ) -> AppResult<()> {
        let permissions = self.resolve_permissions(subject, refs).await?;
        let permission_ids: Vec<_> = permissions.iter().map(Permission::id).collect();

        self.assignment_repository
            .revoke_permissions(subject, &permission_ids)
            .await?;

        for permission in &permissions {
            self.append_subject_event(
                subject,
                AuditAction::PermissionRevoked,
                "rbac_subject_permission",
                permission.name(),
                format!(
                    "revoked permission '{}' from '{}'",
                    permission.name(),
                    subject.subject_ref()
                ),
            )
            .await?;
        }

        forget_permission_names_quietly(self.cache.as_ref()).await;
        Ok(())
    }

    /// Replaces the subject's direct permission set within the subject's
    /// tenant.
    pub async fn sync_permissions(
        &self,
        subject: &Subject,
        refs: &[PermissionRef],
    ) -> AppResult<()> {
        let permissions = self.resolve_permissions(subject, refs).await?;
        let permission_ids: Vec<_> = permissions.iter().map(Permission::id).collect();

        self.assignment_repository
            .sync_permissions(subject, &permission_ids)
            .await?;

        let names: Vec<&str> = permissions.iter().map(Permission::name).collect();
        self.append_subject_event(
            subject,
            AuditAction::PermissionsSynced,
            "rbac_subject_permission",
            "permissions",
            format!(
                "replaced direct permissions of '{}' with [{}]",
                subject.subject_ref(),
                names.join(", ")
            ),
        )
        .await?;

        forget_permission_names_quietly(self.cache.as_ref()).await;
        Ok(())
    }

    /// Grants a permission to a role. The link has no tenant dimension.
    pub async fn grant_role_permission(
        &self,
        role_ref: &RoleRef,
        permission_ref: &PermissionRef,
    ) -> AppResult<()> {
        let role = self.resolve_role(EntityScope::Unscoped, role_ref).await?;
        let permission = self
            .resolve_permission(EntityScope::Unscoped, permission_ref)
            .await?;

        self.assignment_repository
            .grant_role_permission(role.id(), permission.id())
            .await?;

        self.append_role_permission_event(
            &role,
            AuditAction::RolePermissionGranted,
            &permission,
            format!(
                "granted permission '{}' to role '{}'",
                permission.name(),
                role.name()
            ),
        )
        .await?;

        forget_permission_names_quietly(self.cache.as_ref()).await;
        Ok(())
    }

    /// Removes a permission from a role.
    pub async fn revoke_role_permission(
        &self,
        role_ref: &RoleRef,
        permission_ref: &PermissionRef,
    ) -> AppResult<()> {
        let role = self.resolve_role(EntityScope::Unscoped, role_ref).await?;
        let permission = self
            .resolve_permission(EntityScope::Unscoped, permission_ref)
            .await?;

        self.assignment_repository
            .revoke_role_permission(role.id(), permission.id())
            .await?;

        self.append_role_permission_event(
            &role,
            AuditAction::RolePermissionRevoked,
            &permission,
            format!(
                "removed permission '{}' from role '{}'",
                permission.name(),
                role.name()
            ),
        )
        .await?;

        forget_permission_names_quietly(self.cache.as_ref()).await;
        Ok(())
    }

    /// Replaces a role's permission set.
    pub async fn sync_role_permissions(
        &self,
        role_ref: &RoleRef,
        permission_refs: &[PermissionRef],
    ) -> AppResult<()> {
        let role = self.resolve_role(EntityScope::Unscoped, role_ref).await?;

        let mut permissions = Vec::with_capacity(permission_refs.len());
        for permission_ref in permission_refs {
            permissions.push(
                self.resolve_permission(EntityScope::Unscoped, permission_ref)
                    .await?,
            );
        }
        let permission_ids: Vec<_> = permissions.iter().map(Permission::id).collect();

        self.assignment_repository
            .sync_role_permissions(role.id(), &permission_ids)
            .await?;

        let names: Vec<&str> = permissions.iter().map(Permission::name).collect();
        self.audit_repository
            .append_event(AuditEvent {
                tenant_id: role.tenant_id(),
                subject: role.id().to_string(),
                action: AuditAction::RolePermissionGranted,
                resource_type: "rbac_role_permission".to_owned(),
                resource_id: role.name().to_owned(),
                detail: Some(format!(
                    "replaced permissions of role '{}' with [{}]",
                    role.name(),
                    names.join(", ")
                )),
            })
            .await?;

        forget_permission_names_quietly(self.cache.as_ref()).await;
        Ok(())
    }

    /// Lists the permissions granted to a role.
    pub async fn role_permissions(&self, role_ref: &RoleRef) -> AppResult<Vec<Permission>> {
        let role = self.resolve_role(EntityScope::Unscoped, role_ref).await?;
        self.assignment_repository
            .list_role_permissions(role.id())
            .await
    }

    async fn resolve_roles(&self, subject: &Subject, refs: &[RoleRef]) -> AppResult<Vec<Role>> {
        let scope = EntityScope::for_subject(self.config.multi_tenant, subject);

        let mut roles = Vec::with_capacity(refs.len());
        for role_ref in refs {
            roles.push(self.resolve_role(scope, role_ref).await?);
        }
        Ok(roles)
    }

    async fn resolve_role(&self, scope: EntityScope, role_ref: &RoleRef) -> AppResult<Role> {
        match role_ref {
            RoleRef::Id(role_id) => self
                .role_repository
                .find_by_id(*role_id)
                .await?
                .filter(|role| scope.admits(role.tenant_id()))
                .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' was not found"))),
            RoleRef::Name(name) => self
                .role_repository
                .find_by_name(name, &self.config.default_guard, scope)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("role '{name}' was not found"))),
            RoleRef::Entity(role) => Ok(role.clone()),
        }
    }

    async fn resolve_permissions(
        &self,
        subject: &Subject,
        refs: &[PermissionRef],
    ) -> AppResult<Vec<Permission>> {
        let scope = EntityScope::for_subject(self.config.multi_tenant, subject);

        let mut permissions = Vec::with_capacity(refs.len());
        for permission_ref in refs {
            permissions.push(self.resolve_permission(scope, permission_ref).await?);
        }
        Ok(permissions)
    }

    async fn resolve_permission(
        &self,
        scope: EntityScope,
        permission_ref: &PermissionRef,
    ) -> AppResult<Permission> {
        match permission_ref {
            PermissionRef::Id(permission_id) => self
                .permission_repository
                .find_by_id(*permission_id)
                .await?
                .filter(|permission| scope.admits(permission.tenant_id()))
                .ok_or_else(|| {
                    AppError::NotFound(format!("permission '{permission_id}' was not found"))
                }),
            PermissionRef::Name(name) => self
                .permission_repository
                .find_by_name(name, &self.config.default_guard, scope)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("permission '{name}' was not found"))),
            PermissionRef::Entity(permission) => Ok(permission.clone()),
        }
    }

    async fn append_subject_event(
        &self,
        subject: &Subject,
        action: AuditAction,
        resource_type: &str,
        entity_name: &str,
        detail: String,
    ) -> AppResult<()> {
        self.audit_repository
            .append_event(AuditEvent {
                tenant_id: subject.tenant_id(),
                subject: subject.subject_ref().to_string(),
                action,
                resource_type: resource_type.to_owned(),
                resource_id: format!("{}:{entity_name}", subject.subject_ref()),
                detail: Some(detail),
            })
            .await
    }

    async fn append_role_permission_event(
        &self,
        role: &Role,
        action: AuditAction,
        permission: &Permission,
        detail: String,
    ) -> AppResult<()> {
        self.audit_repository
            .append_event(AuditEvent {
                tenant_id: role.tenant_id(),
                subject: role.id().to_string(),
                action,
                resource_type: "rbac_role_permission".to_owned(),
                resource_id: format!("{}:{}", role.name(), permission.name()),
                detail: Some(detail),
            })
            .await
    }
}
