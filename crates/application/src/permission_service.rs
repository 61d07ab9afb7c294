use std::sync::Arc;

use warden_core::{AppError, AppResult, TenantContext};
use warden_domain::{AuditAction, GuardName, Permission};

use crate::cache_ports::forget_permission_names_quietly;
use crate::{
    AuditEvent, AuditRepository, EntityScope, PermissionNameCache, PermissionRepository,
    RbacConfig, TenantSelection,
};

/// Input payload for creating permissions.
#[derive(Debug, Clone, Default)]
pub struct CreatePermissionInput {
    /// Unique permission name within `(tenant, guard)` scope.
    pub name: String,
    /// Guard the permission belongs to; the configured default when absent.
    pub guard: Option<GuardName>,
    /// Optional human-readable title.
    pub title: Option<String>,
    /// Optional free-form description.
    pub description: Option<String>,
    /// Tenant ownership for the new permission.
    pub tenant: TenantSelection,
}

/// Application service for permission entity storage and visibility.
///
/// Creation and deletion invalidate the cached permission-name list after
/// the store write, so the ability interceptor picks the change up on its
/// next read-through.
#[derive(Clone)]
pub struct PermissionService {
    repository: Arc<dyn PermissionRepository>,
    cache: Arc<dyn PermissionNameCache>,
    audit_repository: Arc<dyn AuditRepository>,
    config: RbacConfig,
}

impl PermissionService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        repository: Arc<dyn PermissionRepository>,
        cache: Arc<dyn PermissionNameCache>,
        audit_repository: Arc<dyn AuditRepository>,
        config: RbacConfig,
    ) -> Self {
        Self {
            repository,
            cache,
            audit_repository,
            config,
        }
    }

    /// Creates a permission owned by the effective tenant, emits an audit
    /// event and invalidates the name cache. An explicitly selected tenant
    /// wins over the ambient context.
    pub async fn create(
        &self,
        context: &TenantContext,
        input: CreatePermissionInput,
    ) -> AppResult<Permission> {
        let guard = input
            .guard
            .unwrap_or_else(|| self.config.default_guard.clone());
        let tenant_id = input
            .tenant
            .effective_tenant(self.config.multi_tenant, context);

        let mut permission = Permission::new(input.name, guard, tenant_id)?;
        if let Some(title) = input.title {
            permission = permission.with_title(title);
        }
        if let Some(description) = input.description {
            permission = permission.with_description(description);
        }

        let permission = self.repository.insert(permission).await?;

        self.audit_repository
            .append_event(AuditEvent {
                tenant_id: permission.tenant_id(),
                subject: context.audit_subject().to_owned(),
                action: AuditAction::PermissionCreated,
                resource_type: "rbac_permission".to_owned(),
                resource_id: permission.id().to_string(),
                detail: Some(format!("created permission '{}'", permission.name())),
            })
            .await?;

        forget_permission_names_quietly(self.cache.as_ref()).await;

        Ok(permission)
    }

    /// Finds a permission by name and guard within the caller's visibility.
    pub async fn find_by_name(
        &self,
        context: &TenantContext,
        name: &str,
        guard: &GuardName,
    ) -> AppResult<Permission> {
        let scope = EntityScope::for_context(self.config.multi_tenant, context);

        self.repository
            .find_by_name(name, guard, scope)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("permission '{name}' was not found")))
    }

    /// Lists permissions visible to the caller: the context tenant's own
    /// permissions plus global ones, or every permission for anonymous and
    /// tenant-less contexts.
    pub async fn list_all(&self, context: &TenantContext) -> AppResult<Vec<Permission>> {
        let scope = EntityScope::for_context(self.config.multi_tenant, context);
        self.repository.list_all(scope).await
    }

    /// Lists every permission regardless of tenant, for privileged tooling.
    pub async fn list_all_unscoped(&self) -> AppResult<Vec<Permission>> {
        self.repository.list_all(EntityScope::Unscoped).await
    }

    /// Deletes a permission, emits an audit event and invalidates the name
    /// cache.
    pub async fn delete(&self, context: &TenantContext, permission: &Permission) -> AppResult<()> {
        self.repository.delete(permission.id()).await?;

        self.audit_repository
            .append_event(AuditEvent {
                tenant_id: permission.tenant_id(),
                subject: context.audit_subject().to_owned(),
                action: AuditAction::PermissionDeleted,
                resource_type: "rbac_permission".to_owned(),
                resource_id: permission.id().to_string(),
                detail: Some(format!("deleted permission '{}'", permission.name())),
            })
            .await?;

        forget_permission_names_quietly(self.cache.as_ref()).await;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::Ordering;

    use warden_core::{AppError, TenantContext, TenantId};
    use warden_domain::GuardName;

    use crate::testing::{
        FakeAuditRepository, FakePermissionNameCache, FakePermissionRepository,
    };
    use crate::{RbacConfig, TenantSelection};

    use super::{CreatePermissionInput, PermissionService};

    fn service() -> (PermissionService, Arc<FakePermissionNameCache>) {
        let cache = Arc::new(FakePermissionNameCache::default());
        let service = PermissionService::new(
            Arc::new(FakePermissionRepository::default()),
            cache.clone(),
            Arc::new(FakeAuditRepository::default()),
            RbacConfig::default(),
        );
        (service, cache)
    }

    #[tokio::test]
    async fn create_invalidates_the_name_cache() {
        let context = TenantContext::for_tenant("alice", TenantId::new());
        let (service, cache) = service();
        cache.prime(&["stale"]).await;

        let created = service
            .create(
                &context,
                CreatePermissionInput {
                    name: "edit-users".to_owned(),
                    ..CreatePermissionInput::default()
                },
            )
            .await;
        assert!(created.is_ok());
        assert!(cache.is_empty().await);
        assert_eq!(cache.forget_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn create_succeeds_when_cache_invalidation_fails() {
        let context = TenantContext::for_tenant("alice", TenantId::new());
        let service = PermissionService::new(
            Arc::new(FakePermissionRepository::default()),
            Arc::new(FakePermissionNameCache::failing()),
            Arc::new(FakeAuditRepository::default()),
            RbacConfig::default(),
        );

        let created = service
            .create(
                &context,
                CreatePermissionInput {
                    name: "edit-users".to_owned(),
                    ..CreatePermissionInput::default()
                },
            )
            .await;
        assert!(created.is_ok());
    }

    #[tokio::test]
    async fn duplicate_global_permission_is_a_conflict() {
        let (service, _) = service();

        let input = CreatePermissionInput {
            name: "manage-system".to_owned(),
            tenant: TenantSelection::Global,
            ..CreatePermissionInput::default()
        };
        let first = service.create(&TenantContext::Anonymous, input.clone()).await;
        assert!(first.is_ok());

        let second = service.create(&TenantContext::Anonymous, input).await;
        assert!(matches!(second, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn tenant_scoped_permission_is_invisible_to_other_tenant() {
        let tenant_a = TenantId::new();
        let tenant_b = TenantId::new();
        let (service, _) = service();

        let created = service
            .create(
                &TenantContext::for_tenant("alice", tenant_a),
                CreatePermissionInput {
                    name: "edit-users".to_owned(),
                    ..CreatePermissionInput::default()
                },
            )
            .await;
        assert!(created.is_ok());

        let visible_to_b = service
            .list_all(&TenantContext::for_tenant("bob", tenant_b))
            .await
            .unwrap_or_default();
        assert!(visible_to_b.is_empty());

        let found = service
            .find_by_name(
                &TenantContext::for_tenant("bob", tenant_b),
                "edit-users",
                &GuardName::web(),
            )
            .await;
        assert!(matches!(found, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn global_permission_is_visible_to_every_tenant() {
        let (service, _) = service();

        let created = service
            .create(
                &TenantContext::for_tenant("alice", TenantId::new()),
                CreatePermissionInput {
                    name: "manage-system".to_owned(),
                    tenant: TenantSelection::Global,
                    ..CreatePermissionInput::default()
                },
            )
            .await;
        assert!(created.is_ok());

        for subject in ["alice", "bob"] {
            let listed = service
                .list_all(&TenantContext::for_tenant(subject, TenantId::new()))
                .await
                .unwrap_or_default();
            assert_eq!(listed.len(), 1);
            assert_eq!(listed[0].name(), "manage-system");
        }
    }

    #[tokio::test]
    async fn delete_invalidates_the_name_cache() {
        let context = TenantContext::for_tenant("alice", TenantId::new());
        let (service, cache) = service();

        let permission = service
            .create(
                &context,
                CreatePermissionInput {
                    name: "edit-users".to_owned(),
                    ..CreatePermissionInput::default()
                },
            )
            .await;
        assert!(permission.is_ok());
        cache.prime(&["edit-users"]).await;

        let deleted = service
            .delete(&context, &permission.unwrap_or_else(|_| unreachable!()))
            .await;
        assert!(deleted.is_ok());
        assert!(cache.is_empty().await);
    }
}
