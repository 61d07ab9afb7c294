use async_trait::async_trait;
use tokio::sync::RwLock;
use warden_application::{EntityScope, PermissionRepository};
use warden_core::{AppError, AppResult};
use warden_domain::{GuardName, Permission, PermissionId};

/// In-memory permission repository implementation.
#[derive(Debug, Default)]
pub struct InMemoryPermissionRepository {
    permissions: RwLock<Vec<Permission>>,
}

impl InMemoryPermissionRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PermissionRepository for InMemoryPermissionRepository {
    async fn insert(&self, permission: Permission) -> AppResult<Permission> {
        let mut permissions = self.permissions.write().await;

        let duplicate = permissions.iter().any(|stored| {
            stored.tenant_id() == permission.tenant_id()
                && stored.name() == permission.name()
                && stored.guard() == permission.guard()
        });
        if duplicate {
            return Err(AppError::Conflict(format!(
                "permission '{}' already exists for guard '{}'",
                permission.name(),
                permission.guard()
            )));
        }

        permissions.push(permission.clone());
        Ok(permission)
    }

    async fn find_by_id(&self, permission_id: PermissionId) -> AppResult<Option<Permission>> {
        Ok(self
            .permissions
            .read()
            .await
            .iter()
            .find(|stored| stored.id() == permission_id)
            .cloned())
    }

    async fn find_by_name(
        &self,
        name: &str,
        guard: &GuardName,
        scope: EntityScope,
    ) -> AppResult<Option<Permission>> {
        let permissions = self.permissions.read().await;

        let mut matches: Vec<Permission> = permissions
            .iter()
            .filter(|stored| {
                stored.name() == name
                    && stored.guard() == guard
                    && scope.admits(stored.tenant_id())
            })
            .cloned()
            .collect();

        // A tenant-owned row shadows a global row with the same name.
        matches.sort_by_key(|stored| stored.tenant_id().is_none());
        Ok(matches.into_iter().next())
    }

    async fn list_all(&self, scope: EntityScope) -> AppResult<Vec<Permission>> {
        let permissions = self.permissions.read().await;

        let mut listed: Vec<Permission> = permissions
            .iter()
            .filter(|stored| scope.admits(stored.tenant_id()))
            .cloned()
            .collect();
        listed.sort_by(|left, right| left.name().cmp(right.name()));

        Ok(listed)
    }

    async fn delete(&self, permission_id: PermissionId) -> AppResult<()> {
        let mut permissions = self.permissions.write().await;
        let before = permissions.len();
        permissions.retain(|stored| stored.id() != permission_id);

        if permissions.len() == before {
            return Err(AppError::NotFound(format!(
                "permission '{permission_id}' was not found"
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use warden_application::{EntityScope, PermissionRepository};
    use warden_core::TenantId;
    use warden_domain::{GuardName, Permission};

    use super::InMemoryPermissionRepository;

    fn permission(name: &str, tenant_id: Option<TenantId>) -> Permission {
        Permission::new(name, GuardName::web(), tenant_id).unwrap_or_else(|_| unreachable!())
    }

    #[tokio::test]
    async fn global_permission_is_visible_in_every_tenant_scope() {
        let repository = InMemoryPermissionRepository::new();
        assert!(repository.insert(permission("manage-system", None)).await.is_ok());

        for _ in 0..2 {
            let listed = repository
                .list_all(EntityScope::TenantWithGlobal(TenantId::new()))
                .await
                .unwrap_or_default();
            assert_eq!(listed.len(), 1);
        }
    }

    #[tokio::test]
    async fn tenant_permission_is_hidden_from_other_tenants() {
        let repository = InMemoryPermissionRepository::new();
        let tenant_a = TenantId::new();
        let tenant_b = TenantId::new();

        assert!(
            repository
                .insert(permission("edit-users", Some(tenant_a)))
                .await
                .is_ok()
        );

        let visible_to_a = repository
            .list_all(EntityScope::TenantWithGlobal(tenant_a))
            .await
            .unwrap_or_default();
        assert_eq!(visible_to_a.len(), 1);

        let visible_to_b = repository
            .list_all(EntityScope::TenantWithGlobal(tenant_b))
            .await
            .unwrap_or_default();
        assert!(visible_to_b.is_empty());
    }

    #[tokio::test]
    async fn duplicate_in_same_tenant_is_a_conflict() {
        let repository = InMemoryPermissionRepository::new();
        let tenant_id = TenantId::new();

        assert!(
            repository
                .insert(permission("edit-users", Some(tenant_id)))
                .await
                .is_ok()
        );
        let second = repository.insert(permission("edit-users", Some(tenant_id))).await;
        assert!(second.is_err());
    }
}
