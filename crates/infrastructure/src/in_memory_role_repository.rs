use async_trait::async_trait;
use tokio::sync::RwLock;
use warden_application::{EntityScope, RoleRepository};
use warden_core::{AppError, AppResult};
use warden_domain::{GuardName, Role, RoleId};

/// In-memory role repository implementation.
#[derive(Debug, Default)]
pub struct InMemoryRoleRepository {
    roles: RwLock<Vec<Role>>,
}

impl InMemoryRoleRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoleRepository for InMemoryRoleRepository {
    async fn insert(&self, role: Role) -> AppResult<Role> {
        let mut roles = self.roles.write().await;

        let duplicate = roles.iter().any(|stored| {
            stored.tenant_id() == role.tenant_id()
                && stored.name() == role.name()
                && stored.guard() == role.guard()
        });
        if duplicate {
            return Err(AppError::Conflict(format!(
                "role '{}' already exists for guard '{}'",
                role.name(),
                role.guard()
            )));
        }

        roles.push(role.clone());
        Ok(role)
    }

    async fn find_by_id(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        Ok(self
            .roles
            .read()
            .await
            .iter()
            .find(|stored| stored.id() == role_id)
            .cloned())
    }

    async fn find_by_name(
        &self,
        name: &str,
        guard: &GuardName,
        scope: EntityScope,
    ) -> AppResult<Option<Role>> {
        let roles = self.roles.read().await;

        let mut matches: Vec<Role> = roles
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

    async fn list_all(&self, scope: EntityScope) -> AppResult<Vec<Role>> {
        let roles = self.roles.read().await;

        let mut listed: Vec<Role> = roles
            .iter()
            .filter(|stored| scope.admits(stored.tenant_id()))
            .cloned()
            .collect();
        listed.sort_by(|left, right| left.name().cmp(right.name()));

        Ok(listed)
    }

    async fn delete(&self, role_id: RoleId) -> AppResult<()> {
        let mut roles = self.roles.write().await;
        let before = roles.len();
        roles.retain(|stored| stored.id() != role_id);

        if roles.len() == before {
            return Err(AppError::NotFound(format!(
                "role '{role_id}' was not found"
            )));
        }

        Ok(())
    }
}
