use std::sync::Arc;

use warden_core::AppResult;
use warden_domain::Subject;

use crate::cache_ports::forget_permission_names_quietly;
use crate::{
    AuthorizationService, EntityScope, PermissionNameCache, PermissionRepository, RbacConfig,
};

/// Outcome of an ability interception.
///
/// `Defer` is structurally distinct from `Deny`: it means the ability did
/// not match a known permission name, so downstream policy checks should
/// run as usual.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The ability is granted; no further checks run.
    Allow,
    /// The ability matched a known permission the subject does not hold;
    /// no further checks run.
    Deny,
    /// The ability is not a known permission name; downstream checks
    /// decide.
    Defer,
}

/// Read-through registry of known permission names backing the ability
/// interceptor.
///
/// One cache key holds every permission name in the system, tenant
/// unscoped. Cache faults are logged and never surface: reads fall back to
/// the store and invalidation failures are swallowed, because a cache
/// outage must not break authorization decisions or block mutations.
#[derive(Clone)]
pub struct PermissionRegistry {
    permission_repository: Arc<dyn PermissionRepository>,
    cache: Arc<dyn PermissionNameCache>,
    authorization: AuthorizationService,
    config: RbacConfig,
}

impl PermissionRegistry {
    /// Creates a new registry from required dependencies.
    #[must_use]
    pub fn new(
        permission_repository: Arc<dyn PermissionRepository>,
        cache: Arc<dyn PermissionNameCache>,
        authorization: AuthorizationService,
        config: RbacConfig,
    ) -> Self {
        Self {
            permission_repository,
            cache,
            authorization,
            config,
        }
    }

    /// Returns the names of every permission in the system, served from
    /// the cache when warm and re-queried from the store on a miss.
    pub async fn all_permission_names(&self) -> AppResult<Vec<String>> {
        match self.cache.get().await {
            Ok(Some(names)) => return Ok(names),
            Ok(None) => {}
            Err(error) => {
                tracing::warn!(
                    "permission name cache read failed, falling back to the store: {error}"
                );
            }
        }

        let permissions = self
            .permission_repository
            .list_all(EntityScope::Unscoped)
            .await?;
        let mut names: Vec<String> = permissions
            .into_iter()
            .map(|permission| permission.name().to_owned())
            .collect();
        names.sort_unstable();
        names.dedup();

        if let Err(error) = self
            .cache
            .set(&names, self.config.cache_ttl_seconds)
            .await
        {
            tracing::warn!("permission name cache write failed and was ignored: {error}");
        }

        Ok(names)
    }

    /// Returns whether a permission with the given name exists anywhere in
    /// the system, as seen through the cache.
    pub async fn permission_exists(&self, name: &str) -> AppResult<bool> {
        Ok(self
            .all_permission_names()
            .await?
            .iter()
            .any(|known| known == name))
    }

    /// Decides an ability check before any downstream policy runs.
    ///
    /// A super-admin is allowed outright. An ability matching a known
    /// permission name is fully decided here from the subject's live
    /// relations. Anything else defers downstream; a permission created
    /// inside the cache TTL window may defer until the cache refreshes.
    pub async fn intercept_ability(&self, subject: &Subject, ability: &str) -> AppResult<Decision> {
        if self.authorization.is_super_admin(subject).await? {
            return Ok(Decision::Allow);
        }

        if !self.permission_exists(ability).await? {
            return Ok(Decision::Defer);
        }

        let allowed = self
            .authorization
            .has_permission(subject, ability, &self.config.default_guard)
            .await?;

        Ok(if allowed {
            Decision::Allow
        } else {
            Decision::Deny
        })
    }

    /// Drops the cached permission names. Cache faults are swallowed.
    pub async fn forget_cached_permissions(&self) {
        forget_permission_names_quietly(self.cache.as_ref()).await;
    }

    /// Alias for [`Self::forget_cached_permissions`].
    pub async fn clear_permission_cache(&self) {
        self.forget_cached_permissions().await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use uuid::Uuid;
    use warden_core::TenantId;
    use warden_domain::{GuardName, Permission, Role, Subject, SubjectRef};

    use crate::testing::{
        FakeAssignmentRepository, FakePermissionNameCache, FakePermissionRepository,
        FakeRoleRepository,
    };
    use crate::{
        AssignmentRepository, AuthorizationService, PermissionRepository, RbacConfig,
        RoleRepository,
    };

    use super::{Decision, PermissionRegistry};

    struct Harness {
        registry: PermissionRegistry,
        role_store: Arc<FakeRoleRepository>,
        permission_store: Arc<FakePermissionRepository>,
        assignments: Arc<FakeAssignmentRepository>,
        cache: Arc<FakePermissionNameCache>,
    }

    fn harness_with_cache(cache: Arc<FakePermissionNameCache>) -> Harness {
        let role_store = Arc::new(FakeRoleRepository::default());
        let permission_store = Arc::new(FakePermissionRepository::default());
        let assignments = Arc::new(FakeAssignmentRepository::with_stores(
            role_store.clone(),
            permission_store.clone(),
        ));
        let authorization =
            AuthorizationService::new(assignments.clone(), RbacConfig::default());
        let registry = PermissionRegistry::new(
            permission_store.clone(),
            cache.clone(),
            authorization,
            RbacConfig::default(),
        );

        Harness {
            registry,
            role_store,
            permission_store,
            assignments,
            cache,
        }
    }

    fn harness() -> Harness {
        harness_with_cache(Arc::new(FakePermissionNameCache::default()))
    }

    async fn store_permission(harness: &Harness, name: &str, tenant_id: Option<TenantId>) -> Permission {
        let permission = Permission::new(name, GuardName::web(), tenant_id);
        assert!(permission.is_ok());
        let permission = permission.unwrap_or_else(|_| unreachable!());
        assert!(
            harness
                .permission_store
                .insert(permission.clone())
                .await
                .is_ok()
        );
        permission
    }

    #[tokio::test]
    async fn read_through_populates_the_cache() {
        let harness = harness();
        store_permission(&harness, "edit-users", None).await;

        assert!(harness.cache.is_empty().await);
        let names = harness.registry.all_permission_names().await;
        assert!(names.is_ok());
        assert_eq!(names.unwrap_or_default(), vec!["edit-users".to_owned()]);
        assert!(!harness.cache.is_empty().await);
    }

    #[tokio::test]
    async fn known_permission_is_fully_decided() {
        let tenant_id = TenantId::new();
        let harness = harness();
        let permission = store_permission(&harness, "edit-users", Some(tenant_id)).await;

        let holder = Subject::new(SubjectRef::user(Uuid::new_v4()), Some(tenant_id));
        assert!(
            harness
                .assignments
                .assign_permissions(&holder, &[permission.id()])
                .await
                .is_ok()
        );
        let bystander = Subject::new(SubjectRef::user(Uuid::new_v4()), Some(tenant_id));

        assert!(matches!(
            harness.registry.intercept_ability(&holder, "edit-users").await,
            Ok(Decision::Allow)
        ));
        assert!(matches!(
            harness
                .registry
                .intercept_ability(&bystander, "edit-users")
                .await,
            Ok(Decision::Deny)
        ));
    }

    #[tokio::test]
    async fn unknown_ability_defers_downstream() {
        let tenant_id = TenantId::new();
        let harness = harness();
        let subject = Subject::new(SubjectRef::user(Uuid::new_v4()), Some(tenant_id));

        assert!(matches!(
            harness
                .registry
                .intercept_ability(&subject, "update-post-42")
                .await,
            Ok(Decision::Defer)
        ));
    }

    #[tokio::test]
    async fn super_admin_is_allowed_for_any_ability() {
        let tenant_id = TenantId::new();
        let harness = harness();
        let subject = Subject::new(SubjectRef::user(Uuid::new_v4()), Some(tenant_id));

        let role = Role::new("super-admin", GuardName::web(), Some(tenant_id));
        assert!(role.is_ok());
        let role = role.unwrap_or_else(|_| unreachable!());
        assert!(harness.role_store.insert(role.clone()).await.is_ok());
        assert!(
            harness
                .assignments
                .assign_roles(&subject, &[role.id()])
                .await
                .is_ok()
        );

        assert!(matches!(
            harness
                .registry
                .intercept_ability(&subject, "anything-whatsoever")
                .await,
            Ok(Decision::Allow)
        ));
    }

    #[tokio::test]
    async fn stale_cache_hides_a_new_permission_until_refresh() {
        let tenant_id = TenantId::new();
        let harness = harness();
        let subject = Subject::new(SubjectRef::user(Uuid::new_v4()), Some(tenant_id));

        // Warm cache from before the permission existed.
        harness.cache.prime(&["edit-users"]).await;
        let permission = store_permission(&harness, "close-accounts", Some(tenant_id)).await;
        assert!(
            harness
                .assignments
                .assign_permissions(&subject, &[permission.id()])
                .await
                .is_ok()
        );

        // The stale name list makes the interceptor defer rather than
        // decide; downstream policy still runs, so this is a gap, not a
        // denial.
        assert!(matches!(
            harness
                .registry
                .intercept_ability(&subject, "close-accounts")
                .await,
            Ok(Decision::Defer)
        ));

        harness.registry.forget_cached_permissions().await;
        assert!(matches!(
            harness
                .registry
                .intercept_ability(&subject, "close-accounts")
                .await,
            Ok(Decision::Allow)
        ));
    }

    #[tokio::test]
    async fn cache_outage_falls_back_to_the_store() {
        let harness = harness_with_cache(Arc::new(FakePermissionNameCache::failing()));
        store_permission(&harness, "edit-users", None).await;

        let names = harness.registry.all_permission_names().await;
        assert!(names.is_ok());
        assert_eq!(names.unwrap_or_default(), vec!["edit-users".to_owned()]);

        // Invalidation against the broken cache is swallowed too.
        harness.registry.clear_permission_cache().await;
    }
}
