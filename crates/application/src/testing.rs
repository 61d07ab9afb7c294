//! Shared in-memory fakes for application service tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;
use warden_core::{AppError, AppResult};
use warden_domain::{
    GuardName, Permission, PermissionAssignment, PermissionId, Role, RoleAssignment, RoleGrant,
    RoleId, Subject, SubjectGrants,
};

use crate::{
    AssignmentRepository, AuditEvent, AuditRepository, EntityScope, PermissionNameCache,
    PermissionRepository, RoleRepository,
};

#[derive(Default)]
pub(crate) struct FakeRoleRepository {
    roles: Mutex<Vec<Role>>,
}

#[async_trait]
impl RoleRepository for FakeRoleRepository {
    async fn insert(&self, role: Role) -> AppResult<Role> {
        let mut roles = self.roles.lock().await;
        let duplicate = roles.iter().any(|stored| {
            stored.tenant_id() == role.tenant_id()
                && stored.name() == role.name()
                && stored.guard() == role.guard()
        });
        if duplicate {
            return Err(AppError::Conflict(format!(
                "role '{}' already exists",
                role.name()
            )));
        }

        roles.push(role.clone());
        Ok(role)
    }

    async fn find_by_id(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        Ok(self
            .roles
            .lock()
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
        let roles = self.roles.lock().await;
        let mut matches: Vec<Role> = roles
            .iter()
            .filter(|stored| {
                stored.name() == name
                    && stored.guard() == guard
                    && scope.admits(stored.tenant_id())
            })
            .cloned()
            .collect();
        matches.sort_by_key(|stored| stored.tenant_id().is_none());
        Ok(matches.into_iter().next())
    }

    async fn list_all(&self, scope: EntityScope) -> AppResult<Vec<Role>> {
        let roles = self.roles.lock().await;
        let mut listed: Vec<Role> = roles
            .iter()
            .filter(|stored| scope.admits(stored.tenant_id()))
            .cloned()
            .collect();
        listed.sort_by(|left, right| left.name().cmp(right.name()));
        Ok(listed)
    }

    async fn delete(&self, role_id: RoleId) -> AppResult<()> {
        let mut roles = self.roles.lock().await;
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

#[derive(Default)]
pub(crate) struct FakePermissionRepository {
    permissions: Mutex<Vec<Permission>>,
}

#[async_trait]
impl PermissionRepository for FakePermissionRepository {
    async fn insert(&self, permission: Permission) -> AppResult<Permission> {
        let mut permissions = self.permissions.lock().await;
        let duplicate = permissions.iter().any(|stored| {
            stored.tenant_id() == permission.tenant_id()
                && stored.name() == permission.name()
                && stored.guard() == permission.guard()
        });
        if duplicate {
            return Err(AppError::Conflict(format!(
                "permission '{}' already exists",
                permission.name()
            )));
        }

        permissions.push(permission.clone());
        Ok(permission)
    }

    async fn find_by_id(&self, permission_id: PermissionId) -> AppResult<Option<Permission>> {
        Ok(self
            .permissions
            .lock()
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
        let permissions = self.permissions.lock().await;
        let mut matches: Vec<Permission> = permissions
            .iter()
            .filter(|stored| {
                stored.name() == name
                    && stored.guard() == guard
                    && scope.admits(stored.tenant_id())
            })
            .cloned()
            .collect();
        matches.sort_by_key(|stored| stored.tenant_id().is_none());
        Ok(matches.into_iter().next())
    }

    async fn list_all(&self, scope: EntityScope) -> AppResult<Vec<Permission>> {
        let permissions = self.permissions.lock().await;
        let mut listed: Vec<Permission> = permissions
            .iter()
            .filter(|stored| scope.admits(stored.tenant_id()))
            .cloned()
            .collect();
        listed.sort_by(|left, right| left.name().cmp(right.name()));
        Ok(listed)
    }

    async fn delete(&self, permission_id: PermissionId) -> AppResult<()> {
        let mut permissions = self.permissions.lock().await;
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

#[derive(Default)]
pub(crate) struct FakeAssignmentRepository {
    pub(crate) role_store: std::sync::Arc<FakeRoleRepository>,
    pub(crate) permission_store: std::sync::Arc<FakePermissionRepository>,
    role_pivots: Mutex<Vec<RoleAssignment>>,
    permission_pivots: Mutex<Vec<PermissionAssignment>>,
    role_permissions: Mutex<Vec<(RoleId, PermissionId)>>,
}

impl FakeAssignmentRepository {
    pub(crate) fn with_stores(
        role_store: std::sync::Arc<FakeRoleRepository>,
        permission_store: std::sync::Arc<FakePermissionRepository>,
    ) -> Self {
        Self {
            role_store,
            permission_store,
            ..Self::default()
        }
    }

    pub(crate) async fn active_role_pivot_count(&self) -> usize {
        self.role_pivots
            .lock()
            .await
            .iter()
            .filter(|pivot| pivot.is_active())
            .count()
    }

    pub(crate) async fn tombstoned_role_pivot_count(&self) -> usize {
        self.role_pivots
            .lock()
            .await
            .iter()
            .filter(|pivot| !pivot.is_active())
            .count()
    }
}

#[async_trait]
impl AssignmentRepository for FakeAssignmentRepository {
    async fn assign_roles(&self, subject: &Subject, role_ids: &[RoleId]) -> AppResult<()> {
        let mut pivots = self.role_pivots.lock().await;
        for role_id in role_ids {
            let already_active = pivots.iter().any(|pivot| {
                pivot.is_active()
                    && pivot.subject() == subject.subject_ref()
                    && pivot.role_id() == *role_id
                    && pivot.matches_tenant(subject.tenant_id())
            });
            if !already_active {
                pivots.push(RoleAssignment::new(
                    subject.subject_ref(),
                    *role_id,
                    subject.tenant_id(),
                ));
            }
        }
        Ok(())
    }

    async fn revoke_roles(&self, subject: &Subject, role_ids: &[RoleId]) -> AppResult<()> {
        let mut pivots = self.role_pivots.lock().await;
        for pivot in pivots.iter_mut() {
            if pivot.is_active()
                && pivot.subject() == subject.subject_ref()
                && role_ids.contains(&pivot.role_id())
                && pivot.matches_tenant(subject.tenant_id())
            {
                pivot.revoke();
            }
        }
        Ok(())
    }

    async fn sync_roles(&self, subject: &Subject, role_ids: &[RoleId]) -> AppResult<()> {
        {
            let mut pivots = self.role_pivots.lock().await;
            for pivot in pivots.iter_mut() {
                if pivot.is_active()
                    && pivot.subject() == subject.subject_ref()
                    && pivot.matches_tenant(subject.tenant_id())
                {
                    pivot.revoke();
                }
            }
        }
        self.assign_roles(subject, role_ids).await
    }

    async fn assign_permissions(
        &self,
        subject: &Subject,
        permission_ids: &[PermissionId],
    ) -> AppResult<()> {
        let mut pivots = self.permission_pivots.lock().await;
        for permission_id in permission_ids {
            let already_active = pivots.iter().any(|pivot| {
                pivot.is_active()
                    && pivot.subject() == subject.subject_ref()
                    && pivot.permission_id() == *permission_id
                    && pivot.matches_tenant(subject.tenant_id())
            });
            if !already_active {
                pivots.push(PermissionAssignment::new(
                    subject.subject_ref(),
                    *permission_id,
                    subject.tenant_id(),
                ));
            }
        }
        Ok(())
    }

    async fn revoke_permissions(
        &self,
        subject: &Subject,
        permission_ids: &[PermissionId],
    ) -> AppResult<()> {
        let mut pivots = self.permission_pivots.lock().await;
        for pivot in pivots.iter_mut() {
            if pivot.is_active()
                && pivot.subject() == subject.subject_ref()
                && permission_ids.contains(&pivot.permission_id())
                && pivot.matches_tenant(subject.tenant_id())
            {
                pivot.revoke();
            }
        }
        Ok(())
    }

    async fn sync_permissions(
        &self,
        subject: &Subject,
        permission_ids: &[PermissionId],
    ) -> AppResult<()> {
        {
            let mut pivots = self.permission_pivots.lock().await;
            for pivot in pivots.iter_mut() {
                if pivot.is_active()
                    && pivot.subject() == subject.subject_ref()
                    && pivot.matches_tenant(subject.tenant_id())
                {
                    pivot.revoke();
                }
            }
        }
        self.assign_permissions(subject, permission_ids).await
    }

    async fn grant_role_permission(
        &self,
        role_id: RoleId,
        permission_id: PermissionId,
    ) -> AppResult<()> {
        let mut links = self.role_permissions.lock().await;
        if !links.contains(&(role_id, permission_id)) {
            links.push((role_id, permission_id));
        }
        Ok(())
    }

    async fn revoke_role_permission(
        &self,
        role_id: RoleId,
        permission_id: PermissionId,
    ) -> AppResult<()> {
        self.role_permissions
            .lock()
            .await
            .retain(|link| link != &(role_id, permission_id));
        Ok(())
    }

    async fn sync_role_permissions(
        &self,
        role_id: RoleId,
        permission_ids: &[PermissionId],
    ) -> AppResult<()> {
        let mut links = self.role_permissions.lock().await;
        links.retain(|(stored_role_id, _)| stored_role_id != &role_id);
        links.extend(
            permission_ids
                .iter()
                .map(|permission_id| (role_id, *permission_id)),
        );
        Ok(())
    }

    async fn list_role_permissions(&self, role_id: RoleId) -> AppResult<Vec<Permission>> {
        let links = self.role_permissions.lock().await;
        let mut permissions = Vec::new();
        for (stored_role_id, permission_id) in links.iter() {
            if stored_role_id != &role_id {
                continue;
            }
            if let Some(permission) = self.permission_store.find_by_id(*permission_id).await? {
                permissions.push(permission);
            }
        }
        permissions.sort_by(|left, right| left.name().cmp(right.name()));
        Ok(permissions)
    }

    async fn load_subject_grants(
        &self,
        subject: &Subject,
        scope: EntityScope,
    ) -> AppResult<SubjectGrants> {
        let role_ids: Vec<RoleId> = {
            let pivots = self.role_pivots.lock().await;
            pivots
                .iter()
                .filter(|pivot| {
                    pivot.is_active()
                        && pivot.subject() == subject.subject_ref()
                        && scope.admits(pivot.tenant_id())
                })
                .map(|pivot| pivot.role_id())
                .collect()
        };

        let mut roles = Vec::with_capacity(role_ids.len());
        for role_id in role_ids {
            if let Some(role) = self.role_store.find_by_id(role_id).await? {
                let permissions = self.list_role_permissions(role_id).await?;
                roles.push(RoleGrant::new(role, permissions));
            }
        }

        let permission_ids: Vec<PermissionId> = {
            let pivots = self.permission_pivots.lock().await;
            pivots
                .iter()
                .filter(|pivot| {
                    pivot.is_active()
                        && pivot.subject() == subject.subject_ref()
                        && scope.admits(pivot.tenant_id())
                })
                .map(|pivot| pivot.permission_id())
                .collect()
        };

        let mut direct_permissions = Vec::with_capacity(permission_ids.len());
        for permission_id in permission_ids {
            if let Some(permission) = self.permission_store.find_by_id(permission_id).await? {
                direct_permissions.push(permission);
            }
        }

        Ok(SubjectGrants::new(roles, direct_permissions))
    }
}

#[derive(Default)]
pub(crate) struct FakeAuditRepository {
    pub(crate) events: Mutex<Vec<AuditEvent>>,
}

#[async_trait]
impl AuditRepository for FakeAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        self.events.lock().await.push(event);
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct FakePermissionNameCache {
    entry: Mutex<Option<Vec<String>>>,
    fail: AtomicBool,
    pub(crate) forget_calls: AtomicUsize,
}

impl FakePermissionNameCache {
    pub(crate) fn failing() -> Self {
        let cache = Self::default();
        cache.fail.store(true, Ordering::SeqCst);
        cache
    }

    pub(crate) async fn prime(&self, names: &[&str]) {
        *self.entry.lock().await = Some(names.iter().map(|name| (*name).to_owned()).collect());
    }

    pub(crate) async fn is_empty(&self) -> bool {
        self.entry.lock().await.is_none()
    }
}

#[async_trait]
impl PermissionNameCache for FakePermissionNameCache {
    async fn get(&self) -> AppResult<Option<Vec<String>>> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Internal("cache store is unavailable".to_owned()));
        }
        Ok(self.entry.lock().await.clone())
    }

    async fn set(&self, names: &[String], ttl_seconds: u32) -> AppResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Internal("cache store is unavailable".to_owned()));
        }
        if ttl_seconds == 0 {
            return Ok(());
        }
        *self.entry.lock().await = Some(names.to_vec());
        Ok(())
    }

    async fn forget(&self) -> AppResult<()> {
        self.forget_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Internal("cache store is unavailable".to_owned()));
        }
        *self.entry.lock().await = None;
        Ok(())
    }
}
