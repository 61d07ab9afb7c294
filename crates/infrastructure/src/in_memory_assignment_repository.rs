use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use warden_application::{
    AssignmentRepository, EntityScope, PermissionRepository, RoleRepository,
};
use warden_core::AppResult;
use warden_domain::{
    Permission, PermissionAssignment, PermissionId, RoleAssignment, RoleGrant, RoleId, Subject,
    SubjectGrants,
};

use crate::{InMemoryPermissionRepository, InMemoryRoleRepository};

/// In-memory assignment repository implementation.
///
/// Holds pivot rows and role-permission links; entity values are resolved
/// through the in-memory role and permission repositories it was built
/// with, mirroring the foreign keys of the relational schema.
#[derive(Default)]
pub struct InMemoryAssignmentRepository {
    role_store: Arc<InMemoryRoleRepository>,
    permission_store: Arc<InMemoryPermissionRepository>,
    role_pivots: RwLock<Vec<RoleAssignment>>,
    permission_pivots: RwLock<Vec<PermissionAssignment>>,
    role_permissions: RwLock<Vec<(RoleId, PermissionId)>>,
}

impl InMemoryAssignmentRepository {
    /// Creates a repository sharing the given entity stores.
    #[must_use]
    pub fn new(
        role_store: Arc<InMemoryRoleRepository>,
        permission_store: Arc<InMemoryPermissionRepository>,
    ) -> Self {
        Self {
            role_store,
            permission_store,
            ..Self::default()
        }
    }

    /// Returns every role pivot row, tombstones included, for inspection.
    pub async fn role_pivot_rows(&self) -> Vec<RoleAssignment> {
        self.role_pivots.read().await.clone()
    }

    /// Returns every direct-permission pivot row, tombstones included.
    pub async fn permission_pivot_rows(&self) -> Vec<PermissionAssignment> {
        self.permission_pivots.read().await.clone()
    }
}

#[async_trait]
impl AssignmentRepository for InMemoryAssignmentRepository {
    async fn assign_roles(&self, subject: &Subject, role_ids: &[RoleId]) -> AppResult<()> {
        let mut pivots = self.role_pivots.write().await;

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
        let mut pivots = self.role_pivots.write().await;

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
            let mut pivots = self.role_pivots.write().await;
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
        let mut pivots = self.permission_pivots.write().await;

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
        let mut pivots = self.permission_pivots.write().await;

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
            let mut pivots = self.permission_pivots.write().await;
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
        let mut links = self.role_permissions.write().await;
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
            .write()
            .await
            .retain(|link| link != &(role_id, permission_id));
        Ok(())
    }

    async fn sync_role_permissions(
        &self,
        role_id: RoleId,
        permission_ids: &[PermissionId],
    ) -> AppResult<()> {
        let mut links = self.role_permissions.write().await;
        links.retain(|(stored_role_id, _)| stored_role_id != &role_id);
        links.extend(
            permission_ids
                .iter()
                .map(|permission_id| (role_id, *permission_id)),
        );
        Ok(())
    }

    async fn list_role_permissions(&self, role_id: RoleId) -> AppResult<Vec<Permission>> {
        let links = self.role_permissions.read().await.clone();

        let mut permissions = Vec::new();
        for (stored_role_id, permission_id) in links {
            if stored_role_id != role_id {
                continue;
            }
            if let Some(permission) = self.permission_store.find_by_id(permission_id).await? {
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
        let role_ids: Vec<RoleId> = self
            .role_pivots
            .read()
            .await
            .iter()
            .filter(|pivot| {
                pivot.is_active()
                    && pivot.subject() == subject.subject_ref()
                    && scope.admits(pivot.tenant_id())
            })
            .map(RoleAssignment::role_id)
            .collect();

        let mut roles = Vec::with_capacity(role_ids.len());
        for role_id in role_ids {
            if let Some(role) = self.role_store.find_by_id(role_id).await? {
                let permissions = self.list_role_permissions(role_id).await?;
                roles.push(RoleGrant::new(role, permissions));
            }
        }

        let permission_ids: Vec<PermissionId> = self
            .permission_pivots
            .read()
            .await
            .iter()
            .filter(|pivot| {
                pivot.is_active()
                    && pivot.subject() == subject.subject_ref()
                    && scope.admits(pivot.tenant_id())
            })
            .map(PermissionAssignment::permission_id)
            .collect();

        let mut direct_permissions = Vec::with_capacity(permission_ids.len());
        for permission_id in permission_ids {
            if let Some(permission) = self.permission_store.find_by_id(permission_id).await? {
                direct_permissions.push(permission);
            }
        }

        Ok(SubjectGrants::new(roles, direct_permissions))
    }
}
