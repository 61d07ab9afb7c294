use async_trait::async_trait;
use warden_core::AppResult;
use warden_domain::{Permission, PermissionId, RoleId, Subject, SubjectGrants};

use crate::EntityScope;

/// Repository port for assignment pivots and role-permission links.
///
/// Every subject-facing mutation stamps the subject's tenant onto the pivot
/// rows it creates and touches only rows carrying that same tenant, where a
/// tenant-less subject matches only tenant-less rows. Revocation tombstones
/// rows instead of deleting them; tombstoned rows are invisible to every
/// read on this port.
#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    /// Assigns roles to a subject, ignoring roles that are already actively
    /// assigned under the subject's tenant.
    async fn assign_roles(&self, subject: &Subject, role_ids: &[RoleId]) -> AppResult<()>;

    /// Tombstones the subject's active assignments for the given roles
    /// within the subject's tenant. Roles not currently assigned are
    /// skipped silently.
    async fn revoke_roles(&self, subject: &Subject, role_ids: &[RoleId]) -> AppResult<()>;

    /// Replaces the subject's role set within the subject's tenant:
    /// tombstones every active assignment carrying that tenant, then
    /// assigns the supplied roles. Assignments recorded under any other
    /// tenant are never touched.
    async fn sync_roles(&self, subject: &Subject, role_ids: &[RoleId]) -> AppResult<()>;

    /// Assigns permissions straight to a subject, ignoring permissions that
    /// are already actively assigned under the subject's tenant.
    async fn assign_permissions(
        &self,
        subject: &Subject,
        permission_ids: &[PermissionId],
    ) -> AppResult<()>;

    /// Tombstones the subject's active direct grants for the given
    /// permissions within the subject's tenant.
    async fn revoke_permissions(
        &self,
        subject: &Subject,
        permission_ids: &[PermissionId],
    ) -> AppResult<()>;

    /// Replaces the subject's direct permission set within the subject's
    /// tenant, with the same tenant discipline as [`Self::sync_roles`].
    async fn sync_permissions(
        &self,
        subject: &Subject,
        permission_ids: &[PermissionId],
    ) -> AppResult<()>;

    /// Grants a permission to a role. The link has no tenant dimension and
    /// granting twice is a no-op.
    async fn grant_role_permission(
        &self,
        role_id: RoleId,
        permission_id: PermissionId,
    ) -> AppResult<()>;

    /// Removes a permission from a role. Removing an absent link is a
    /// no-op.
    async fn revoke_role_permission(
        &self,
        role_id: RoleId,
        permission_id: PermissionId,
    ) -> AppResult<()>;

    /// Replaces a role's permission set.
    async fn sync_role_permissions(
        &self,
        role_id: RoleId,
        permission_ids: &[PermissionId],
    ) -> AppResult<()>;

    /// Lists the permissions granted to a role, ordered by name.
    async fn list_role_permissions(&self, role_id: RoleId) -> AppResult<Vec<Permission>>;

    /// Loads the subject's active roles (with their permission sets) and
    /// direct permissions, filtered by the pivot scope: only pivot rows
    /// whose tenant the scope admits contribute to the snapshot.
    async fn load_subject_grants(
        &self,
        subject: &Subject,
        scope: EntityScope,
    ) -> AppResult<SubjectGrants>;
}
