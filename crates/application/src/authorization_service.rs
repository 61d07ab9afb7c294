use std::sync::Arc;

use warden_core::AppResult;
use warden_domain::{GuardName, Permission, Subject, SubjectGrants};

use crate::{AssignmentRepository, EntityScope, RbacConfig};

/// Application service answering role and permission queries for subjects.
///
/// Each query loads one tenant-filtered grants snapshot and then runs pure
/// set logic over it: a holder of the configured super-admin role passes
/// every check before any other evaluation, unresolved names evaluate to
/// `false`, and no decision ever reads the cache layer.
#[derive(Clone)]
pub struct AuthorizationService {
    assignment_repository: Arc<dyn AssignmentRepository>,
    config: RbacConfig,
}

impl AuthorizationService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(assignment_repository: Arc<dyn AssignmentRepository>, config: RbacConfig) -> Self {
        Self {
            assignment_repository,
            config,
        }
    }

    /// Loads the subject's tenant-filtered roles and direct permissions.
    pub async fn grants_for(&self, subject: &Subject) -> AppResult<SubjectGrants> {
        let scope = EntityScope::for_subject(self.config.multi_tenant, subject);
        self.assignment_repository
            .load_subject_grants(subject, scope)
            .await
    }

    /// Returns whether the subject holds the configured super-admin role.
    pub async fn is_super_admin(&self, subject: &Subject) -> AppResult<bool> {
        let grants = self.grants_for(subject).await?;
        Ok(grants.is_super_admin(&self.config.super_admin_role))
    }

    /// Returns whether the subject holds the named role for the guard.
    pub async fn has_role(
        &self,
        subject: &Subject,
        name: &str,
        guard: &GuardName,
    ) -> AppResult<bool> {
        let grants = self.grants_for(subject).await?;
        if grants.is_super_admin(&self.config.super_admin_role) {
            return Ok(true);
        }

        Ok(grants.contains_role(name, guard))
    }

    /// Returns whether the subject holds any of the named roles. A
    /// super-admin passes even for an empty list.
    pub async fn has_any_role(
        &self,
        subject: &Subject,
        names: &[&str],
        guard: &GuardName,
    ) -> AppResult<bool> {
        let grants = self.grants_for(subject).await?;
        if grants.is_super_admin(&self.config.super_admin_role) {
            return Ok(true);
        }

        Ok(names.iter().any(|name| grants.contains_role(name, guard)))
    }

    /// Returns whether the subject holds all of the named roles. A
    /// super-admin passes even for names that do not exist.
    pub async fn has_all_roles(
        &self,
        subject: &Subject,
        names: &[&str],
        guard: &GuardName,
    ) -> AppResult<bool> {
        let grants = self.grants_for(subject).await?;
        if grants.is_super_admin(&self.config.super_admin_role) {
            return Ok(true);
        }

        Ok(names.iter().all(|name| grants.contains_role(name, guard)))
    }

    /// Returns whether the named permission was granted straight to the
    /// subject, not inherited via a role.
    pub async fn has_direct_permission(
        &self,
        subject: &Subject,
        name: &str,
        guard: &GuardName,
    ) -> AppResult<bool> {
        let grants = self.grants_for(subject).await?;
        if grants.is_super_admin(&self.config.super_admin_role) {
            return Ok(true);
        }

        Ok(grants.contains_direct_permission(name, guard))
    }

    /// Returns whether the subject holds the named permission directly or
    /// via any of its roles.
    pub async fn has_permission(
        &self,
        subject: &Subject,
        name: &str,
        guard: &GuardName,
    ) -> AppResult<bool> {
        let grants = self.grants_for(subject).await?;
        if grants.is_super_admin(&self.config.super_admin_role) {
            return Ok(true);
        }

        Ok(grants.contains_permission(name, guard))
    }

    /// Returns whether the subject holds any of the named permissions.
    pub async fn has_any_permission(
        &self,
        subject: &Subject,
        names: &[&str],
        guard: &GuardName,
    ) -> AppResult<bool> {
        let grants = self.grants_for(subject).await?;
        if grants.is_super_admin(&self.config.super_admin_role) {
            return Ok(true);
        }

        Ok(names
            .iter()
            .any(|name| grants.contains_permission(name, guard)))
    }

    /// Returns whether the subject holds all of the named permissions. A
    /// super-admin passes even for names that do not exist.
    pub async fn has_all_permissions(
        &self,
        subject: &Subject,
        names: &[&str],
        guard: &GuardName,
    ) -> AppResult<bool> {
        let grants = self.grants_for(subject).await?;
        if grants.is_super_admin(&self.config.super_admin_role) {
            return Ok(true);
        }

        Ok(names
            .iter()
            .all(|name| grants.contains_permission(name, guard)))
    }

    /// Returns the union of the subject's direct and role-derived
    /// permissions, de-duplicated by entity identity.
    pub async fn all_permissions(&self, subject: &Subject) -> AppResult<Vec<Permission>> {
        let grants = self.grants_for(subject).await?;
        Ok(grants.all_permissions())
    }

    /// Returns the names of the subject's active roles.
    pub async fn role_names(&self, subject: &Subject) -> AppResult<Vec<String>> {
        let grants = self.grants_for(subject).await?;
        Ok(grants.role_names())
    }
}
