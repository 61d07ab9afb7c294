use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{GuardName, Permission, PermissionId, Role};

/// A role together with its granted permission set, loaded for one subject.
///
/// The permission set is a property of the role itself and does not depend
/// on which tenant assigned the role to the subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleGrant {
    role: Role,
    permissions: Vec<Permission>,
}

impl RoleGrant {
    /// Creates a role grant from a role and its permissions.
    #[must_use]
    pub fn new(role: Role, permissions: Vec<Permission>) -> Self {
        Self { role, permissions }
    }

    /// Returns the role.
    #[must_use]
    pub fn role(&self) -> &Role {
        &self.role
    }

    /// Returns the role's permissions.
    #[must_use]
    pub fn permissions(&self) -> &[Permission] {
        self.permissions.as_slice()
    }

    /// Returns whether the role grants the named permission for the guard.
    #[must_use]
    pub fn has_permission(&self, name: &str, guard: &GuardName) -> bool {
        self.permissions
            .iter()
            .any(|permission| permission.guard() == guard && permission.name() == name)
    }
}

/// Tenant-filtered role and direct-permission sets for one subject.
///
/// This is the input to the authorization resolver: the store has already
/// applied pivot tenant filtering, so every query here is pure set
/// membership and never fails. Names that resolve to nothing evaluate to
/// `false`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectGrants {
    roles: Vec<RoleGrant>,
    direct_permissions: Vec<Permission>,
}

impl SubjectGrants {
    /// Creates a grants snapshot from loaded relations.
    #[must_use]
    pub fn new(roles: Vec<RoleGrant>, direct_permissions: Vec<Permission>) -> Self {
        Self {
            roles,
            direct_permissions,
        }
    }

    /// Returns the subject's active roles with their permissions.
    #[must_use]
    pub fn roles(&self) -> &[RoleGrant] {
        self.roles.as_slice()
    }

    /// Returns the subject's direct (non-role-derived) permissions.
    #[must_use]
    pub fn direct_permissions(&self) -> &[Permission] {
        self.direct_permissions.as_slice()
    }

    /// Returns the names of the subject's active roles.
    #[must_use]
    pub fn role_names(&self) -> Vec<String> {
        self.roles
            .iter()
            .map(|grant| grant.role().name().to_owned())
            .collect()
    }

    /// Returns whether the active role set contains the configured
    /// super-admin role.
    ///
    /// The match is case-sensitive and exact against the role name; the
    /// guard is not considered.
    #[must_use]
    pub fn is_super_admin(&self, super_admin_role: &str) -> bool {
        self.roles
            .iter()
            .any(|grant| grant.role().name() == super_admin_role)
    }

    /// Returns whether the subject holds the named role for the guard.
    #[must_use]
    pub fn contains_role(&self, name: &str, guard: &GuardName) -> bool {
        self.roles
            .iter()
            .any(|grant| grant.role().guard() == guard && grant.role().name() == name)
    }

    /// Returns whether the named permission was granted straight to the
    /// subject, not inherited via a role.
    #[must_use]
    pub fn contains_direct_permission(&self, name: &str, guard: &GuardName) -> bool {
        self.direct_permissions
            .iter()
            .any(|permission| permission.guard() == guard && permission.name() == name)
    }

    /// Returns whether the subject holds the named permission directly or
    /// via any of its guard-matching roles.
    #[must_use]
    pub fn contains_permission(&self, name: &str, guard: &GuardName) -> bool {
        if self.contains_direct_permission(name, guard) {
            return true;
        }

        self.roles
            .iter()
            .filter(|grant| grant.role().guard() == guard)
            .any(|grant| grant.has_permission(name, guard))
    }

    /// Returns the union of direct and role-derived permissions,
    /// de-duplicated by entity identity rather than by name.
    #[must_use]
    pub fn all_permissions(&self) -> Vec<Permission> {
        let mut seen: HashSet<PermissionId> = HashSet::new();
        let mut merged = Vec::new();

        for permission in self
            .direct_permissions
            .iter()
            .chain(self.roles.iter().flat_map(|grant| grant.permissions()))
        {
            if seen.insert(permission.id()) {
                merged.push(permission.clone());
            }
        }

        merged
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use warden_core::TenantId;

    use super::{RoleGrant, SubjectGrants};
    use crate::{GuardName, Permission, Role};

    fn permission(name: &str, guard: GuardName) -> Permission {
        Permission::new(name, guard, Some(TenantId::new())).unwrap_or_else(|_| unreachable!())
    }

    fn role(name: &str, guard: GuardName) -> Role {
        Role::new(name, guard, Some(TenantId::new())).unwrap_or_else(|_| unreachable!())
    }

    #[test]
    fn super_admin_match_ignores_guard_but_not_case() {
        let api_guard = GuardName::new("api").unwrap_or_default();
        let grants = SubjectGrants::new(
            vec![RoleGrant::new(role("super-admin", api_guard), Vec::new())],
            Vec::new(),
        );

        assert!(grants.is_super_admin("super-admin"));
        assert!(!grants.is_super_admin("Super-Admin"));
        assert!(!grants.is_super_admin("super-administrator"));
    }

    #[test]
    fn contains_role_filters_by_guard() {
        let api_guard = GuardName::new("api").unwrap_or_default();
        let grants = SubjectGrants::new(
            vec![RoleGrant::new(role("editor", api_guard), Vec::new())],
            Vec::new(),
        );

        assert!(grants.contains_role("editor", &GuardName::new("api").unwrap_or_default()));
        assert!(!grants.contains_role("editor", &GuardName::web()));
    }

    #[test]
    fn role_derived_permission_is_not_direct() {
        let guard = GuardName::web();
        let grants = SubjectGrants::new(
            vec![RoleGrant::new(
                role("editor", guard.clone()),
                vec![permission("publish-posts", guard.clone())],
            )],
            Vec::new(),
        );

        assert!(grants.contains_permission("publish-posts", &guard));
        assert!(!grants.contains_direct_permission("publish-posts", &guard));
    }

    #[test]
    fn all_permissions_deduplicates_by_id_not_name() {
        let guard = GuardName::web();
        let shared = permission("manage-system", guard.clone());
        let same_name_other_entity = permission("manage-system", guard.clone());

        let grants = SubjectGrants::new(
            vec![RoleGrant::new(
                role("operator", guard.clone()),
                vec![shared.clone(), same_name_other_entity],
            )],
            vec![shared],
        );

        // The shared entity collapses; the same-named distinct entity stays.
        assert_eq!(grants.all_permissions().len(), 2);
    }

    proptest! {
        #[test]
        fn permission_resolution_is_direct_or_via_role(
            direct_names in proptest::collection::hash_set("[a-z]{1,8}", 0..5),
            role_permission_names in proptest::collection::hash_set("[a-z]{1,8}", 0..5),
            probe in "[a-z]{1,8}",
        ) {
            let guard = GuardName::web();
            let direct: Vec<Permission> = direct_names
                .iter()
                .map(|name| permission(name, guard.clone()))
                .collect();
            let via_role: Vec<Permission> = role_permission_names
                .iter()
                .map(|name| permission(name, guard.clone()))
                .collect();

            let grants = SubjectGrants::new(
                vec![RoleGrant::new(role("editor", guard.clone()), via_role)],
                direct,
            );

            let expected = direct_names.contains(probe.as_str())
                || role_permission_names.contains(probe.as_str());
            prop_assert_eq!(grants.contains_permission(probe.as_str(), &guard), expected);
        }
    }
}
