use warden_domain::GuardName;

/// Role name that bypasses every authorization check by default.
pub const DEFAULT_SUPER_ADMIN_ROLE: &str = "super-admin";

/// Default TTL for the cached permission-name list: 24 hours.
pub const DEFAULT_CACHE_TTL_SECONDS: u32 = 86_400;

/// Configuration contract for the authorization engine.
#[derive(Debug, Clone)]
pub struct RbacConfig {
    /// Whether tenant isolation is enforced. When disabled, no tenant is
    /// stamped onto new entities and no visibility filtering applies.
    pub multi_tenant: bool,
    /// Name of the role whose holders bypass every check.
    pub super_admin_role: String,
    /// TTL for the cached permission-name list, in seconds.
    pub cache_ttl_seconds: u32,
    /// Guard applied when an operation does not name one.
    pub default_guard: GuardName,
}

impl Default for RbacConfig {
    fn default() -> Self {
        Self {
            multi_tenant: true,
            super_admin_role: DEFAULT_SUPER_ADMIN_ROLE.to_owned(),
            cache_ttl_seconds: DEFAULT_CACHE_TTL_SECONDS,
            default_guard: GuardName::web(),
        }
    }
}

impl RbacConfig {
    /// Returns a configuration with tenant isolation disabled.
    #[must_use]
    pub fn single_tenant() -> Self {
        Self {
            multi_tenant: false,
            ..Self::default()
        }
    }
}
