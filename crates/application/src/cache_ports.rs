use async_trait::async_trait;
use warden_core::AppResult;

/// Key-value cache port for the system-wide permission name list.
///
/// The cache holds names only, never grants, so who-holds-what mutations do
/// not have to pass through here. Entries expire passively after the TTL
/// given at write time.
#[async_trait]
pub trait PermissionNameCache: Send + Sync {
    /// Returns the cached name list, or `None` on miss or expiry.
    async fn get(&self) -> AppResult<Option<Vec<String>>>;

    /// Replaces the cached name list. A TTL of zero skips the write.
    async fn set(&self, names: &[String], ttl_seconds: u32) -> AppResult<()>;

    /// Drops the cached name list.
    async fn forget(&self) -> AppResult<()>;
}

/// Invalidates the cached permission names, logging and swallowing any
/// cache fault: a cache-layer failure must never fail the mutation that
/// triggered the invalidation.
pub(crate) async fn forget_permission_names_quietly(cache: &dyn PermissionNameCache) {
    if let Err(error) = cache.forget().await {
        tracing::warn!("permission name cache invalidation failed and was ignored: {error}");
    }
}
