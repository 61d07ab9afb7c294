use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;
use warden_application::PermissionNameCache;
use warden_core::AppResult;

#[derive(Debug, Clone)]
struct NameCacheEntry {
    names: Vec<String>,
    expires_at: Instant,
}

/// In-memory cache adapter for the permission name list.
///
/// Expiry is passive: an expired entry is dropped on the read that
/// observes it.
#[derive(Default)]
pub struct InMemoryPermissionNameCache {
    entry: RwLock<Option<NameCacheEntry>>,
}

impl InMemoryPermissionNameCache {
    /// Creates an empty in-memory cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PermissionNameCache for InMemoryPermissionNameCache {
    async fn get(&self) -> AppResult<Option<Vec<String>>> {
        {
            let entry = self.entry.read().await;
            match entry.as_ref() {
                Some(cached) if cached.expires_at > Instant::now() => {
                    return Ok(Some(cached.names.clone()));
                }
                Some(_) => {}
                None => return Ok(None),
            }
        }

        let mut entry = self.entry.write().await;
        if entry
            .as_ref()
            .is_some_and(|cached| cached.expires_at <= Instant::now())
        {
            *entry = None;
        }

        Ok(None)
    }

    async fn set(&self, names: &[String], ttl_seconds: u32) -> AppResult<()> {
        if ttl_seconds == 0 {
            return Ok(());
        }

        let now = Instant::now();
        let expires_at = now
            .checked_add(Duration::from_secs(u64::from(ttl_seconds)))
            .unwrap_or(now);

        *self.entry.write().await = Some(NameCacheEntry {
            names: names.to_vec(),
            expires_at,
        });

        Ok(())
    }

    async fn forget(&self) -> AppResult<()> {
        *self.entry.write().await = None;
        Ok(())
    }
}
