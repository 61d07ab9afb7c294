//! Redis-backed permission name cache.

use async_trait::async_trait;
use redis::AsyncCommands;
use warden_application::PermissionNameCache;
use warden_core::{AppError, AppResult};

/// Redis implementation of the permission name cache port.
///
/// The whole name list lives under one key as a JSON array; expiry is
/// handled by the Redis TTL set at write time.
#[derive(Clone)]
pub struct RedisPermissionNameCache {
    client: redis::Client,
    key: String,
}

impl RedisPermissionNameCache {
    /// Default cache key for the permission name list.
    pub const DEFAULT_KEY: &'static str = "warden.permissions.all";

    /// Creates a cache adapter with a configured Redis client and key.
    #[must_use]
    pub fn new(client: redis::Client, key: impl Into<String>) -> Self {
        Self {
            client,
            key: key.into(),
        }
    }
}

#[async_trait]
impl PermissionNameCache for RedisPermissionNameCache {
    async fn get(&self) -> AppResult<Option<Vec<String>>> {
        let mut connection = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|error| AppError::Internal(format!("failed to connect to redis: {error}")))?;

        let encoded: Option<String> = connection.get(self.key.as_str()).await.map_err(|error| {
            AppError::Internal(format!("failed to read permission name cache entry: {error}"))
        })?;

        encoded
            .as_deref()
            .map(|value| {
                serde_json::from_str::<Vec<String>>(value).map_err(|error| {
                    AppError::Internal(format!(
                        "invalid permission name cache value '{value}': {error}"
                    ))
                })
            })
            .transpose()
    }

    async fn set(&self, names: &[String], ttl_seconds: u32) -> AppResult<()> {
        if ttl_seconds == 0 {
            return Ok(());
        }

        let value = serde_json::to_string(names).map_err(|error| {
            AppError::Internal(format!("failed to encode permission names: {error}"))
        })?;

        let mut connection = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|error| AppError::Internal(format!("failed to connect to redis: {error}")))?;

        connection
            .set_ex(self.key.as_str(), value, u64::from(ttl_seconds))
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to write permission name cache entry: {error}"
                ))
            })
    }

    async fn forget(&self) -> AppResult<()> {
        let mut connection = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|error| AppError::Internal(format!("failed to connect to redis: {error}")))?;

        connection.del(self.key.as_str()).await.map_err(|error| {
            AppError::Internal(format!(
                "failed to drop permission name cache entry: {error}"
            ))
        })
    }
}
