use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use warden_application::{EntityScope, PermissionRepository};
use warden_core::{AppError, AppResult, TenantId};
use warden_domain::{GuardName, Permission, PermissionId};

use crate::postgres_role_repository::{map_unique_violation, scope_tenant};

/// PostgreSQL-backed permission repository.
#[derive(Clone)]
pub struct PostgresPermissionRepository {
    pool: PgPool,
}

impl PostgresPermissionRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct PermissionRow {
    id: Uuid,
    tenant_id: Option<Uuid>,
    name: String,
    guard: String,
    title: Option<String>,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PermissionRow {
    fn into_permission(self) -> AppResult<Permission> {
        Permission::restore(
            PermissionId::from_uuid(self.id),
            self.tenant_id.map(TenantId::from_uuid),
            self.name,
            GuardName::new(self.guard)?,
            self.title,
            self.description,
            self.created_at,
            self.updated_at,
        )
    }
}

#[async_trait]
impl PermissionRepository for PostgresPermissionRepository {
    async fn insert(&self, permission: Permission) -> AppResult<Permission> {
        let existing = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM rbac_permissions
            WHERE tenant_id IS NOT DISTINCT FROM $1
                AND name = $2
                AND guard = $3
            "#,
        )
        .bind(permission.tenant_id().map(|tenant_id| tenant_id.as_uuid()))
        .bind(permission.name())
        .bind(permission.guard().as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to probe for permission: {error}")))?;

        if existing > 0 {
            return Err(AppError::Conflict(format!(
                "permission '{}' already exists for guard '{}'",
                permission.name(),
                permission.guard()
            )));
        }

        sqlx::query(
            r#"
            INSERT INTO rbac_permissions (id, tenant_id, name, guard, title, description, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(permission.id().as_uuid())
        .bind(permission.tenant_id().map(|tenant_id| tenant_id.as_uuid()))
        .bind(permission.name())
        .bind(permission.guard().as_str())
        .bind(permission.title())
        .bind(permission.description())
        .bind(permission.created_at())
        .bind(permission.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|error| map_unique_violation(error, "permission", permission.name()))?;

        Ok(permission)
    }

    async fn find_by_id(&self, permission_id: PermissionId) -> AppResult<Option<Permission>> {
        let row = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT id, tenant_id, name, guard, title, description, created_at, updated_at
            FROM rbac_permissions
            WHERE id = $1
            "#,
        )
        .bind(permission_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load permission: {error}")))?;

        row.map(PermissionRow::into_permission).transpose()
    }

    async fn find_by_name(
        &self,
        name: &str,
        guard: &GuardName,
        scope: EntityScope,
    ) -> AppResult<Option<Permission>> {
        let row = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT id, tenant_id, name, guard, title, description, created_at, updated_at
            FROM rbac_permissions
            WHERE name = $1
                AND guard = $2
                AND ($3::uuid IS NULL OR tenant_id = $3 OR tenant_id IS NULL)
            ORDER BY tenant_id NULLS LAST
            LIMIT 1
            "#,
        )
        .bind(name)
        .bind(guard.as_str())
        .bind(scope_tenant(scope))
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to resolve permission: {error}")))?;

        row.map(PermissionRow::into_permission).transpose()
    }

    async fn list_all(&self, scope: EntityScope) -> AppResult<Vec<Permission>> {
        let rows = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT id, tenant_id, name, guard, title, description, created_at, updated_at
            FROM rbac_permissions
            WHERE $1::uuid IS NULL OR tenant_id = $1 OR tenant_id IS NULL
            ORDER BY name, guard
            "#,
        )
        .bind(scope_tenant(scope))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list permissions: {error}")))?;

        rows.into_iter()
            .map(PermissionRow::into_permission)
            .collect()
    }

    async fn delete(&self, permission_id: PermissionId) -> AppResult<()> {
        let rows_affected = sqlx::query(
            r#"
            DELETE FROM rbac_permissions
            WHERE id = $1
            "#,
        )
        .bind(permission_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete permission: {error}")))?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound(format!(
                "permission '{permission_id}' was not found"
            )));
        }

        Ok(())
    }
}
