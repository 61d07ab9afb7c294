use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use warden_application::{EntityScope, RoleRepository};
use warden_core::{AppError, AppResult, TenantId};
use warden_domain::{GuardName, Role, RoleId};

/// PostgreSQL-backed role repository.
#[derive(Clone)]
pub struct PostgresRoleRepository {
    pool: PgPool,
}

impl PostgresRoleRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RoleRow {
    id: Uuid,
    tenant_id: Option<Uuid>,
    name: String,
    guard: String,
    title: Option<String>,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RoleRow {
    fn into_role(self) -> AppResult<Role> {
        Role::restore(
            RoleId::from_uuid(self.id),
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
impl RoleRepository for PostgresRoleRepository {
    async fn insert(&self, role: Role) -> AppResult<Role> {
        // The explicit probe catches the NULL-vs-NULL duplicate that a
        // plain unique constraint would let through; the coalesced unique
        // index still backstops concurrent creations.
        let existing = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM rbac_roles
            WHERE tenant_id IS NOT DISTINCT FROM $1
                AND name = $2
                AND guard = $3
            "#,
        )
        .bind(role.tenant_id().map(|tenant_id| tenant_id.as_uuid()))
        .bind(role.name())
        .bind(role.guard().as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to probe for role: {error}")))?;

        if existing > 0 {
            return Err(AppError::Conflict(format!(
                "role '{}' already exists for guard '{}'",
                role.name(),
                role.guard()
            )));
        }

        sqlx::query(
            r#"
            INSERT INTO rbac_roles (id, tenant_id, name, guard, title, description, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(role.id().as_uuid())
        .bind(role.tenant_id().map(|tenant_id| tenant_id.as_uuid()))
        .bind(role.name())
        .bind(role.guard().as_str())
        .bind(role.title())
        .bind(role.description())
        .bind(role.created_at())
        .bind(role.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|error| map_unique_violation(error, "role", role.name()))?;

        Ok(role)
    }

    async fn find_by_id(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        let row = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, tenant_id, name, guard, title, description, created_at, updated_at
            FROM rbac_roles
            WHERE id = $1
            "#,
        )
        .bind(role_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load role: {error}")))?;

        row.map(RoleRow::into_role).transpose()
    }

    async fn find_by_name(
        &self,
        name: &str,
        guard: &GuardName,
        scope: EntityScope,
    ) -> AppResult<Option<Role>> {
        let row = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, tenant_id, name, guard, title, description, created_at, updated_at
            FROM rbac_roles
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
        .map_err(|error| AppError::Internal(format!("failed to resolve role: {error}")))?;

        row.map(RoleRow::into_role).transpose()
    }

    async fn list_all(&self, scope: EntityScope) -> AppResult<Vec<Role>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, tenant_id, name, guard, title, description, created_at, updated_at
            FROM rbac_roles
            WHERE $1::uuid IS NULL OR tenant_id = $1 OR tenant_id IS NULL
            ORDER BY name, guard
            "#,
        )
        .bind(scope_tenant(scope))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list roles: {error}")))?;

        rows.into_iter().map(RoleRow::into_role).collect()
    }

    async fn delete(&self, role_id: RoleId) -> AppResult<()> {
        let rows_affected = sqlx::query(
            r#"
            DELETE FROM rbac_roles
            WHERE id = $1
            "#,
        )
        .bind(role_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete role: {error}")))?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound(format!(
                "role '{role_id}' was not found"
            )));
        }

        Ok(())
    }
}

pub(crate) fn scope_tenant(scope: EntityScope) -> Option<Uuid> {
    match scope {
        EntityScope::Unscoped => None,
        EntityScope::TenantWithGlobal(tenant_id) => Some(tenant_id.as_uuid()),
    }
}

pub(crate) fn map_unique_violation(error: sqlx::Error, kind: &str, name: &str) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::Conflict(format!("{kind} '{name}' already exists"));
    }

    AppError::Internal(format!("failed to create {kind}: {error}"))
}
