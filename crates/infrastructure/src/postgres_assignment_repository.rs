use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use warden_application::{AssignmentRepository, EntityScope};
use warden_core::{AppError, AppResult, TenantId};
use warden_domain::{
    GuardName, Permission, PermissionId, Role, RoleGrant, RoleId, Subject, SubjectGrants,
};

use crate::postgres_role_repository::scope_tenant;

/// PostgreSQL-backed assignment repository.
#[derive(Clone)]
pub struct PostgresAssignmentRepository {
    pool: PgPool,
}

impl PostgresAssignmentRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct PermissionEntityRow {
    id: Uuid,
    tenant_id: Option<Uuid>,
    name: String,
    guard: String,
    title: Option<String>,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PermissionEntityRow {
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

#[derive(Debug, FromRow)]
struct SubjectRoleRow {
    role_id: Uuid,
    role_tenant_id: Option<Uuid>,
    role_name: String,
    role_guard: String,
    role_title: Option<String>,
    role_description: Option<String>,
    role_created_at: DateTime<Utc>,
    role_updated_at: DateTime<Utc>,
    permission_id: Option<Uuid>,
    permission_tenant_id: Option<Uuid>,
    permission_name: Option<String>,
    permission_guard: Option<String>,
    permission_title: Option<String>,
    permission_description: Option<String>,
    permission_created_at: Option<DateTime<Utc>>,
    permission_updated_at: Option<DateTime<Utc>>,
}

#[async_trait]
impl AssignmentRepository for PostgresAssignmentRepository {
    async fn assign_roles(&self, subject: &Subject, role_ids: &[RoleId]) -> AppResult<()> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        for role_id in role_ids {
            sqlx::query(
                r#"
                INSERT INTO rbac_subject_roles (subject_kind, subject_id, role_id, tenant_id, status)
                SELECT $1, $2, $3, $4, 'active'
                WHERE NOT EXISTS (
                    SELECT 1
                    FROM rbac_subject_roles
                    WHERE subject_kind = $1
                        AND subject_id = $2
                        AND role_id = $3
                        AND tenant_id IS NOT DISTINCT FROM $4
                        AND status = 'active'
                )
                "#,
            )
            .bind(subject.subject_ref().kind().as_str())
            .bind(subject.subject_ref().id())
            .bind(role_id.as_uuid())
            .bind(subject.tenant_id().map(|tenant_id| tenant_id.as_uuid()))
            .execute(&mut *transaction)
            .await
            .map_err(|error| AppError::Internal(format!("failed to assign role: {error}")))?;
        }

        transaction
            .commit()
            .await
            .map_err(|error| AppError::Internal(format!("failed to commit transaction: {error}")))
    }

    async fn revoke_roles(&self, subject: &Subject, role_ids: &[RoleId]) -> AppResult<()> {
        let role_uuids: Vec<Uuid> = role_ids.iter().map(RoleId::as_uuid).collect();

        sqlx::query(
            r#"
            UPDATE rbac_subject_roles
            SET status = 'revoked', revoked_at = now(), updated_at = now()
            WHERE subject_kind = $1
                AND subject_id = $2
                AND role_id = ANY($3)
                AND tenant_id IS NOT DISTINCT FROM $4
                AND status = 'active'
            "#,
        )
        .bind(subject.subject_ref().kind().as_str())
        .bind(subject.subject_ref().id())
        .bind(role_uuids)
        .bind(subject.tenant_id().map(|tenant_id| tenant_id.as_uuid()))
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to revoke roles: {error}")))?;

        Ok(())
    }

    async fn sync_roles(&self, subject: &Subject, role_ids: &[RoleId]) -> AppResult<()> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        sqlx::query(
            r#"
            UPDATE rbac_subject_roles
            SET status = 'revoked', revoked_at = now(), updated_at = now()
            WHERE subject_kind = $1
                AND subject_id = $2
                AND tenant_id IS NOT DISTINCT FROM $3
                AND status = 'active'
            "#,
        )
        .bind(subject.subject_ref().kind().as_str())
        .bind(subject.subject_ref().id())
        .bind(subject.tenant_id().map(|tenant_id| tenant_id.as_uuid()))
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to clear role set: {error}")))?;

        for role_id in role_ids {
            sqlx::query(
                r#"
                INSERT INTO rbac_subject_roles (subject_kind, subject_id, role_id, tenant_id, status)
                SELECT $1, $2, $3, $4, 'active'
                WHERE NOT EXISTS (
                    SELECT 1
                    FROM rbac_subject_roles
                    WHERE subject_kind = $1
                        AND subject_id = $2
                        AND role_id = $3
                        AND tenant_id IS NOT DISTINCT FROM $4
                        AND status = 'active'
                )
                "#,
            )
            .bind(subject.subject_ref().kind().as_str())
            .bind(subject.subject_ref().id())
            .bind(role_id.as_uuid())
            .bind(subject.tenant_id().map(|tenant_id| tenant_id.as_uuid()))
            .execute(&mut *transaction)
            .await
            .map_err(|error| AppError::Internal(format!("failed to assign role: {error}")))?;
        }

        transaction
            .commit()
            .await
            .map_err(|error| AppError::Internal(format!("failed to commit transaction: {error}")))
    }

    async fn assign_permissions(
        &self,
        subject: &Subject,
        permission_ids: &[PermissionId],
    ) -> AppResult<()> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        for permission_id in permission_ids {
            sqlx::query(
                r#"
                INSERT INTO rbac_subject_permissions (subject_kind, subject_id, permission_id, tenant_id, status)
                SELECT $1, $2, $3, $4, 'active'
                WHERE NOT EXISTS (
                    SELECT 1
                    FROM rbac_subject_permissions
                    WHERE subject_kind = $1
                        AND subject_id = $2
                        AND permission_id = $3
                        AND tenant_id IS NOT DISTINCT FROM $4
                        AND status = 'active'
                )
                "#,
            )
            .bind(subject.subject_ref().kind().as_str())
            .bind(subject.subject_ref().id())
            .bind(permission_id.as_uuid())
            .bind(subject.tenant_id().map(|tenant_id| tenant_id.as_uuid()))
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to assign permission: {error}"))
            })?;
        }

        transaction
            .commit()
            .await
            .map_err(|error| AppError::Internal(format!("failed to commit transaction: {error}")))
    }

    async fn revoke_permissions(
        &self,
        subject: &Subject,
        permission_ids: &[PermissionId],
    ) -> AppResult<()> {
        let permission_uuids: Vec<Uuid> =
            permission_ids.iter().map(PermissionId::as_uuid).collect();

        sqlx::query(
            r#"
            UPDATE rbac_subject_permissions
            SET status = 'revoked', revoked_at = now(), updated_at = now()
            WHERE subject_kind = $1
                AND subject_id = $2
                AND permission_id = ANY($3)
                AND tenant_id IS NOT DISTINCT FROM $4
                AND status = 'active'
            "#,
        )
        .bind(subject.subject_ref().kind().as_str())
        .bind(subject.subject_ref().id())
        .bind(permission_uuids)
        .bind(subject.tenant_id().map(|tenant_id| tenant_id.as_uuid()))
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to revoke permissions: {error}")))?;

        Ok(())
    }

    async fn sync_permissions(
        &self,
        subject: &Subject,
        permission_ids: &[PermissionId],
    ) -> AppResult<()> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        sqlx::query(
            r#"
            UPDATE rbac_subject_permissions
            SET status = 'revoked', revoked_at = now(), updated_at = now()
            WHERE subject_kind = $1
                AND subject_id = $2
                AND tenant_id IS NOT DISTINCT FROM $3
                AND status = 'active'
            "#,
        )
        .bind(subject.subject_ref().kind().as_str())
        .bind(subject.subject_ref().id())
        .bind(subject.tenant_id().map(|tenant_id| tenant_id.as_uuid()))
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to clear permission set: {error}"))
        })?;

        for permission_id in permission_ids {
            sqlx::query(
                r#"
                INSERT INTO rbac_subject_permissions (subject_kind, subject_id, permission_id, tenant_id, status)
                SELECT $1, $2, $3, $4, 'active'
                WHERE NOT EXISTS (
                    SELECT 1
                    FROM rbac_subject_permissions
                    WHERE subject_kind = $1
                        AND subject_id = $2
                        AND permission_id = $3
                        AND tenant_id IS NOT DISTINCT FROM $4
                        AND status = 'active'
                )
                "#,
            )
            .bind(subject.subject_ref().kind().as_str())
            .bind(subject.subject_ref().id())
            .bind(permission_id.as_uuid())
            .bind(subject.tenant_id().map(|tenant_id| tenant_id.as_uuid()))
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to assign permission: {error}"))
            })?;
        }

        transaction
            .commit()
            .await
            .map_err(|error| AppError::Internal(format!("failed to commit transaction: {error}")))
    }

    async fn grant_role_permission(
        &self,
        role_id: RoleId,
        permission_id: PermissionId,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO rbac_role_permissions (role_id, permission_id)
            VALUES ($1, $2)
            ON CONFLICT (role_id, permission_id) DO NOTHING
            "#,
        )
        .bind(role_id.as_uuid())
        .bind(permission_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to grant role permission: {error}")))?;

        Ok(())
    }

    async fn revoke_role_permission(
        &self,
        role_id: RoleId,
        permission_id: PermissionId,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            DELETE FROM rbac_role_permissions
            WHERE role_id = $1 AND permission_id = $2
            "#,
        )
        .bind(role_id.as_uuid())
        .bind(permission_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to revoke role permission: {error}"))
        })?;

        Ok(())
    }

    async fn sync_role_permissions(
        &self,
        role_id: RoleId,
        permission_ids: &[PermissionId],
    ) -> AppResult<()> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        sqlx::query(
            r#"
            DELETE FROM rbac_role_permissions
            WHERE role_id = $1
            "#,
        )
        .bind(role_id.as_uuid())
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to clear role permissions: {error}"))
        })?;

        for permission_id in permission_ids {
            sqlx::query(
                r#"
                INSERT INTO rbac_role_permissions (role_id, permission_id)
                VALUES ($1, $2)
                ON CONFLICT (role_id, permission_id) DO NOTHING
                "#,
            )
            .bind(role_id.as_uuid())
            .bind(permission_id.as_uuid())
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to grant role permission: {error}"))
            })?;
        }

        transaction
            .commit()
            .await
            .map_err(|error| AppError::Internal(format!("failed to commit transaction: {error}")))
    }

    async fn list_role_permissions(&self, role_id: RoleId) -> AppResult<Vec<Permission>> {
        let rows = sqlx::query_as::<_, PermissionEntityRow>(
            r#"
            SELECT
                permissions.id,
                permissions.tenant_id,
                permissions.name,
                permissions.guard,
                permissions.title,
                permissions.description,
                permissions.created_at,
                permissions.updated_at
            FROM rbac_role_permissions AS links
            INNER JOIN rbac_permissions AS permissions
                ON permissions.id = links.permission_id
            WHERE links.role_id = $1
            ORDER BY permissions.name
            "#,
        )
        .bind(role_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list role permissions: {error}"))
        })?;

        rows.into_iter()
            .map(PermissionEntityRow::into_permission)
            .collect()
    }

    async fn load_subject_grants(
        &self,
        subject: &Subject,
        scope: EntityScope,
    ) -> AppResult<SubjectGrants> {
        let role_rows = sqlx::query_as::<_, SubjectRoleRow>(
            r#"
            SELECT
                roles.id AS role_id,
                roles.tenant_id AS role_tenant_id,
                roles.name AS role_name,
                roles.guard AS role_guard,
                roles.title AS role_title,
                roles.description AS role_description,
                roles.created_at AS role_created_at,
                roles.updated_at AS role_updated_at,
                permissions.id AS permission_id,
                permissions.tenant_id AS permission_tenant_id,
                permissions.name AS permission_name,
                permissions.guard AS permission_guard,
                permissions.title AS permission_title,
                permissions.description AS permission_description,
                permissions.created_at AS permission_created_at,
                permissions.updated_at AS permission_updated_at
            FROM rbac_subject_roles AS pivots
            INNER JOIN rbac_roles AS roles
                ON roles.id = pivots.role_id
            LEFT JOIN rbac_role_permissions AS links
                ON links.role_id = roles.id
            LEFT JOIN rbac_permissions AS permissions
                ON permissions.id = links.permission_id
            WHERE pivots.subject_kind = $1
                AND pivots.subject_id = $2
                AND pivots.status = 'active'
                AND ($3::uuid IS NULL OR pivots.tenant_id = $3 OR pivots.tenant_id IS NULL)
            ORDER BY roles.name, permissions.name
            "#,
        )
        .bind(subject.subject_ref().kind().as_str())
        .bind(subject.subject_ref().id())
        .bind(scope_tenant(scope))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load subject roles: {error}")))?;

        let roles = aggregate_role_grants(role_rows)?;

        let permission_rows = sqlx::query_as::<_, PermissionEntityRow>(
            r#"
            SELECT
                permissions.id,
                permissions.tenant_id,
                permissions.name,
                permissions.guard,
                permissions.title,
                permissions.description,
                permissions.created_at,
                permissions.updated_at
            FROM rbac_subject_permissions AS pivots
            INNER JOIN rbac_permissions AS permissions
                ON permissions.id = pivots.permission_id
            WHERE pivots.subject_kind = $1
                AND pivots.subject_id = $2
                AND pivots.status = 'active'
                AND ($3::uuid IS NULL OR pivots.tenant_id = $3 OR pivots.tenant_id IS NULL)
            ORDER BY permissions.name
            "#,
        )
        .bind(subject.subject_ref().kind().as_str())
        .bind(subject.subject_ref().id())
        .bind(scope_tenant(scope))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to load subject permissions: {error}"))
        })?;

        let direct_permissions = permission_rows
            .into_iter()
            .map(PermissionEntityRow::into_permission)
            .collect::<AppResult<Vec<_>>>()?;

        Ok(SubjectGrants::new(roles, direct_permissions))
    }
}

fn aggregate_role_grants(rows: Vec<SubjectRoleRow>) -> AppResult<Vec<RoleGrant>> {
    let mut by_id: HashMap<Uuid, (Role, Vec<Permission>)> = HashMap::new();

    for row in rows {
        let entry = match by_id.entry(row.role_id) {
            std::collections::hash_map::Entry::Occupied(entry) => entry.into_mut(),
            std::collections::hash_map::Entry::Vacant(entry) => {
                let role = Role::restore(
                    RoleId::from_uuid(row.role_id),
                    row.role_tenant_id.map(TenantId::from_uuid),
                    row.role_name.clone(),
                    GuardName::new(row.role_guard.clone())?,
                    row.role_title.clone(),
                    row.role_description.clone(),
                    row.role_created_at,
                    row.role_updated_at,
                )?;
                entry.insert((role, Vec::new()))
            }
        };

        if let (Some(id), Some(name), Some(guard), Some(created_at), Some(updated_at)) = (
            row.permission_id,
            row.permission_name,
            row.permission_guard,
            row.permission_created_at,
            row.permission_updated_at,
        ) {
            entry.1.push(Permission::restore(
                PermissionId::from_uuid(id),
                row.permission_tenant_id.map(TenantId::from_uuid),
                name,
                GuardName::new(guard)?,
                row.permission_title,
                row.permission_description,
                created_at,
                updated_at,
            )?);
        }
    }

    let mut grants: Vec<RoleGrant> = by_id
        .into_values()
        .map(|(role, permissions)| RoleGrant::new(role, permissions))
        .collect();
    grants.sort_by(|left, right| left.role().name().cmp(right.role().name()));

    Ok(grants)
}
