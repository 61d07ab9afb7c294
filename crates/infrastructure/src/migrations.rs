use sqlx::PgPool;
use warden_core::{AppError, AppResult};

/// Applies the embedded schema migrations to the given database.
pub async fn run_migrations(pool: &PgPool) -> AppResult<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))
}
