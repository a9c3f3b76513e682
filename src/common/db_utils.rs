// src/common/db_utils.rs

use sqlx::{Executor, Postgres, Transaction};
use uuid::Uuid;

use crate::common::error::AppError;
use crate::config::AppState;
use crate::middleware::auth::AuthenticatedUser;
use crate::middleware::tenancy::TenantContext;

pub type RlsTransaction = Transaction<'static, Postgres>;

// ---
// RLS helper: the database "key"
// ---
/// Opens a transaction with the row level security settings applied.
/// `set_config(.., true)` is transaction-local, so the caller must commit
/// (writes) or simply drop (reads) the returned transaction.
pub(crate) async fn begin_rls_transaction(
    app_state: &AppState,
    tenant_ctx: &TenantContext,
    user: &AuthenticatedUser,
) -> Result<RlsTransaction, AppError> {
    let mut tx = app_state.db_pool.begin().await?;

    sqlx::query("SELECT set_config('app.tenant_id', $1, true)")
        .bind(tenant_ctx.0.to_string())
        .execute(&mut *tx)
        .await?;

    sqlx::query("SELECT set_config('app.user_id', $1, true)")
        .bind(user.0.id.to_string())
        .execute(&mut *tx)
        .await?;

    Ok(tx)
}

/// Maps a unique violation to a conflict carrying `detail`.
pub(crate) fn map_unique_violation(e: sqlx::Error, detail: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return AppError::UniqueConstraintViolation(detail.to_string());
        }
    }
    e.into()
}

/// Next value of a named per-tenant sequence, starting at 1.
pub(crate) async fn next_counter<'e, E>(executor: E, tenant_id: Uuid, name: &str) -> Result<i32, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let value: i32 = sqlx::query_scalar(
        r#"
        INSERT INTO counters (tenant_id, name, value)
        VALUES ($1, $2, 1)
        ON CONFLICT (tenant_id, name) DO UPDATE SET value = counters.value + 1
        RETURNING value
        "#,
    )
    .bind(tenant_id)
    .bind(name)
    .fetch_one(executor)
    .await?;
    Ok(value)
}
