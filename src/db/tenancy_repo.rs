// src/db/tenancy_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{db_utils::map_unique_violation, error::AppError},
    models::tenancy::{Tenant, TenantMember},
};

#[derive(Clone)]
pub struct TenantRepository {
    pool: PgPool,
}

impl TenantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Membership check run by the tenant guard on every plant-scoped request.
    pub async fn check_user_tenancy(&self, user_id: Uuid, tenant_id: Uuid) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM tenant_members
                WHERE user_id = $1 AND tenant_id = $2
            )
            "#,
        )
        .bind(user_id)
        .bind(tenant_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    pub async fn create_tenant<'e, E>(&self, executor: E, name: &str, code: &str) -> Result<Tenant, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Tenant>(
            r#"
            INSERT INTO tenants (name, code)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(name.trim())
        .bind(code.trim().to_lowercase())
        .fetch_one(executor)
        .await
        .map_err(|e| map_unique_violation(e, "tenant code"))
    }

    pub async fn tenant_exists<'e, E>(&self, executor: E, tenant_id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM tenants WHERE id = $1)")
            .bind(tenant_id)
            .fetch_one(executor)
            .await?;
        Ok(exists)
    }

    /// Idempotent: adding an existing member is a no-op.
    pub async fn add_member<'e, E>(&self, executor: E, user_id: Uuid, tenant_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO tenant_members (user_id, tenant_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(tenant_id)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn remove_member<'e, E>(&self, executor: E, user_id: Uuid, tenant_id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM tenant_members WHERE user_id = $1 AND tenant_id = $2")
            .bind(user_id)
            .bind(tenant_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_members<'e, E>(&self, executor: E, tenant_id: Uuid) -> Result<Vec<TenantMember>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let members = sqlx::query_as::<_, TenantMember>(
            r#"
            SELECT u.id AS user_id, u.email, m.created_at AS joined_at
            FROM tenant_members m
            JOIN users u ON u.id = m.user_id
            WHERE m.tenant_id = $1
            ORDER BY u.email
            "#,
        )
        .bind(tenant_id)
        .fetch_all(executor)
        .await?;
        Ok(members)
    }

    pub async fn list_for_user<'e, E>(&self, executor: E, user_id: Uuid) -> Result<Vec<Tenant>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let tenants = sqlx::query_as::<_, Tenant>(
            r#"
            SELECT t.* FROM tenants t
            JOIN tenant_members m ON m.tenant_id = t.id
            WHERE m.user_id = $1
            ORDER BY t.name
            "#,
        )
        .bind(user_id)
        .fetch_all(executor)
        .await?;
        Ok(tenants)
    }

    pub async fn list_all<'e, E>(&self, executor: E) -> Result<Vec<Tenant>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let tenants = sqlx::query_as::<_, Tenant>("SELECT * FROM tenants ORDER BY name")
            .fetch_all(executor)
            .await?;
        Ok(tenants)
    }
}
