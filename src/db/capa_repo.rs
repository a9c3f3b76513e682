// src/db/capa_repo.rs

use sqlx::{types::Json, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::{db_utils::map_unique_violation, error::AppError},
    models::capa::{Capa, CapaPayload, EditStamp},
};

#[derive(Clone, Default)]
pub struct CapaRepository;

impl CapaRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        input: &CapaPayload,
        edited: &EditStamp,
    ) -> Result<Capa, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Capa>(
            r#"
            INSERT INTO capa (tenant_id, article_number, client, line, client_part, piff, machines, edited)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(input.article_number.trim())
        .bind(input.client.trim())
        .bind(input.line.trim())
        .bind(input.client_part.as_deref())
        .bind(input.piff.as_deref())
        .bind(Json(&input.machines))
        .bind(Json(edited))
        .fetch_one(executor)
        .await
        .map_err(|e| map_unique_violation(e, "capa article"))
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        input: &CapaPayload,
        edited: &EditStamp,
    ) -> Result<Option<Capa>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Capa>(
            r#"
            UPDATE capa SET
                article_number = $3, client = $4, line = $5, client_part = $6, piff = $7,
                machines = $8, edited = $9
            WHERE tenant_id = $1 AND id = $2
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .bind(input.article_number.trim())
        .bind(input.client.trim())
        .bind(input.line.trim())
        .bind(input.client_part.as_deref())
        .bind(input.piff.as_deref())
        .bind(Json(&input.machines))
        .bind(Json(edited))
        .fetch_optional(executor)
        .await
        .map_err(|e| map_unique_violation(e, "capa article"))
    }

    pub async fn list<'e, E>(&self, executor: E, tenant_id: Uuid, client: Option<&str>) -> Result<Vec<Capa>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, Capa>(
            r#"
            SELECT * FROM capa
            WHERE tenant_id = $1 AND ($2::text IS NULL OR client = $2)
            ORDER BY client, article_number
            "#,
        )
        .bind(tenant_id)
        .bind(client)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<Option<Capa>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, Capa>("SELECT * FROM capa WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(row)
    }

    pub async fn delete<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM capa WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
