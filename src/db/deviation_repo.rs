// src/db/deviation_repo.rs

use sqlx::{types::Json, Executor, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::{db_utils::map_unique_violation, error::AppError},
    models::deviations::{Approvals, CorrectiveAction, Deviation, DeviationFilter, DeviationPayload, DeviationStatus},
};

#[derive(Clone, Default)]
pub struct DeviationRepository;

impl DeviationRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn insert<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        internal_id: &str,
        status: DeviationStatus,
        owner: &str,
        input: &DeviationPayload,
    ) -> Result<Deviation, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Deviation>(
            r#"
            INSERT INTO deviations (
                tenant_id, internal_id, status, owner,
                article_number, article_name, workplace, drawing_number, quantity, charge,
                description, reason, customer_number, customer_authorization, area,
                period_from, period_to
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(internal_id)
        .bind(status)
        .bind(owner)
        .bind(input.article_number.trim())
        .bind(input.article_name.trim())
        .bind(input.workplace.as_deref())
        .bind(input.drawing_number.as_deref())
        .bind(input.quantity)
        .bind(input.charge.as_deref())
        .bind(input.description.trim())
        .bind(input.reason.trim())
        .bind(input.customer_number.as_deref())
        .bind(input.customer_authorization)
        .bind(input.area)
        .bind(input.period_from)
        .bind(input.period_to)
        .fetch_one(executor)
        .await
        .map_err(|e| map_unique_violation(e, "deviation number"))
    }

    /// Replaces the editable fields; approvals are reset at the same time.
    pub async fn update_content<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        status: DeviationStatus,
        input: &DeviationPayload,
    ) -> Result<Deviation, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let deviation = sqlx::query_as::<_, Deviation>(
            r#"
            UPDATE deviations SET
                status = $3,
                article_number = $4, article_name = $5, workplace = $6, drawing_number = $7,
                quantity = $8, charge = $9, description = $10, reason = $11,
                customer_number = $12, customer_authorization = $13, area = $14,
                period_from = $15, period_to = $16,
                approvals = '{}'::jsonb,
                edited_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .bind(status)
        .bind(input.article_number.trim())
        .bind(input.article_name.trim())
        .bind(input.workplace.as_deref())
        .bind(input.drawing_number.as_deref())
        .bind(input.quantity)
        .bind(input.charge.as_deref())
        .bind(input.description.trim())
        .bind(input.reason.trim())
        .bind(input.customer_number.as_deref())
        .bind(input.customer_authorization)
        .bind(input.area)
        .bind(input.period_from)
        .bind(input.period_to)
        .fetch_one(executor)
        .await?;
        Ok(deviation)
    }

    pub async fn update_status<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        status: DeviationStatus,
        approvals: &Approvals,
    ) -> Result<Deviation, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let deviation = sqlx::query_as::<_, Deviation>(
            r#"
            UPDATE deviations SET status = $3, approvals = $4
            WHERE tenant_id = $1 AND id = $2
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .bind(status)
        .bind(Json(approvals))
        .fetch_one(executor)
        .await?;
        Ok(deviation)
    }

    pub async fn update_actions<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        actions: &[CorrectiveAction],
    ) -> Result<Deviation, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let deviation = sqlx::query_as::<_, Deviation>(
            r#"
            UPDATE deviations SET corrective_actions = $3
            WHERE tenant_id = $1 AND id = $2
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .bind(Json(actions))
        .fetch_one(executor)
        .await?;
        Ok(deviation)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<Option<Deviation>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let deviation = sqlx::query_as::<_, Deviation>("SELECT * FROM deviations WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(deviation)
    }

    /// Same as `find_by_id`, holding the row until the transaction ends.
    pub async fn find_for_update<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<Option<Deviation>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let deviation = sqlx::query_as::<_, Deviation>(
            "SELECT * FROM deviations WHERE tenant_id = $1 AND id = $2 FOR UPDATE",
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(deviation)
    }

    /// Status is left to the caller: `valid` and `closed` are derived at read time.
    pub async fn list<'e, E>(&self, executor: E, tenant_id: Uuid, filter: &DeviationFilter) -> Result<Vec<Deviation>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM deviations WHERE tenant_id = ");
        qb.push_bind(tenant_id);

        if let Some(area) = filter.area {
            qb.push(" AND area = ").push_bind(area);
        }
        if let Some(owner) = &filter.owner {
            qb.push(" AND owner = ").push_bind(owner.to_lowercase());
        }
        if let Some(article) = &filter.article_number {
            qb.push(" AND article_number = ").push_bind(article.clone());
        }
        qb.push(" ORDER BY created_at DESC");

        let deviations = qb.build_query_as::<Deviation>().fetch_all(executor).await?;
        Ok(deviations)
    }

    pub async fn delete<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM deviations WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
