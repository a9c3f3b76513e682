// src/db/project_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::projects::{ProjectSummaryRow, ProjectTimeEntry, ProjectTimePayload},
};

#[derive(Clone, Default)]
pub struct ProjectRepository;

impl ProjectRepository {
    pub fn new() -> Self {
        Self
    }

    /// Serializes entries of one user so the daily total check holds.
    pub async fn lock_user<'e, E>(&self, executor: E, tenant_id: Uuid, user_email: &str) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(format!("project-time:{}:{}", tenant_id, user_email))
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn day_total<'e, E>(&self, executor: E, tenant_id: Uuid, user_email: &str, date: NaiveDate) -> Result<Decimal, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let total: Decimal = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(hours), 0) FROM project_time_entries
            WHERE tenant_id = $1 AND user_email = $2 AND date = $3
            "#,
        )
        .bind(tenant_id)
        .bind(user_email)
        .bind(date)
        .fetch_one(executor)
        .await?;
        Ok(total)
    }

    pub async fn insert<'e, E>(&self, executor: E, tenant_id: Uuid, user_email: &str, input: &ProjectTimePayload) -> Result<ProjectTimeEntry, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, ProjectTimeEntry>(
            r#"
            INSERT INTO project_time_entries (tenant_id, project, user_email, date, hours, note)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(input.project.trim())
        .bind(user_email)
        .bind(input.date)
        .bind(input.hours)
        .bind(input.note.as_deref())
        .fetch_one(executor)
        .await?;
        Ok(row)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<Option<ProjectTimeEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, ProjectTimeEntry>(
            "SELECT * FROM project_time_entries WHERE tenant_id = $1 AND id = $2",
        )
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
        let result = sqlx::query("DELETE FROM project_time_entries WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_for_user<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        user_email: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ProjectTimeEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, ProjectTimeEntry>(
            r#"
            SELECT * FROM project_time_entries
            WHERE tenant_id = $1 AND user_email = $2 AND date >= $3 AND date < $4
            ORDER BY date DESC, created_at DESC
            "#,
        )
        .bind(tenant_id)
        .bind(user_email)
        .bind(from)
        .bind(to)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    pub async fn summary<'e, E>(&self, executor: E, tenant_id: Uuid, from: NaiveDate, to: NaiveDate) -> Result<Vec<ProjectSummaryRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, ProjectSummaryRow>(
            r#"
            SELECT project, SUM(hours) AS hours, COUNT(DISTINCT user_email) AS contributors
            FROM project_time_entries
            WHERE tenant_id = $1 AND date >= $2 AND date < $3
            GROUP BY project
            ORDER BY project
            "#,
        )
        .bind(tenant_id)
        .bind(from)
        .bind(to)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }
}
