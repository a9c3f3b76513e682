// src/db/overtime_repo.rs

use chrono::NaiveDate;
use sqlx::{Executor, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::overtime::{Month, OvertimePayload, OvertimeRequest, OvertimeStatus, OvertimeSummaryRow},
};

#[derive(Clone, Default)]
pub struct OvertimeRepository;

impl OvertimeRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn create<'e, E>(&self, executor: E, tenant_id: Uuid, created_by: &str, input: &OvertimePayload) -> Result<OvertimeRequest, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, OvertimeRequest>(
            r#"
            INSERT INTO overtime_requests (tenant_id, employee, date, hours, reason, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(input.employee.trim())
        .bind(input.date)
        .bind(input.hours)
        .bind(input.reason.trim())
        .bind(created_by)
        .fetch_one(executor)
        .await?;
        Ok(row)
    }

    /// Moves a request from `from` to `to`; `None` when it was not in `from`.
    pub async fn transition<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        from: OvertimeStatus,
        to: OvertimeStatus,
        actor: &str,
    ) -> Result<Option<OvertimeRequest>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, OvertimeRequest>(
            r#"
            UPDATE overtime_requests SET
                status = $4,
                decided_by = CASE WHEN $4 IN ('APPROVED'::overtime_status, 'REJECTED'::overtime_status) THEN $5 ELSE decided_by END,
                decided_at = CASE WHEN $4 IN ('APPROVED'::overtime_status, 'REJECTED'::overtime_status) THEN NOW() ELSE decided_at END,
                accounted_at = CASE WHEN $4 = 'ACCOUNTED'::overtime_status THEN NOW() ELSE accounted_at END
            WHERE tenant_id = $1 AND id = $2 AND status = $3
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .bind(from)
        .bind(to)
        .bind(actor)
        .fetch_optional(executor)
        .await?;
        Ok(row)
    }

    pub async fn exists<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM overtime_requests WHERE tenant_id = $1 AND id = $2)",
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_one(executor)
        .await?;
        Ok(exists)
    }

    pub async fn list<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        status: Option<OvertimeStatus>,
        month: Option<Month>,
        employee: Option<&str>,
    ) -> Result<Vec<OvertimeRequest>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM overtime_requests WHERE tenant_id = ");
        qb.push_bind(tenant_id);

        if let Some(status) = status {
            qb.push(" AND status = ").push_bind(status);
        }
        if let Some(month) = month {
            qb.push(" AND date >= ").push_bind(month.first_day);
            qb.push(" AND date < ").push_bind(month.end());
        }
        if let Some(employee) = employee {
            qb.push(" AND employee ILIKE ").push_bind(format!("%{}%", employee.trim()));
        }
        qb.push(" ORDER BY date DESC, created_at DESC");

        let rows = qb.build_query_as::<OvertimeRequest>().fetch_all(executor).await?;
        Ok(rows)
    }

    pub async fn summary<'e, E>(&self, executor: E, tenant_id: Uuid, from: NaiveDate, to: NaiveDate) -> Result<Vec<OvertimeSummaryRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, OvertimeSummaryRow>(
            r#"
            SELECT employee,
                   COALESCE(SUM(hours) FILTER (WHERE status = 'APPROVED'), 0) AS approved_hours,
                   COALESCE(SUM(hours) FILTER (WHERE status = 'ACCOUNTED'), 0) AS accounted_hours
            FROM overtime_requests
            WHERE tenant_id = $1 AND date >= $2 AND date < $3
              AND status IN ('APPROVED', 'ACCOUNTED')
            GROUP BY employee
            ORDER BY employee
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
