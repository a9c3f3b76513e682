// src/services/overtime_service.rs

use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{AppError, RuleViolation},
    db::OvertimeRepository,
    models::overtime::{Month, OvertimeFilter, OvertimePayload, OvertimeRequest, OvertimeStatus, OvertimeSummaryRow},
};

#[derive(Clone)]
pub struct OvertimeService {
    overtime_repo: OvertimeRepository,
}

pub(crate) fn parse_month(value: Option<&str>) -> Result<Option<Month>, AppError> {
    match value {
        None => Ok(None),
        Some(raw) => Month::parse(raw).map(Some).ok_or_else(|| {
            let mut errors = validator::ValidationErrors::new();
            let mut err = validator::ValidationError::new("month");
            err.message = Some("validation.invalid".into());
            errors.add("month", err);
            AppError::ValidationError(errors)
        }),
    }
}

impl OvertimeService {
    pub fn new(overtime_repo: OvertimeRepository) -> Self {
        Self { overtime_repo }
    }

    pub async fn submit<'e, E>(&self, executor: E, tenant_id: Uuid, created_by: &str, payload: &OvertimePayload) -> Result<OvertimeRequest, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = self.overtime_repo.create(executor, tenant_id, created_by, payload).await?;
        tracing::info!("overtime of {}h for {} on {} submitted by {}", row.hours, row.employee, row.date, created_by);
        Ok(row)
    }

    /// Pending requests only.
    pub async fn decide<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid, approved: bool, actor: &str) -> Result<OvertimeRequest, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres, Connection = &'e mut sqlx::PgConnection>,
    {
        let to = if approved { OvertimeStatus::Approved } else { OvertimeStatus::Rejected };
        let row = self.transition(executor, tenant_id, id, OvertimeStatus::Pending, to, actor).await?;
        tracing::info!("overtime {} {:?} by {}", id, row.status, actor);
        Ok(row)
    }

    /// Approved requests only.
    pub async fn mark_accounted<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid, actor: &str) -> Result<OvertimeRequest, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres, Connection = &'e mut sqlx::PgConnection>,
    {
        let row = self
            .transition(executor, tenant_id, id, OvertimeStatus::Approved, OvertimeStatus::Accounted, actor)
            .await?;
        tracing::info!("overtime {} accounted by {}", id, actor);
        Ok(row)
    }

    async fn transition<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        from: OvertimeStatus,
        to: OvertimeStatus,
        actor: &str,
    ) -> Result<OvertimeRequest, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres, Connection = &'e mut sqlx::PgConnection>,
    {
        let mut conn = executor.acquire().await?;
        if let Some(row) = self.overtime_repo.transition(&mut *conn, tenant_id, id, from, to, actor).await? {
            return Ok(row);
        }
        if self.overtime_repo.exists(&mut *conn, tenant_id, id).await? {
            Err(RuleViolation::InvalidTransition.into())
        } else {
            Err(AppError::ResourceNotFound("overtime request".into()))
        }
    }

    pub async fn list<'e, E>(&self, executor: E, tenant_id: Uuid, filter: &OvertimeFilter) -> Result<Vec<OvertimeRequest>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let month = parse_month(filter.month.as_deref())?;
        self.overtime_repo
            .list(executor, tenant_id, filter.status, month, filter.employee.as_deref())
            .await
    }

    pub async fn summary<'e, E>(&self, executor: E, tenant_id: Uuid, month: Option<&str>) -> Result<Vec<OvertimeSummaryRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let month = parse_month(month)?.unwrap_or_else(Month::current);
        self.overtime_repo.summary(executor, tenant_id, month.first_day, month.end()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_month_is_a_validation_error() {
        assert!(matches!(parse_month(Some("2024/06")), Err(AppError::ValidationError(_))));
        assert!(parse_month(None).unwrap().is_none());
        assert!(parse_month(Some("2024-06")).unwrap().is_some());
    }
}
