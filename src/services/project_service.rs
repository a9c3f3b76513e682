// src/services/project_service.rs

use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{AppError, RuleViolation},
    db::ProjectRepository,
    models::{
        overtime::Month,
        projects::{ProjectSummaryRow, ProjectTimeEntry, ProjectTimePayload, MAX_DAILY_HOURS},
    },
    services::overtime_service::parse_month,
};

#[derive(Clone)]
pub struct ProjectService {
    project_repo: ProjectRepository,
}

pub(crate) fn check_daily_total(booked: Decimal, adding: Decimal) -> Result<(), RuleViolation> {
    if booked + adding > Decimal::from(MAX_DAILY_HOURS) {
        Err(RuleViolation::DailyHoursExceeded)
    } else {
        Ok(())
    }
}

impl ProjectService {
    pub fn new(project_repo: ProjectRepository) -> Self {
        Self { project_repo }
    }

    pub async fn add_entry<'e, E>(&self, executor: E, tenant_id: Uuid, user_email: &str, payload: &ProjectTimePayload) -> Result<ProjectTimeEntry, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        self.project_repo.lock_user(&mut *tx, tenant_id, user_email).await?;
        let booked = self.project_repo.day_total(&mut *tx, tenant_id, user_email, payload.date).await?;
        check_daily_total(booked, payload.hours)?;

        let entry = self.project_repo.insert(&mut *tx, tenant_id, user_email, payload).await?;
        tx.commit().await?;

        tracing::info!("{}h booked on {} by {} for {}", entry.hours, entry.project, user_email, entry.date);
        Ok(entry)
    }

    pub async fn delete_entry<'e, E>(&self, executor: E, tenant_id: Uuid, user_email: &str, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let entry = self
            .project_repo
            .find_by_id(&mut *tx, tenant_id, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("time entry".into()))?;
        if entry.user_email != user_email {
            return Err(RuleViolation::NotOwner.into());
        }

        self.project_repo.delete(&mut *tx, tenant_id, id).await?;
        tx.commit().await?;

        tracing::info!("time entry {} deleted by {}", id, user_email);
        Ok(())
    }

    pub async fn my_entries<'e, E>(&self, executor: E, tenant_id: Uuid, user_email: &str, month: Option<&str>) -> Result<Vec<ProjectTimeEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let month = parse_month(month)?.unwrap_or_else(Month::current);
        self.project_repo
            .list_for_user(executor, tenant_id, user_email, month.first_day, month.end())
            .await
    }

    pub async fn project_summary<'e, E>(&self, executor: E, tenant_id: Uuid, month: Option<&str>) -> Result<Vec<ProjectSummaryRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let month = parse_month(month)?.unwrap_or_else(Month::current);
        self.project_repo.summary(executor, tenant_id, month.first_day, month.end()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_may_be_filled_to_exactly_24_hours() {
        assert!(check_daily_total(Decimal::from(16), Decimal::from(8)).is_ok());
    }

    #[test]
    fn day_cannot_exceed_24_hours() {
        assert_eq!(
            check_daily_total(Decimal::from(20), Decimal::new(45, 1)),
            Err(RuleViolation::DailyHoursExceeded)
        );
    }
}
