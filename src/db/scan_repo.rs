// src/db/scan_repo.rs

use sqlx::{Executor, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::scans::{Scan, ScanFilter, ScanStatus},
};

#[derive(Clone, Default)]
pub struct ScanRepository;

impl ScanRepository {
    pub fn new() -> Self {
        Self
    }

    /// Serializes scans of one workplace/article until the transaction ends.
    pub async fn lock_line<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        workplace: &str,
        article_number: &str,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let key = format!("scan:{}:{}:{}", tenant_id, workplace, article_number);
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(key)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn count_by_status<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        workplace: &str,
        article_number: &str,
        status: ScanStatus,
    ) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM scans
            WHERE tenant_id = $1 AND workplace = $2 AND article_number = $3 AND status = $4
            "#,
        )
        .bind(tenant_id)
        .bind(workplace)
        .bind(article_number)
        .bind(status)
        .fetch_one(executor)
        .await?;
        Ok(count)
    }

    /// Boxes on the open pallet of a DMC article: distinct HYDRA batches.
    pub async fn count_pallet_batches<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        workplace: &str,
        article_number: &str,
    ) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(DISTINCT hydra_batch) FROM scans
            WHERE tenant_id = $1 AND workplace = $2 AND article_number = $3 AND status = 'PALLET'
            "#,
        )
        .bind(tenant_id)
        .bind(workplace)
        .bind(article_number)
        .fetch_one(executor)
        .await?;
        Ok(count)
    }

    /// True when the DMC is tracked with any status other than rework.
    pub async fn live_dmc_exists<'e, E>(&self, executor: E, tenant_id: Uuid, dmc: &str) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM scans WHERE tenant_id = $1 AND dmc = $2 AND status <> 'REWORK')",
        )
        .bind(tenant_id)
        .bind(dmc)
        .fetch_one(executor)
        .await?;
        Ok(exists)
    }

    pub async fn hydra_batch_used<'e, E>(&self, executor: E, tenant_id: Uuid, batch: &str) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM scans WHERE tenant_id = $1 AND hydra_batch = $2)",
        )
        .bind(tenant_id)
        .bind(batch)
        .fetch_one(executor)
        .await?;
        Ok(exists)
    }

    pub async fn pallet_batch_used<'e, E>(&self, executor: E, tenant_id: Uuid, batch: &str) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM scans WHERE tenant_id = $1 AND pallet_batch = $2)",
        )
        .bind(tenant_id)
        .bind(batch)
        .fetch_one(executor)
        .await?;
        Ok(exists)
    }

    pub async fn insert<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        workplace: &str,
        article_number: &str,
        dmc: Option<&str>,
        status: ScanStatus,
        operator: &str,
    ) -> Result<Scan, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Scan>(
            r#"
            INSERT INTO scans (tenant_id, workplace, article_number, dmc, status, operator)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(workplace)
        .bind(article_number)
        .bind(dmc)
        .bind(status)
        .bind(operator)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            // The partial unique index backs the duplicate rule.
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::ScanRejected(crate::models::scans::ScanRejection::Exists);
                }
            }
            e.into()
        })
    }

    /// Closes the open box: every `BOX` record gets the HYDRA batch.
    pub async fn close_box<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        workplace: &str,
        article_number: &str,
        hydra_batch: &str,
        operator: &str,
        next_status: ScanStatus,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE scans
            SET status = $5, hydra_batch = $4, hydra_operator = $6, hydra_time = NOW()
            WHERE tenant_id = $1 AND workplace = $2 AND article_number = $3 AND status = 'BOX'
            "#,
        )
        .bind(tenant_id)
        .bind(workplace)
        .bind(article_number)
        .bind(hydra_batch)
        .bind(next_status)
        .bind(operator)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    /// Closes the open pallet: every `PALLET` record goes to the warehouse.
    pub async fn close_pallet<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        workplace: &str,
        article_number: &str,
        pallet_batch: &str,
        operator: &str,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE scans
            SET status = 'WAREHOUSE', pallet_batch = $4, pallet_operator = $5, pallet_time = NOW()
            WHERE tenant_id = $1 AND workplace = $2 AND article_number = $3 AND status = 'PALLET'
            "#,
        )
        .bind(tenant_id)
        .bind(workplace)
        .bind(article_number)
        .bind(pallet_batch)
        .bind(operator)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn mark_rework<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        dmc: &str,
        reason: &str,
        user: &str,
    ) -> Result<Option<Scan>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let scan = sqlx::query_as::<_, Scan>(
            r#"
            UPDATE scans
            SET status = 'REWORK', rework_reason = $3, rework_user = $4, rework_time = NOW()
            WHERE tenant_id = $1 AND dmc = $2 AND status <> 'REWORK'
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(dmc)
        .bind(reason)
        .bind(user)
        .fetch_optional(executor)
        .await?;
        Ok(scan)
    }

    pub async fn search<'e, E>(&self, executor: E, tenant_id: Uuid, filter: &ScanFilter) -> Result<Vec<Scan>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM scans WHERE tenant_id = ");
        qb.push_bind(tenant_id);

        if let Some(status) = filter.status {
            qb.push(" AND status = ").push_bind(status);
        }
        if let Some(workplace) = &filter.workplace {
            qb.push(" AND workplace = ").push_bind(workplace.clone());
        }
        if let Some(article) = &filter.article_number {
            qb.push(" AND article_number = ").push_bind(article.clone());
        }
        if let Some(code) = filter.code.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            let pattern = format!("%{}%", code.replace('%', "\\%").replace('_', "\\_"));
            qb.push(" AND (dmc ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR hydra_batch ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR pallet_batch ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        if let Some(from) = filter.from {
            qb.push(" AND time >= ").push_bind(from);
        }
        if let Some(to) = filter.to {
            qb.push(" AND time <= ").push_bind(to);
        }

        qb.push(" ORDER BY time DESC LIMIT ").push_bind(filter.effective_limit());

        let scans = qb.build_query_as::<Scan>().fetch_all(executor).await?;
        Ok(scans)
    }
}
