// src/services/scan_service.rs

use chrono::Utc;
use sqlx::{Acquire, Executor, PgConnection, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{ArticleRepository, ScanRepository},
    models::{
        articles::ArticleConfig,
        scans::{PalletLabel, Scan, ScanFilter, ScanRejection, ScanResult, ScanSnapshot, ScanStatus},
    },
    services::scan_rules,
};

#[derive(Clone)]
pub struct ScanService {
    scan_repo: ScanRepository,
    article_repo: ArticleRepository,
}

impl ScanService {
    pub fn new(scan_repo: ScanRepository, article_repo: ArticleRepository) -> Self {
        Self { scan_repo, article_repo }
    }

    async fn load_config(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        workplace: &str,
        article_number: &str,
    ) -> Result<ArticleConfig, AppError> {
        self.article_repo
            .find_for_workplace(&mut *conn, tenant_id, workplace, article_number)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("article {} @ {}", article_number, workplace)))
    }

    async fn pallet_box_count(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        config: &ArticleConfig,
    ) -> Result<i64, AppError> {
        if config.requires_dmc {
            self.scan_repo
                .count_pallet_batches(&mut *conn, tenant_id, &config.workplace, &config.article_number)
                .await
        } else {
            self.scan_repo
                .count_by_status(&mut *conn, tenant_id, &config.workplace, &config.article_number, ScanStatus::Pallet)
                .await
        }
    }

    async fn snapshot(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        config: &ArticleConfig,
    ) -> Result<ScanSnapshot, AppError> {
        let box_count = if config.requires_dmc {
            self.scan_repo
                .count_by_status(&mut *conn, tenant_id, &config.workplace, &config.article_number, ScanStatus::Box)
                .await?
        } else {
            0
        };
        let pallet_box_count = self.pallet_box_count(conn, tenant_id, config).await?;

        Ok(build_snapshot(config, box_count, pallet_box_count))
    }

    // --- DMC ---
    pub async fn save_dmc<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        workplace: &str,
        article_number: &str,
        dmc: &str,
        operator: &str,
    ) -> Result<ScanResult, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let config = self.load_config(&mut tx, tenant_id, workplace, article_number).await?;
        if !config.requires_dmc {
            return Err(ScanRejection::WrongProcess.into());
        }

        self.scan_repo.lock_line(&mut *tx, tenant_id, workplace, article_number).await?;

        let box_count = self
            .scan_repo
            .count_by_status(&mut *tx, tenant_id, workplace, article_number, ScanStatus::Box)
            .await?;
        if box_count >= i64::from(config.pieces_per_box) {
            return Err(ScanRejection::BoxFull.into());
        }

        scan_rules::validate_dmc(dmc, &config, Utc::now().date_naive())?;
        let dmc = dmc.trim();

        if self.scan_repo.live_dmc_exists(&mut *tx, tenant_id, dmc).await? {
            return Err(ScanRejection::Exists.into());
        }

        self.scan_repo
            .insert(&mut *tx, tenant_id, workplace, article_number, Some(dmc), ScanStatus::Box, operator)
            .await?;

        let snapshot = self.snapshot(&mut tx, tenant_id, &config).await?;
        tx.commit().await?;

        tracing::info!("dmc {} saved at {} for {} by {}", dmc, workplace, article_number, operator);
        Ok(saved(1, snapshot))
    }

    // --- HYDRA (box label) ---
    pub async fn save_hydra_batch<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        workplace: &str,
        article_number: &str,
        qr: &str,
        operator: &str,
    ) -> Result<ScanResult, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let config = self.load_config(&mut tx, tenant_id, workplace, article_number).await?;
        if !config.requires_dmc {
            return Err(ScanRejection::WrongProcess.into());
        }

        let label = scan_rules::parse_label(qr)?;
        scan_rules::check_hydra_label(&label, &config)?;

        self.scan_repo.lock_line(&mut *tx, tenant_id, workplace, article_number).await?;

        if self.scan_repo.hydra_batch_used(&mut *tx, tenant_id, &label.batch).await? {
            return Err(ScanRejection::Exists.into());
        }

        if let Some(boxes_per_pallet) = config.boxes_per_pallet {
            let on_pallet = self.pallet_box_count(&mut tx, tenant_id, &config).await?;
            if on_pallet >= i64::from(boxes_per_pallet) {
                return Err(ScanRejection::PalletFull.into());
            }
        }

        let box_count = self
            .scan_repo
            .count_by_status(&mut *tx, tenant_id, workplace, article_number, ScanStatus::Box)
            .await?;
        if box_count < i64::from(config.pieces_per_box) {
            return Err(ScanRejection::BoxNotFull.into());
        }

        let next_status = if config.has_pallet_stage() {
            ScanStatus::Pallet
        } else {
            ScanStatus::Warehouse
        };
        let affected = self
            .scan_repo
            .close_box(&mut *tx, tenant_id, workplace, article_number, &label.batch, operator, next_status)
            .await?;

        let snapshot = self.snapshot(&mut tx, tenant_id, &config).await?;
        tx.commit().await?;

        tracing::info!(
            "hydra batch {} closed box of {} records at {} for {}",
            label.batch,
            affected,
            workplace,
            article_number
        );
        Ok(saved(affected, snapshot))
    }

    // --- Counted boxes (articles without DMC) ---
    pub async fn count_box<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        workplace: &str,
        article_number: &str,
        operator: &str,
    ) -> Result<ScanResult, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let config = self.load_config(&mut tx, tenant_id, workplace, article_number).await?;
        if config.requires_dmc {
            return Err(ScanRejection::WrongProcess.into());
        }

        self.scan_repo.lock_line(&mut *tx, tenant_id, workplace, article_number).await?;

        let status = match config.boxes_per_pallet {
            Some(boxes_per_pallet) => {
                let on_pallet = self.pallet_box_count(&mut tx, tenant_id, &config).await?;
                if on_pallet >= i64::from(boxes_per_pallet) {
                    return Err(ScanRejection::PalletFull.into());
                }
                ScanStatus::Pallet
            }
            None => ScanStatus::Warehouse,
        };

        self.scan_repo
            .insert(&mut *tx, tenant_id, workplace, article_number, None, status, operator)
            .await?;

        let snapshot = self.snapshot(&mut tx, tenant_id, &config).await?;
        tx.commit().await?;

        tracing::info!("box counted at {} for {} by {}", workplace, article_number, operator);
        Ok(saved(1, snapshot))
    }

    // --- Pallet label ---
    pub async fn save_pallet_batch<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        workplace: &str,
        article_number: &str,
        qr: &str,
        operator: &str,
    ) -> Result<ScanResult, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let config = self.load_config(&mut tx, tenant_id, workplace, article_number).await?;
        let boxes_per_pallet = config.boxes_per_pallet.ok_or(ScanRejection::NoPalletStage)?;

        let label = scan_rules::parse_label(qr)?;
        scan_rules::check_pallet_label(&label, &config)?;

        self.scan_repo.lock_line(&mut *tx, tenant_id, workplace, article_number).await?;

        if self.scan_repo.pallet_batch_used(&mut *tx, tenant_id, &label.batch).await? {
            return Err(ScanRejection::Exists.into());
        }

        let on_pallet = self.pallet_box_count(&mut tx, tenant_id, &config).await?;
        if on_pallet < i64::from(boxes_per_pallet) {
            return Err(ScanRejection::PalletNotFull.into());
        }

        let affected = self
            .scan_repo
            .close_pallet(&mut *tx, tenant_id, workplace, article_number, &label.batch, operator)
            .await?;

        let snapshot = self.snapshot(&mut tx, tenant_id, &config).await?;
        tx.commit().await?;

        tracing::info!(
            "pallet batch {} moved {} records to warehouse at {} for {}",
            label.batch,
            affected,
            workplace,
            article_number
        );
        Ok(saved(affected, snapshot))
    }

    pub async fn status<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        workplace: &str,
        article_number: &str,
    ) -> Result<ScanSnapshot, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres, Connection = &'e mut PgConnection>,
    {
        let mut conn = executor.acquire().await?;
        let config = self.load_config(&mut conn, tenant_id, workplace, article_number).await?;
        self.snapshot(&mut conn, tenant_id, &config).await
    }

    pub async fn mark_rework<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        dmc: &str,
        reason: &str,
        user_email: &str,
    ) -> Result<Scan, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let dmc = dmc.trim();
        let scan = self
            .scan_repo
            .mark_rework(executor, tenant_id, dmc, reason.trim(), user_email)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("dmc {}", dmc)))?;

        tracing::info!("dmc {} sent to rework by {}", dmc, user_email);
        Ok(scan)
    }

    pub async fn search<'e, E>(&self, executor: E, tenant_id: Uuid, filter: &ScanFilter) -> Result<Vec<Scan>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.scan_repo.search(executor, tenant_id, filter).await
    }

    /// Builds the payload of a fresh pallet label with a generated batch id.
    pub async fn pallet_label<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        workplace: &str,
        article_number: &str,
    ) -> Result<PalletLabel, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres, Connection = &'e mut PgConnection>,
    {
        let mut conn = executor.acquire().await?;
        let config = self.load_config(&mut conn, tenant_id, workplace, article_number).await?;

        let batch = generate_pallet_batch(workplace);
        let payload = scan_rules::pallet_label_payload(&config, &batch).ok_or(ScanRejection::NoPalletStage)?;

        Ok(PalletLabel { batch, payload })
    }
}

fn saved(affected: u64, snapshot: ScanSnapshot) -> ScanResult {
    ScanResult { status: "saved".to_string(), affected, snapshot }
}

fn build_snapshot(config: &ArticleConfig, box_count: i64, pallet_box_count: i64) -> ScanSnapshot {
    ScanSnapshot {
        workplace: config.workplace.clone(),
        article_number: config.article_number.clone(),
        pieces_per_box: config.pieces_per_box,
        boxes_per_pallet: config.boxes_per_pallet,
        box_count,
        box_full: config.requires_dmc && box_count >= i64::from(config.pieces_per_box),
        pallet_box_count,
        pallet_full: config
            .boxes_per_pallet
            .is_some_and(|boxes| pallet_box_count >= i64::from(boxes)),
    }
}

fn generate_pallet_batch(workplace: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "P{}{}{}",
        workplace.to_uppercase().replace(|c: char| !c.is_ascii_alphanumeric(), ""),
        Utc::now().format("%y%m%d%H%M"),
        &suffix[..4].to_uppercase()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::types::Json;

    fn config(requires_dmc: bool, boxes_per_pallet: Option<i32>) -> ArticleConfig {
        ArticleConfig {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            workplace: "eol-29".into(),
            article_number: "28042".into(),
            article_name: "Bracket".into(),
            pieces_per_box: 12,
            boxes_per_pallet,
            requires_dmc,
            base_dmc: None,
            dmc_checks: Json(vec![]),
            dmc_date_check: None,
            hydra_process: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn snapshot_reports_full_box_and_pallet() {
        let snap = build_snapshot(&config(true, Some(20)), 12, 20);
        assert!(snap.box_full);
        assert!(snap.pallet_full);

        let snap = build_snapshot(&config(true, Some(20)), 11, 19);
        assert!(!snap.box_full);
        assert!(!snap.pallet_full);
    }

    #[test]
    fn article_without_pallet_stage_is_never_pallet_full() {
        let snap = build_snapshot(&config(true, None), 0, 500);
        assert!(!snap.pallet_full);
    }

    #[test]
    fn count_only_article_has_no_open_box() {
        let snap = build_snapshot(&config(false, Some(4)), 0, 4);
        assert!(!snap.box_full);
        assert!(snap.pallet_full);
    }

    #[test]
    fn generated_batch_is_alphanumeric() {
        let batch = generate_pallet_batch("eol-29");
        assert!(batch.starts_with("PEOL29"));
        assert!(batch.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
