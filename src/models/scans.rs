// src/models/scans.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "scan_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Box,
    Pallet,
    Warehouse,
    Rework,
}

/// One tracked part (DMC articles) or one counted box (count-only articles).
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Scan {
    pub id: Uuid,
    #[schema(ignore)]
    #[serde(skip)]
    pub tenant_id: Uuid,
    pub status: ScanStatus,
    pub workplace: String,
    pub article_number: String,
    pub dmc: Option<String>,
    pub operator: String,
    pub time: DateTime<Utc>,
    pub hydra_batch: Option<String>,
    pub hydra_operator: Option<String>,
    pub hydra_time: Option<DateTime<Utc>>,
    pub pallet_batch: Option<String>,
    pub pallet_operator: Option<String>,
    pub pallet_time: Option<DateTime<Utc>>,
    pub rework_reason: Option<String>,
    pub rework_user: Option<String>,
    pub rework_time: Option<DateTime<Utc>>,
}

/// Why a scan was refused. The tag is what the terminals switch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ScanRejection {
    #[error("invalid")]
    Invalid,
    #[error("exists")]
    Exists,
    #[error("wrong article")]
    WrongArticle,
    #[error("wrong process")]
    WrongProcess,
    #[error("wrong quantity")]
    WrongQuantity,
    #[error("wrong date")]
    WrongDate,
    #[error("box full")]
    BoxFull,
    #[error("box not full")]
    BoxNotFull,
    #[error("pallet full")]
    PalletFull,
    #[error("pallet not full")]
    PalletNotFull,
    #[error("no pallet")]
    NoPalletStage,
}

impl ScanRejection {
    pub fn code(&self) -> &'static str {
        match self {
            ScanRejection::Invalid => "scan.invalid",
            ScanRejection::Exists => "scan.exists",
            ScanRejection::WrongArticle => "scan.wrong_article",
            ScanRejection::WrongProcess => "scan.wrong_process",
            ScanRejection::WrongQuantity => "scan.wrong_quantity",
            ScanRejection::WrongDate => "scan.wrong_date",
            ScanRejection::BoxFull => "scan.box_full",
            ScanRejection::BoxNotFull => "scan.box_not_full",
            ScanRejection::PalletFull => "scan.pallet_full",
            ScanRejection::PalletNotFull => "scan.pallet_not_full",
            ScanRejection::NoPalletStage => "scan.no_pallet_stage",
        }
    }
}

/// Fill level of the current box and pallet of a workplace/article.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScanSnapshot {
    pub workplace: String,
    pub article_number: String,
    pub pieces_per_box: i32,
    pub boxes_per_pallet: Option<i32>,
    pub box_count: i64,
    pub box_full: bool,
    pub pallet_box_count: i64,
    pub pallet_full: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    #[schema(example = "saved")]
    pub status: String,
    /// Records moved by a label scan; 1 for a single DMC or counted box.
    pub affected: u64,
    pub snapshot: ScanSnapshot,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DmcScanPayload {
    #[validate(length(min = 1, message = "validation.required"))]
    pub workplace: String,
    #[validate(length(min = 1, message = "validation.required"))]
    pub article_number: String,
    #[validate(length(min = 1, max = 64, message = "validation.invalid"))]
    pub dmc: String,
    #[validate(length(min = 1, max = 32, message = "validation.required"))]
    pub operator: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LabelScanPayload {
    #[validate(length(min = 1, message = "validation.required"))]
    pub workplace: String,
    #[validate(length(min = 1, message = "validation.required"))]
    pub article_number: String,
    #[validate(length(min = 1, max = 256, message = "validation.invalid"))]
    pub qr: String,
    #[validate(length(min = 1, max = 32, message = "validation.required"))]
    pub operator: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CountBoxPayload {
    #[validate(length(min = 1, message = "validation.required"))]
    pub workplace: String,
    #[validate(length(min = 1, message = "validation.required"))]
    pub article_number: String,
    #[validate(length(min = 1, max = 32, message = "validation.required"))]
    pub operator: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ReworkPayload {
    #[validate(length(min = 1, max = 64, message = "validation.required"))]
    pub dmc: String,
    #[validate(length(min = 1, max = 500, message = "validation.required"))]
    pub reason: String,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusQuery {
    pub workplace: String,
    pub article_number: String,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScanFilter {
    pub status: Option<ScanStatus>,
    pub workplace: Option<String>,
    pub article_number: Option<String>,
    /// Substring of the DMC or of either batch id.
    pub code: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
}

impl ScanFilter {
    pub const DEFAULT_LIMIT: i64 = 100;
    pub const MAX_LIMIT: i64 = 1000;

    pub fn effective_limit(&self) -> i64 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }
}

/// Generated pallet label, returned as PNG by the label endpoint.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PalletLabel {
    pub batch: String,
    pub payload: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_is_clamped() {
        let mut f = ScanFilter::default();
        assert_eq!(f.effective_limit(), 100);
        f.limit = Some(0);
        assert_eq!(f.effective_limit(), 1);
        f.limit = Some(50_000);
        assert_eq!(f.effective_limit(), 1000);
    }

    #[test]
    fn rejection_tags_match_terminal_strings() {
        assert_eq!(ScanRejection::Exists.to_string(), "exists");
        assert_eq!(ScanRejection::WrongQuantity.to_string(), "wrong quantity");
        assert_eq!(ScanRejection::BoxFull.code(), "scan.box_full");
    }
}
