// src/models/articles.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

/// A `[start, end)` range of the scanned DMC that must equal the base DMC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DmcCheck {
    #[schema(example = 0)]
    pub start: usize,
    #[schema(example = 7)]
    pub end: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DmcDateFormat {
    /// `YYDDD`, day of the year.
    YearOrdinal,
    /// `YYMMDD`.
    YearMonthDay,
}

impl DmcDateFormat {
    pub fn width(&self) -> usize {
        match self {
            DmcDateFormat::YearOrdinal => 5,
            DmcDateFormat::YearMonthDay => 6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DmcDateCheck {
    pub start: usize,
    pub format: DmcDateFormat,
    #[schema(example = 30)]
    pub max_age_days: i64,
}

/// Per-article scan configuration of one workplace.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ArticleConfig {
    pub id: Uuid,
    #[schema(ignore)]
    #[serde(skip)]
    pub tenant_id: Uuid,
    #[schema(example = "eol-29")]
    pub workplace: String,
    #[schema(example = "28042")]
    pub article_number: String,
    #[schema(example = "Rear seat bracket")]
    pub article_name: String,
    #[schema(example = 12)]
    pub pieces_per_box: i32,
    #[schema(example = 20)]
    pub boxes_per_pallet: Option<i32>,
    pub requires_dmc: bool,
    #[schema(example = "A7552001924150XX00001")]
    pub base_dmc: Option<String>,
    #[schema(value_type = Vec<DmcCheck>)]
    pub dmc_checks: Json<Vec<DmcCheck>>,
    #[schema(value_type = Option<DmcDateCheck>)]
    pub dmc_date_check: Option<Json<DmcDateCheck>>,
    #[schema(example = "050")]
    pub hydra_process: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ArticleConfig {
    pub fn has_pallet_stage(&self) -> bool {
        self.boxes_per_pallet.is_some()
    }

    /// Pieces on a full pallet, when the article is palletized.
    pub fn pallet_quantity(&self) -> Option<i64> {
        self.boxes_per_pallet
            .map(|boxes| i64::from(boxes) * i64::from(self.pieces_per_box))
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ArticleConfigPayload {
    #[validate(length(min = 1, max = 64, message = "validation.required"))]
    pub workplace: String,
    #[validate(length(min = 1, max = 32, message = "validation.required"))]
    pub article_number: String,
    #[validate(length(min = 1, max = 200, message = "validation.required"))]
    pub article_name: String,
    #[validate(range(min = 1, message = "validation.positive"))]
    pub pieces_per_box: i32,
    #[validate(range(min = 1, message = "validation.positive"))]
    pub boxes_per_pallet: Option<i32>,
    #[serde(default = "default_true")]
    pub requires_dmc: bool,
    pub base_dmc: Option<String>,
    #[serde(default)]
    pub dmc_checks: Vec<DmcCheck>,
    pub dmc_date_check: Option<DmcDateCheck>,
    pub hydra_process: Option<String>,
}

fn default_true() -> bool {
    true
}

fn error_with(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

impl ArticleConfigPayload {
    /// Field-level validation plus the rules tying the DMC settings together.
    pub fn validate_all(&self) -> Result<(), ValidationErrors> {
        let mut errors = match self.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(e) => e,
        };

        if self.requires_dmc {
            match self.base_dmc.as_deref().map(str::trim) {
                None | Some("") => errors.add(
                    "baseDmc",
                    error_with("required", "validation.base_dmc_required"),
                ),
                Some(base) => {
                    let len = base.len();
                    let ranges_ok = self
                        .dmc_checks
                        .iter()
                        .all(|c| c.start < c.end && c.end <= len);
                    if !ranges_ok {
                        errors.add(
                            "dmcChecks",
                            error_with("range", "validation.range_outside_base_dmc"),
                        );
                    }
                    if let Some(date) = &self.dmc_date_check {
                        let outside = date
                            .start
                            .checked_add(date.format.width())
                            .is_none_or(|end| end > len);
                        if outside || date.max_age_days < 0 {
                            errors.add(
                                "dmcDateCheck",
                                error_with("range", "validation.range_outside_base_dmc"),
                            );
                        }
                    }
                }
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ArticleFilter {
    pub workplace: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> ArticleConfigPayload {
        ArticleConfigPayload {
            workplace: "eol-29".into(),
            article_number: "28042".into(),
            article_name: "Bracket".into(),
            pieces_per_box: 12,
            boxes_per_pallet: Some(20),
            requires_dmc: true,
            base_dmc: Some("A755200124150XX0001".into()),
            dmc_checks: vec![DmcCheck { start: 0, end: 7 }],
            dmc_date_check: Some(DmcDateCheck {
                start: 8,
                format: DmcDateFormat::YearOrdinal,
                max_age_days: 30,
            }),
            hydra_process: Some("050".into()),
        }
    }

    #[test]
    fn consistent_payload_passes() {
        assert!(payload().validate_all().is_ok());
    }

    #[test]
    fn dmc_article_without_base_dmc_fails() {
        let mut p = payload();
        p.base_dmc = None;
        let errors = p.validate_all().unwrap_err();
        assert!(errors.field_errors().contains_key("baseDmc"));
    }

    #[test]
    fn check_range_beyond_base_dmc_fails() {
        let mut p = payload();
        p.dmc_checks = vec![DmcCheck { start: 10, end: 40 }];
        let errors = p.validate_all().unwrap_err();
        assert!(errors.field_errors().contains_key("dmcChecks"));
    }

    #[test]
    fn date_check_start_at_usize_max_is_rejected() {
        let mut p = payload();
        p.dmc_date_check = Some(DmcDateCheck {
            start: usize::MAX,
            format: DmcDateFormat::YearOrdinal,
            max_age_days: 30,
        });
        let errors = p.validate_all().unwrap_err();
        assert!(errors.field_errors().contains_key("dmcDateCheck"));
    }

    #[test]
    fn count_only_article_needs_no_base_dmc() {
        let mut p = payload();
        p.requires_dmc = false;
        p.base_dmc = None;
        assert!(p.validate_all().is_ok());
    }

    #[test]
    fn zero_box_size_fails() {
        let mut p = payload();
        p.pieces_per_box = 0;
        assert!(p.validate_all().is_err());
    }
}
