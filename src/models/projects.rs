// src/models/projects.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::overtime::hours_within;

pub const MAX_DAILY_HOURS: i64 = 24;

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectTimeEntry {
    pub id: Uuid,
    #[schema(ignore)]
    #[serde(skip)]
    pub tenant_id: Uuid,
    pub project: String,
    pub user_email: String,
    pub date: NaiveDate,
    #[schema(value_type = f64)]
    pub hours: Decimal,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

fn entry_hours(hours: &Decimal) -> Result<(), ValidationError> {
    hours_within(hours, MAX_DAILY_HOURS)
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ProjectTimePayload {
    #[validate(length(min = 1, max = 120, message = "validation.required"))]
    pub project: String,
    pub date: NaiveDate,
    #[validate(custom(function = "entry_hours"))]
    #[schema(value_type = f64)]
    pub hours: Decimal,
    #[validate(length(max = 500, message = "validation.too_long"))]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummaryRow {
    pub project: String,
    #[schema(value_type = f64)]
    pub hours: Decimal,
    pub contributors: i64,
}
