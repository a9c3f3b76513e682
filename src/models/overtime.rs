// src/models/overtime.rs

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "overtime_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "lowercase")]
pub enum OvertimeStatus {
    Pending,
    Approved,
    Rejected,
    Accounted,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OvertimeRequest {
    pub id: Uuid,
    #[schema(ignore)]
    #[serde(skip)]
    pub tenant_id: Uuid,
    pub employee: String,
    pub date: NaiveDate,
    #[schema(value_type = f64)]
    pub hours: Decimal,
    pub reason: String,
    pub status: OvertimeStatus,
    pub created_by: String,
    pub decided_by: Option<String>,
    pub decided_at: Option<DateTime<Utc>>,
    pub accounted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Hours must be positive and at most `max`.
pub(crate) fn hours_within(hours: &Decimal, max: i64) -> Result<(), ValidationError> {
    if *hours > Decimal::ZERO && *hours <= Decimal::from(max) {
        Ok(())
    } else {
        let mut err = ValidationError::new("range");
        err.message = Some("validation.hours_range".into());
        err.add_param("max".into(), &max);
        Err(err)
    }
}

fn overtime_hours(hours: &Decimal) -> Result<(), ValidationError> {
    hours_within(hours, 16)
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OvertimePayload {
    #[validate(length(min = 1, max = 120, message = "validation.required"))]
    pub employee: String,
    pub date: NaiveDate,
    #[validate(custom(function = "overtime_hours"))]
    #[schema(value_type = f64)]
    pub hours: Decimal,
    #[validate(length(min = 1, max = 500, message = "validation.required"))]
    pub reason: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DecisionPayload {
    pub approved: bool,
}

/// Calendar month in `YYYY-MM` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Month {
    pub first_day: NaiveDate,
}

impl Month {
    pub fn parse(value: &str) -> Option<Self> {
        let (year, month) = value.trim().split_once('-')?;
        let first_day = NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, 1)?;
        Some(Self { first_day })
    }

    /// First day of the following month, exclusive upper bound.
    pub fn end(&self) -> NaiveDate {
        let (y, m) = (self.first_day.year(), self.first_day.month());
        let (y, m) = if m == 12 { (y + 1, 1) } else { (y, m + 1) };
        NaiveDate::from_ymd_opt(y, m, 1).unwrap_or(self.first_day)
    }

    pub fn current() -> Self {
        let today = Utc::now().date_naive();
        Self { first_day: today.with_day(1).unwrap_or(today) }
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct OvertimeFilter {
    pub status: Option<OvertimeStatus>,
    /// `YYYY-MM`
    pub month: Option<String>,
    pub employee: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct MonthQuery {
    /// `YYYY-MM`, current month when absent.
    pub month: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OvertimeSummaryRow {
    pub employee: String,
    #[schema(value_type = f64)]
    pub approved_hours: Decimal,
    #[schema(value_type = f64)]
    pub accounted_hours: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_bounds() {
        let m = Month::parse("2024-12").unwrap();
        assert_eq!(m.first_day, NaiveDate::from_ymd_opt(2024, 12, 1).unwrap());
        assert_eq!(m.end(), NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert!(Month::parse("2024-13").is_none());
        assert!(Month::parse("june").is_none());
    }

    #[test]
    fn hours_outside_range_fail() {
        assert!(overtime_hours(&Decimal::new(15, 1)).is_ok());
        assert!(overtime_hours(&Decimal::from(16)).is_ok());
        assert!(overtime_hours(&Decimal::ZERO).is_err());
        assert!(overtime_hours(&Decimal::new(161, 1)).is_err());
    }
}
