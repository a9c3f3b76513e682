// src/models/deviations.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::models::auth::roles;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "deviation_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "lowercase")]
pub enum DeviationStatus {
    Draft,
    Approval,
    Approved,
    Rejected,
    Closed,
    Valid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "deviation_area", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "lowercase")]
pub enum DeviationArea {
    Coating,
    Production,
    Assembly,
}

/// The four sign-off slots of a deviation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ApprovalRole {
    GroupLeader,
    QualityManager,
    ProductionManager,
    PlantManager,
}

impl ApprovalRole {
    /// Role a user must hold to sign this slot.
    pub fn required_role(&self) -> &'static str {
        match self {
            ApprovalRole::GroupLeader => roles::GROUP_LEADER,
            ApprovalRole::QualityManager => roles::QUALITY_MANAGER,
            ApprovalRole::ProductionManager => roles::PRODUCTION_MANAGER,
            ApprovalRole::PlantManager => roles::PLANT_MANAGER,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Approval {
    pub approved: bool,
    pub by: String,
    pub at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Approvals {
    pub group_leader: Option<Approval>,
    pub quality_manager: Option<Approval>,
    pub production_manager: Option<Approval>,
    pub plant_manager: Option<Approval>,
}

impl Approvals {
    pub fn slot_mut(&mut self, role: ApprovalRole) -> &mut Option<Approval> {
        match role {
            ApprovalRole::GroupLeader => &mut self.group_leader,
            ApprovalRole::QualityManager => &mut self.quality_manager,
            ApprovalRole::ProductionManager => &mut self.production_manager,
            ApprovalRole::PlantManager => &mut self.plant_manager,
        }
    }

    fn all(&self) -> [&Option<Approval>; 4] {
        [&self.group_leader, &self.quality_manager, &self.production_manager, &self.plant_manager]
    }

    pub fn any_rejected(&self) -> bool {
        self.all().iter().any(|a| matches!(a, Some(a) if !a.approved))
    }

    /// Plant manager sign-off is optional.
    pub fn required_approved(&self) -> bool {
        [&self.group_leader, &self.quality_manager, &self.production_manager]
            .iter()
            .all(|a| matches!(a, Some(a) if a.approved))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
    Open,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CorrectiveAction {
    pub id: Uuid,
    pub description: String,
    pub responsible: String,
    pub deadline: NaiveDate,
    pub status: ActionStatus,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Deviation {
    pub id: Uuid,
    #[schema(ignore)]
    #[serde(skip)]
    pub tenant_id: Uuid,
    #[schema(example = "DEV-2024-17")]
    pub internal_id: String,
    pub status: DeviationStatus,
    pub article_number: String,
    pub article_name: String,
    pub workplace: Option<String>,
    pub drawing_number: Option<String>,
    pub quantity: Option<i32>,
    pub charge: Option<String>,
    pub description: String,
    pub reason: String,
    pub customer_number: Option<String>,
    pub customer_authorization: bool,
    pub area: DeviationArea,
    pub period_from: NaiveDate,
    pub period_to: NaiveDate,
    pub owner: String,
    #[schema(value_type = Approvals)]
    pub approvals: Json<Approvals>,
    #[schema(value_type = Vec<CorrectiveAction>)]
    pub corrective_actions: Json<Vec<CorrectiveAction>>,
    pub created_at: DateTime<Utc>,
    pub edited_at: Option<DateTime<Utc>>,
}

/// Status shown to readers: an approved deviation is `valid` inside its
/// period and `closed` once the period has passed.
pub fn effective_status(
    stored: DeviationStatus,
    period_from: NaiveDate,
    period_to: NaiveDate,
    today: NaiveDate,
) -> DeviationStatus {
    match stored {
        DeviationStatus::Approved | DeviationStatus::Valid if today > period_to => DeviationStatus::Closed,
        DeviationStatus::Approved if today >= period_from => DeviationStatus::Valid,
        other => other,
    }
}

impl Deviation {
    pub fn with_effective_status(mut self, today: NaiveDate) -> Self {
        self.status = effective_status(self.status, self.period_from, self.period_to, today);
        self
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeviationPayload {
    #[validate(length(min = 1, max = 32, message = "validation.required"))]
    pub article_number: String,
    #[validate(length(min = 1, max = 200, message = "validation.required"))]
    pub article_name: String,
    pub workplace: Option<String>,
    pub drawing_number: Option<String>,
    #[validate(range(min = 1, message = "validation.positive"))]
    pub quantity: Option<i32>,
    pub charge: Option<String>,
    #[validate(length(min = 10, max = 2000, message = "validation.description_length"))]
    pub description: String,
    #[validate(length(min = 1, max = 500, message = "validation.required"))]
    pub reason: String,
    pub customer_number: Option<String>,
    #[serde(default)]
    pub customer_authorization: bool,
    pub area: DeviationArea,
    pub period_from: NaiveDate,
    pub period_to: NaiveDate,
    /// Save without sending to approval.
    #[serde(default)]
    pub draft: bool,
}

impl DeviationPayload {
    pub fn validate_all(&self) -> Result<(), ValidationErrors> {
        let mut errors = match self.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(e) => e,
        };
        if self.period_to < self.period_from {
            let mut err = ValidationError::new("period");
            err.message = Some("validation.period".into());
            errors.add("periodTo", err);
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApprovePayload {
    pub role: ApprovalRole,
    pub approved: bool,
    #[validate(length(max = 500, message = "validation.too_long"))]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CorrectiveActionPayload {
    #[validate(length(min = 1, max = 1000, message = "validation.required"))]
    pub description: String,
    #[validate(length(min = 1, max = 200, message = "validation.required"))]
    pub responsible: String,
    pub deadline: NaiveDate,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeviationFilter {
    pub status: Option<DeviationStatus>,
    pub area: Option<DeviationArea>,
    pub owner: Option<String>,
    pub article_number: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn approved_deviation_is_valid_inside_period() {
        let s = effective_status(DeviationStatus::Approved, d(2024, 6, 1), d(2024, 6, 30), d(2024, 6, 15));
        assert_eq!(s, DeviationStatus::Valid);
    }

    #[test]
    fn approved_deviation_before_period_stays_approved() {
        let s = effective_status(DeviationStatus::Approved, d(2024, 6, 1), d(2024, 6, 30), d(2024, 5, 20));
        assert_eq!(s, DeviationStatus::Approved);
    }

    #[test]
    fn approved_deviation_after_period_is_closed() {
        let s = effective_status(DeviationStatus::Approved, d(2024, 6, 1), d(2024, 6, 30), d(2024, 7, 1));
        assert_eq!(s, DeviationStatus::Closed);
    }

    #[test]
    fn other_statuses_are_untouched() {
        let s = effective_status(DeviationStatus::Rejected, d(2024, 6, 1), d(2024, 6, 30), d(2024, 7, 1));
        assert_eq!(s, DeviationStatus::Rejected);
        let s = effective_status(DeviationStatus::Draft, d(2024, 6, 1), d(2024, 6, 30), d(2024, 6, 10));
        assert_eq!(s, DeviationStatus::Draft);
    }

    #[test]
    fn approval_role_serializes_like_role_names() {
        let role: ApprovalRole = serde_json::from_str("\"quality-manager\"").unwrap();
        assert_eq!(role, ApprovalRole::QualityManager);
        assert_eq!(role.required_role(), roles::QUALITY_MANAGER);
    }

    #[test]
    fn reversed_period_fails_validation() {
        let payload = DeviationPayload {
            article_number: "28042".into(),
            article_name: "Bracket".into(),
            workplace: None,
            drawing_number: None,
            quantity: Some(100),
            charge: None,
            description: "Coating thickness below drawing limit".into(),
            reason: "Supplier issue".into(),
            customer_number: None,
            customer_authorization: false,
            area: DeviationArea::Coating,
            period_from: d(2024, 6, 30),
            period_to: d(2024, 6, 1),
            draft: false,
        };
        let errors = payload.validate_all().unwrap_err();
        assert!(errors.field_errors().contains_key("periodTo"));
    }
}
