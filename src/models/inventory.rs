// src/models/inventory.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

pub const MAX_POSITIONS_PER_CARD: i32 = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "inventory_unit", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "lowercase")]
pub enum InventoryUnit {
    Kg,
    Pcs,
    M,
}

// --- Card: one sheet filled by a pair of counters ---
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventoryCard {
    pub id: Uuid,
    #[schema(ignore)]
    #[serde(skip)]
    pub tenant_id: Uuid,
    pub number: i32,
    pub creators: Vec<String>,
    pub warehouse: String,
    pub sector: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventoryCardSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub card: InventoryCard,
    pub position_count: i64,
    pub approved_count: i64,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventoryPosition {
    pub id: Uuid,
    #[schema(ignore)]
    #[serde(skip)]
    pub tenant_id: Uuid,
    pub card_id: Uuid,
    pub position: i32,
    /// `<card number>/<position>`
    #[schema(example = "14/3")]
    pub identifier: String,
    pub article_number: String,
    pub article_name: String,
    #[schema(value_type = f64)]
    pub quantity: Decimal,
    pub unit: InventoryUnit,
    pub wip: bool,
    pub approver: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub edited_at: Option<DateTime<Utc>>,
}

pub fn position_identifier(card_number: i32, position: i32) -> String {
    format!("{}/{}", card_number, position)
}

fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.message = Some("validation.negative".into());
        return Err(err);
    }
    Ok(())
}

/// The two people counting must be named and distinct.
fn validate_creators(creators: &[String]) -> Result<(), ValidationError> {
    let names: Vec<String> = creators.iter().map(|c| c.trim().to_lowercase()).collect();
    if names.len() == 2 && names.iter().all(|n| !n.is_empty()) && names[0] != names[1] {
        Ok(())
    } else {
        let mut err = ValidationError::new("creators");
        err.message = Some("validation.creators".into());
        Err(err)
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCardPayload {
    #[validate(custom(function = "validate_creators"))]
    pub creators: Vec<String>,
    #[validate(length(min = 1, max = 64, message = "validation.required"))]
    pub warehouse: String,
    pub sector: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PositionPayload {
    #[validate(length(min = 1, max = 32, message = "validation.required"))]
    pub article_number: String,
    #[validate(length(min = 1, max = 200, message = "validation.required"))]
    pub article_name: String,
    #[validate(custom(function = "validate_not_negative"))]
    #[schema(value_type = f64)]
    pub quantity: Decimal,
    pub unit: InventoryUnit,
    #[serde(default)]
    pub wip: bool,
}

/// Flat row of the positions export.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct InventoryExportRow {
    pub card_number: i32,
    pub warehouse: String,
    pub sector: Option<String>,
    pub identifier: String,
    pub article_number: String,
    pub article_name: String,
    pub quantity: Decimal,
    pub unit: InventoryUnit,
    pub wip: bool,
    pub approver: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creators_must_be_two_distinct_people() {
        assert!(validate_creators(&["anna".into(), "piotr".into()]).is_ok());
        assert!(validate_creators(&["anna".into(), "Anna ".into()]).is_err());
        assert!(validate_creators(&["anna".into()]).is_err());
        assert!(validate_creators(&["anna".into(), " ".into()]).is_err());
    }

    #[test]
    fn negative_quantity_is_refused() {
        let payload = PositionPayload {
            article_number: "28042".into(),
            article_name: "Bracket".into(),
            quantity: Decimal::new(-5, 1),
            unit: InventoryUnit::Kg,
            wip: false,
        };
        assert!(payload.validate().is_err());
    }

    #[test]
    fn identifier_joins_card_and_position() {
        assert_eq!(position_identifier(14, 3), "14/3");
    }
}
