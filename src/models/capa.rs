// src/models/capa.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Capacity of one machine type for an article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MachineCapacity {
    #[validate(length(min = 1, max = 64, message = "validation.required"))]
    #[schema(example = "robot-weld")]
    pub machine_type: String,
    #[validate(range(exclusive_min = 0.0, message = "validation.positive"))]
    pub cycle_time_seconds: f64,
    #[validate(range(min = 1, message = "validation.positive"))]
    pub cavities: i32,
    pub max_pieces_per_hour: Option<i32>,
}

impl MachineCapacity {
    /// Theoretical output when no explicit maximum is configured.
    pub fn pieces_per_hour(&self) -> i32 {
        self.max_pieces_per_hour.unwrap_or_else(|| {
            if self.cycle_time_seconds > 0.0 {
                (3600.0 / self.cycle_time_seconds * f64::from(self.cavities)).floor() as i32
            } else {
                0
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EditStamp {
    pub email: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Capa {
    pub id: Uuid,
    #[schema(ignore)]
    #[serde(skip)]
    pub tenant_id: Uuid,
    pub article_number: String,
    pub client: String,
    pub line: String,
    pub client_part: Option<String>,
    pub piff: Option<String>,
    #[schema(value_type = Vec<MachineCapacity>)]
    pub machines: Json<Vec<MachineCapacity>>,
    #[schema(value_type = EditStamp)]
    pub edited: Json<EditStamp>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CapaPayload {
    #[validate(length(min = 1, max = 32, message = "validation.required"))]
    pub article_number: String,
    #[validate(length(min = 1, max = 120, message = "validation.required"))]
    pub client: String,
    #[validate(length(min = 1, max = 64, message = "validation.required"))]
    pub line: String,
    pub client_part: Option<String>,
    pub piff: Option<String>,
    #[validate(nested)]
    #[serde(default)]
    pub machines: Vec<MachineCapacity>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct CapaFilter {
    pub client: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_derives_from_cycle_time() {
        let m = MachineCapacity {
            machine_type: "press".into(),
            cycle_time_seconds: 12.0,
            cavities: 2,
            max_pieces_per_hour: None,
        };
        assert_eq!(m.pieces_per_hour(), 600);
    }

    #[test]
    fn explicit_maximum_wins() {
        let m = MachineCapacity {
            machine_type: "press".into(),
            cycle_time_seconds: 12.0,
            cavities: 2,
            max_pieces_per_hour: Some(450),
        };
        assert_eq!(m.pieces_per_hour(), 450);
    }

    #[test]
    fn nested_machine_errors_fail_payload() {
        let payload = CapaPayload {
            article_number: "28042".into(),
            client: "OEM".into(),
            line: "L1".into(),
            client_part: None,
            piff: None,
            machines: vec![MachineCapacity {
                machine_type: "".into(),
                cycle_time_seconds: 0.0,
                cavities: 0,
                max_pieces_per_hour: None,
            }],
        };
        assert!(payload.validate().is_err());
    }
}
