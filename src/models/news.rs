// src/models/news.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct News {
    pub id: Uuid,
    #[schema(ignore)]
    #[serde(skip)]
    pub tenant_id: Uuid,
    pub title: String,
    pub content: String,
    pub is_pinned: bool,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub edited_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewsPayload {
    #[validate(length(min = 1, max = 200, message = "validation.required"))]
    pub title: String,
    #[validate(length(min = 1, max = 20000, message = "validation.required"))]
    pub content: String,
    #[serde(default)]
    pub is_pinned: bool,
}
