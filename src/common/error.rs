// src/common/error.rs

use std::collections::HashMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::{common::i18n::I18nStore, middleware::i18n::Locale, models::scans::ScanRejection};

// ---
// Business rule violations shared by the office workflows
// ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RuleViolation {
    #[error("only the owner may do this")]
    NotOwner,
    #[error("status does not allow this transition")]
    InvalidTransition,
    #[error("a reason is required")]
    ReasonRequired,
    #[error("inventory card is full")]
    CardFull,
    #[error("position is already approved")]
    AlreadyApproved,
    #[error("daily hours exceeded")]
    DailyHoursExceeded,
    #[error("users cannot delete themselves")]
    SelfDeletion,
    #[error("operation not supported for this credential source")]
    WrongCredentialSource,
}

impl RuleViolation {
    pub fn code(&self) -> &'static str {
        match self {
            RuleViolation::NotOwner => "rule.not_owner",
            RuleViolation::InvalidTransition => "rule.invalid_transition",
            RuleViolation::ReasonRequired => "rule.reason_required",
            RuleViolation::CardFull => "rule.card_full",
            RuleViolation::AlreadyApproved => "rule.already_approved",
            RuleViolation::DailyHoursExceeded => "rule.daily_hours_exceeded",
            RuleViolation::SelfDeletion => "rule.self_deletion",
            RuleViolation::WrongCredentialSource => "rule.wrong_credential_source",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            RuleViolation::NotOwner => StatusCode::FORBIDDEN,
            RuleViolation::InvalidTransition | RuleViolation::AlreadyApproved => StatusCode::CONFLICT,
            _ => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation error")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("e-mail already exists")]
    EmailAlreadyExists,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("invalid token")]
    InvalidToken,

    #[error("user not found")]
    UserNotFound,

    #[error("missing role: {0}")]
    Forbidden(String),

    #[error("tenant header missing")]
    TenantMissing,

    #[error("tenant header invalid")]
    TenantInvalid,

    #[error("no access to tenant")]
    TenantAccessDenied,

    #[error("not found: {0}")]
    ResourceNotFound(String),

    #[error("conflict: {0}")]
    UniqueConstraintViolation(String),

    #[error("scan rejected: {0}")]
    ScanRejected(#[from] ScanRejection),

    #[error("rule violated: {0}")]
    RuleViolated(#[from] RuleViolation),

    #[error("font not found: {0}")]
    FontNotFound(String),

    #[error("database error")]
    DatabaseError(#[from] sqlx::Error),

    #[error("internal server error")]
    InternalServerError(#[from] anyhow::Error),

    #[error("bcrypt error: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("jwt error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("ldap error: {0}")]
    LdapError(#[from] ldap3::LdapError),
}

/// Error body sent to the client, already localized.
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub code: String,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: impl Into<String>, error: impl Into<String>) -> Self {
        Self { status, code: code.into(), error: error.into(), details: None }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, Json(self)).into_response()
    }
}

impl AppError {
    /// Stable code the clients switch on; also the dictionary key.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "validation.failed",
            AppError::EmailAlreadyExists => "auth.email_exists",
            AppError::InvalidCredentials => "auth.invalid_credentials",
            AppError::InvalidToken => "auth.invalid_token",
            AppError::UserNotFound => "auth.user_not_found",
            AppError::Forbidden(_) => "auth.forbidden",
            AppError::TenantMissing => "tenant.missing",
            AppError::TenantInvalid => "tenant.invalid",
            AppError::TenantAccessDenied => "tenant.denied",
            AppError::ResourceNotFound(_) => "resource.not_found",
            AppError::UniqueConstraintViolation(_) => "resource.conflict",
            AppError::ScanRejected(rejection) => rejection.code(),
            AppError::RuleViolated(violation) => violation.code(),
            _ => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::EmailAlreadyExists | AppError::UniqueConstraintViolation(_) => StatusCode::CONFLICT,
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::UserNotFound | AppError::ResourceNotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) | AppError::TenantAccessDenied => StatusCode::FORBIDDEN,
            AppError::TenantMissing | AppError::TenantInvalid => StatusCode::BAD_REQUEST,
            AppError::ScanRejected(ScanRejection::Exists) => StatusCode::CONFLICT,
            AppError::ScanRejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::RuleViolated(violation) => violation.status(),
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Translates the error into the client language.
    pub fn to_api_error(self, locale: &Locale, store: &I18nStore) -> ApiError {
        let lang = locale.0.as_str();
        let status = self.status();
        let code = self.code();

        match self {
            AppError::ValidationError(errors) => {
                let mut details: HashMap<String, Vec<String>> = HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages = field_errors
                        .iter()
                        .map(|e| {
                            let key = e.message.as_deref().unwrap_or(e.code.as_ref());
                            store.translate(lang, key)
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                ApiError {
                    status,
                    code: code.to_string(),
                    error: store.translate(lang, code),
                    details: Some(json!(details)),
                }
            }
            AppError::Forbidden(role) => {
                ApiError::new(status, code, store.translate_with(lang, code, &[("role", &role)]))
            }
            AppError::ResourceNotFound(resource) => {
                ApiError::new(status, code, store.translate_with(lang, code, &[("resource", &resource)]))
            }
            AppError::UniqueConstraintViolation(detail) => {
                ApiError::new(status, code, store.translate_with(lang, code, &[("detail", &detail)]))
            }
            ref e if status == StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!("internal server error: {:?}", e);
                ApiError::new(status, code, store.translate(lang, code))
            }
            _ => ApiError::new(status, code, store.translate(lang, code)),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Without a request locale the English dictionary is used.
        self.to_api_error(&Locale::default(), I18nStore::shared()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::{ValidationError, ValidationErrors};

    fn pl() -> Locale {
        Locale("pl".to_string())
    }

    #[test]
    fn scan_exists_maps_to_conflict_with_tag() {
        let api = AppError::from(ScanRejection::Exists).to_api_error(&pl(), I18nStore::shared());
        assert_eq!(api.status, StatusCode::CONFLICT);
        assert_eq!(api.code, "scan.exists");
        assert_ne!(api.error, "scan.exists");
    }

    #[test]
    fn other_scan_rejections_are_unprocessable() {
        let api = AppError::from(ScanRejection::WrongQuantity).to_api_error(&pl(), I18nStore::shared());
        assert_eq!(api.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(api.code, "scan.wrong_quantity");
    }

    #[test]
    fn internal_errors_are_masked() {
        let err = AppError::InternalServerError(anyhow::anyhow!("pool exhausted on host db-01"));
        let api = err.to_api_error(&Locale("en".into()), I18nStore::shared());
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!api.error.contains("db-01"));
        assert!(api.error.contains("IT"));
    }

    #[test]
    fn validation_details_are_translated_per_field() {
        let mut errors = ValidationErrors::new();
        let mut err = ValidationError::new("length");
        err.message = Some("validation.required".into());
        errors.add("title", err);

        let api = AppError::ValidationError(errors).to_api_error(&Locale("en".into()), I18nStore::shared());
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        let details = api.details.expect("details");
        assert_eq!(details["title"][0], "This field is required.");
    }

    #[test]
    fn forbidden_names_the_missing_role() {
        let api = AppError::Forbidden("news-editor".into()).to_api_error(&Locale("en".into()), I18nStore::shared());
        assert_eq!(api.status, StatusCode::FORBIDDEN);
        assert!(api.error.contains("news-editor"));
    }

    #[test]
    fn owner_violation_is_forbidden() {
        let api = AppError::from(RuleViolation::NotOwner).to_api_error(&pl(), I18nStore::shared());
        assert_eq!(api.status, StatusCode::FORBIDDEN);
        assert_eq!(api.code, "rule.not_owner");
    }
}
