// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

pub mod roles {
    pub const ADMIN: &str = "admin";
    pub const OPERATOR: &str = "operator";
    pub const GROUP_LEADER: &str = "group-leader";
    pub const QUALITY_MANAGER: &str = "quality-manager";
    pub const PRODUCTION_MANAGER: &str = "production-manager";
    pub const PLANT_MANAGER: &str = "plant-manager";
    pub const QUALITY: &str = "quality";
    pub const REWORK: &str = "rework";
    pub const INVENTORY: &str = "inventory";
    pub const INVENTORY_APPROVER: &str = "inventory-approver";
    pub const NEWS_EDITOR: &str = "news-editor";
    pub const CAPA_EDITOR: &str = "capa-editor";
    pub const HR: &str = "hr";

    pub const ALL: &[&str] = &[
        ADMIN,
        OPERATOR,
        GROUP_LEADER,
        QUALITY_MANAGER,
        PRODUCTION_MANAGER,
        PLANT_MANAGER,
        QUALITY,
        REWORK,
        INVENTORY,
        INVENTORY_APPROVER,
        NEWS_EDITOR,
        CAPA_EDITOR,
        HR,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "credential_source", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "lowercase")]
pub enum CredentialSource {
    Manual,
    Ldap,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    #[schema(example = "jan.kowalski@bruss.example")]
    pub email: String,
    #[schema(example = json!(["operator", "group-leader"]))]
    pub roles: Vec<String>,
    pub credential_source: CredentialSource,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|r| r == roles::ADMIN)
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.is_admin() || self.roles.iter().any(|r| r == role)
    }

    pub fn has_any_role(&self, wanted: &[&str]) -> bool {
        self.is_admin() || self.roles.iter().any(|r| wanted.contains(&r.as_str()))
    }
}

pub(crate) fn validate_roles(values: &[String]) -> Result<(), ValidationError> {
    if values.iter().all(|r| roles::ALL.contains(&r.as_str())) {
        Ok(())
    } else {
        let mut err = ValidationError::new("roles");
        err.message = Some("validation.unknown_role".into());
        Err(err)
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginUserPayload {
    #[validate(email(message = "validation.email"))]
    #[schema(example = "jan.kowalski@bruss.example")]
    pub email: String,
    #[validate(length(min = 1, message = "validation.required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserPayload {
    #[validate(email(message = "validation.email"))]
    pub email: String,
    #[validate(custom(function = "validate_roles"))]
    #[serde(default)]
    pub roles: Vec<String>,
    pub credential_source: CredentialSource,
    pub password: Option<String>,
}

impl CreateUserPayload {
    /// Manual accounts need a password, directory accounts must not carry one.
    pub fn validate_password_rule(&self) -> Result<(), ValidationError> {
        match (self.credential_source, &self.password) {
            (CredentialSource::Manual, Some(pw)) if pw.chars().count() >= 8 => Ok(()),
            (CredentialSource::Manual, _) => {
                let mut err = ValidationError::new("length");
                err.message = Some("validation.password_length".into());
                Err(err)
            }
            (CredentialSource::Ldap, None) => Ok(()),
            (CredentialSource::Ldap, Some(_)) => {
                let mut err = ValidationError::new("forbidden");
                err.message = Some("validation.password_forbidden".into());
                Err(err)
            }
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateRolesPayload {
    #[validate(custom(function = "validate_roles"))]
    pub roles: Vec<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ResetPasswordPayload {
    #[validate(length(min = 8, message = "validation.password_length"))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub roles: Vec<String>,
    pub exp: usize,
    pub iat: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(roles: &[&str]) -> User {
        User {
            id: Uuid::new_v4(),
            email: "a@b.c".into(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
            credential_source: CredentialSource::Manual,
            password_hash: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn admin_passes_every_gate() {
        let admin = user(&[roles::ADMIN]);
        assert!(admin.has_role(roles::HR));
        assert!(admin.has_any_role(&[roles::NEWS_EDITOR]));
    }

    #[test]
    fn plain_user_needs_the_role() {
        let op = user(&[roles::OPERATOR]);
        assert!(op.has_role(roles::OPERATOR));
        assert!(!op.has_role(roles::HR));
        assert!(op.has_any_role(&[roles::HR, roles::OPERATOR]));
    }

    #[test]
    fn unknown_roles_fail_validation() {
        assert!(validate_roles(&["operator".into()]).is_ok());
        assert!(validate_roles(&["superuser".into()]).is_err());
    }

    #[test]
    fn password_rule_depends_on_source() {
        let mut payload = CreateUserPayload {
            email: "a@b.c".into(),
            roles: vec![],
            credential_source: CredentialSource::Manual,
            password: Some("short".into()),
        };
        assert!(payload.validate_password_rule().is_err());
        payload.password = Some("long enough".into());
        assert!(payload.validate_password_rule().is_ok());

        payload.credential_source = CredentialSource::Ldap;
        assert!(payload.validate_password_rule().is_err());
        payload.password = None;
        assert!(payload.validate_password_rule().is_ok());
    }
}
