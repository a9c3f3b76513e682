// src/services/user_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::{AppError, RuleViolation},
    db::UserRepository,
    models::auth::{CreateUserPayload, CredentialSource, User},
    services::auth::hash_password,
};

/// Admin maintenance of accounts. Users are global, not tenant scoped.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    pool: PgPool,
}

impl UserService {
    pub fn new(user_repo: UserRepository, pool: PgPool) -> Self {
        Self { user_repo, pool }
    }

    pub async fn create_user(&self, payload: &CreateUserPayload) -> Result<User, AppError> {
        let password_hash = match (payload.credential_source, payload.password.as_deref()) {
            (CredentialSource::Manual, Some(password)) => Some(hash_password(password).await?),
            _ => None,
        };

        let user = self
            .user_repo
            .create_user(
                &self.pool,
                &payload.email,
                &payload.roles,
                payload.credential_source,
                password_hash.as_deref(),
            )
            .await?;

        tracing::info!("user {} created with roles {:?}", user.email, user.roles);
        Ok(user)
    }

    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        self.user_repo.list(&self.pool).await
    }

    pub async fn get_user(&self, id: Uuid) -> Result<User, AppError> {
        self.user_repo.find_by_id(id).await?.ok_or(AppError::UserNotFound)
    }

    pub async fn update_roles(&self, id: Uuid, roles: &[String]) -> Result<User, AppError> {
        let user = self
            .user_repo
            .update_roles(&self.pool, id, roles)
            .await?
            .ok_or(AppError::UserNotFound)?;

        tracing::info!("roles of {} set to {:?}", user.email, user.roles);
        Ok(user)
    }

    /// Only manual accounts keep a password here; directory accounts are refused.
    pub async fn reset_password(&self, id: Uuid, password: &str) -> Result<(), AppError> {
        let user = self.get_user(id).await?;
        if user.credential_source != CredentialSource::Manual {
            return Err(RuleViolation::WrongCredentialSource.into());
        }

        let password_hash = hash_password(password).await?;
        self.user_repo.update_password(&self.pool, id, &password_hash).await?;

        tracing::info!("password of {} reset", user.email);
        Ok(())
    }

    pub async fn delete_user(&self, acting: &User, id: Uuid) -> Result<(), AppError> {
        if acting.id == id {
            return Err(RuleViolation::SelfDeletion.into());
        }
        if !self.user_repo.delete(&self.pool, id).await? {
            return Err(AppError::UserNotFound);
        }

        tracing::info!("user {} deleted by {}", id, acting.email);
        Ok(())
    }
}
