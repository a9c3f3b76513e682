// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::auth::{roles, Claims, CredentialSource, User},
    services::ldap::LdapAuthenticator,
};

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    ldap: LdapAuthenticator,
    jwt_secret: String,
    ttl_hours: i64,
}

/// bcrypt is CPU bound, keep it off the async workers.
pub(crate) async fn hash_password(password: &str) -> Result<String, AppError> {
    let password = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("hashing task failed: {}", e))??;
    Ok(hashed)
}

impl AuthService {
    pub fn new(user_repo: UserRepository, ldap: LdapAuthenticator, jwt_secret: String, ttl_hours: i64) -> Self {
        Self { user_repo, ldap, jwt_secret, ttl_hours }
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<String, AppError> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let is_valid = match user.credential_source {
            CredentialSource::Manual => {
                let Some(password_hash) = user.password_hash.clone() else {
                    return Err(AppError::InvalidCredentials);
                };
                let password = password.to_owned();
                tokio::task::spawn_blocking(move || verify(&password, &password_hash))
                    .await
                    .map_err(|e| anyhow::anyhow!("password verification task failed: {}", e))??
            }
            CredentialSource::Ldap => self.ldap.verify(&user.email, password).await?,
        };

        if !is_valid {
            tracing::warn!("failed login for {}", user.email);
            return Err(AppError::InvalidCredentials);
        }

        tracing::info!("user {} logged in", user.email);
        self.create_token(&user)
    }

    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let claims = self.decode_token(token)?;

        self.user_repo
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)
    }

    /// Creates the configured admin on first start.
    pub async fn bootstrap_admin(&self, email: &str, password: &str) -> Result<(), AppError> {
        if self.user_repo.find_by_email(email).await?.is_some() {
            return Ok(());
        }

        let password_hash = hash_password(password).await?;
        let user = self
            .user_repo
            .create_user(
                self.user_repo.pool(),
                email,
                &[roles::ADMIN.to_string()],
                CredentialSource::Manual,
                Some(&password_hash),
            )
            .await?;

        tracing::info!("bootstrap admin {} created", user.email);
        Ok(())
    }

    fn decode_token(&self, token: &str) -> Result<Claims, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;
        Ok(token_data.claims)
    }

    fn create_token(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::hours(self.ttl_hours);

        let claims = Claims {
            sub: user.id,
            roles: user.roles.clone(),
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;
    use uuid::Uuid;

    fn service(secret: &str) -> AuthService {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/next_bruss_test")
            .unwrap();
        AuthService::new(UserRepository::new(pool), LdapAuthenticator::new(None), secret.into(), 8)
    }

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "qm@bruss.example".into(),
            roles: vec![roles::QUALITY_MANAGER.into()],
            credential_source: CredentialSource::Manual,
            password_hash: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn token_carries_subject_and_roles() {
        let svc = service("secret");
        let user = user();
        let token = svc.create_token(&user).unwrap();
        let claims = svc.decode_token(&token).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.roles, vec!["quality-manager".to_string()]);
        assert!(claims.exp > claims.iat);
    }

    #[tokio::test]
    async fn token_signed_with_other_secret_is_rejected() {
        let token = service("one").create_token(&user()).unwrap();
        assert!(matches!(service("two").decode_token(&token), Err(AppError::InvalidToken)));
    }

    #[tokio::test]
    async fn hashed_password_verifies() {
        let hashed = hash_password("correct horse").await.unwrap();
        assert!(verify("correct horse", &hashed).unwrap());
        assert!(!verify("wrong", &hashed).unwrap());
    }
}
