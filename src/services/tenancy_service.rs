// src/services/tenancy_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::TenantRepository,
    models::tenancy::{Tenant, TenantMember},
};

#[derive(Clone)]
pub struct TenantService {
    tenant_repo: TenantRepository,
    pool: PgPool,
}

impl TenantService {
    pub fn new(tenant_repo: TenantRepository, pool: PgPool) -> Self {
        Self { tenant_repo, pool }
    }

    pub async fn is_member(&self, user_id: Uuid, tenant_id: Uuid) -> Result<bool, AppError> {
        self.tenant_repo.check_user_tenancy(user_id, tenant_id).await
    }

    /// Creates a plant; the creating admin becomes its first member.
    pub async fn create_tenant(&self, name: &str, code: &str, creator_id: Uuid) -> Result<Tenant, AppError> {
        let mut tx = self.pool.begin().await?;

        let tenant = self.tenant_repo.create_tenant(&mut *tx, name, code).await?;
        self.tenant_repo.add_member(&mut *tx, creator_id, tenant.id).await?;

        tx.commit().await?;

        tracing::info!("tenant {} ({}) created", tenant.name, tenant.code);
        Ok(tenant)
    }

    pub async fn add_member(&self, tenant_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        if !self.tenant_repo.tenant_exists(&self.pool, tenant_id).await? {
            return Err(AppError::ResourceNotFound("tenant".into()));
        }
        self.tenant_repo.add_member(&self.pool, user_id, tenant_id).await.map_err(|e| match e {
            // FK violation: unknown user
            AppError::DatabaseError(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
                AppError::UserNotFound
            }
            other => other,
        })?;

        tracing::info!("user {} added to tenant {}", user_id, tenant_id);
        Ok(())
    }

    pub async fn remove_member(&self, tenant_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        if !self.tenant_repo.remove_member(&self.pool, user_id, tenant_id).await? {
            return Err(AppError::ResourceNotFound("membership".into()));
        }
        tracing::info!("user {} removed from tenant {}", user_id, tenant_id);
        Ok(())
    }

    pub async fn list_members(&self, tenant_id: Uuid) -> Result<Vec<TenantMember>, AppError> {
        self.tenant_repo.list_members(&self.pool, tenant_id).await
    }

    pub async fn list_user_tenants(&self, user_id: Uuid) -> Result<Vec<Tenant>, AppError> {
        self.tenant_repo.list_for_user(&self.pool, user_id).await
    }

    pub async fn list_all(&self) -> Result<Vec<Tenant>, AppError> {
        self.tenant_repo.list_all(&self.pool).await
    }
}
