// src/services/article_service.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::ArticleRepository,
    models::articles::{ArticleConfig, ArticleConfigPayload},
};

#[derive(Clone)]
pub struct ArticleService {
    article_repo: ArticleRepository,
}

impl ArticleService {
    pub fn new(article_repo: ArticleRepository) -> Self {
        Self { article_repo }
    }

    pub async fn create<'e, E>(&self, executor: E, tenant_id: Uuid, payload: &ArticleConfigPayload) -> Result<ArticleConfig, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let config = self.article_repo.create(executor, tenant_id, payload).await?;
        tracing::info!("article {} configured at {}", config.article_number, config.workplace);
        Ok(config)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        payload: &ArticleConfigPayload,
    ) -> Result<ArticleConfig, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let config = self
            .article_repo
            .update(executor, tenant_id, id, payload)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("article".into()))?;
        tracing::info!("article {} at {} updated", config.article_number, config.workplace);
        Ok(config)
    }

    pub async fn list<'e, E>(&self, executor: E, tenant_id: Uuid, workplace: Option<&str>) -> Result<Vec<ArticleConfig>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.article_repo.list(executor, tenant_id, workplace).await
    }

    pub async fn get<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<ArticleConfig, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.article_repo
            .find_by_id(executor, tenant_id, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("article".into()))
    }

    pub async fn delete<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if !self.article_repo.delete(executor, tenant_id, id).await? {
            return Err(AppError::ResourceNotFound("article".into()));
        }
        tracing::info!("article config {} deleted", id);
        Ok(())
    }
}
