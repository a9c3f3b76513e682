// src/services/news_service.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::NewsRepository,
    models::news::{News, NewsPayload},
};

#[derive(Clone)]
pub struct NewsService {
    news_repo: NewsRepository,
}

impl NewsService {
    pub fn new(news_repo: NewsRepository) -> Self {
        Self { news_repo }
    }

    pub async fn create<'e, E>(&self, executor: E, tenant_id: Uuid, author: &str, payload: &NewsPayload) -> Result<News, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let news = self.news_repo.create(executor, tenant_id, author, payload).await?;
        tracing::info!("news {} posted by {}", news.id, author);
        Ok(news)
    }

    pub async fn update<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid, payload: &NewsPayload) -> Result<News, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.news_repo
            .update(executor, tenant_id, id, payload)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("news".into()))
    }

    pub async fn toggle_pin<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<News, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let news = self
            .news_repo
            .toggle_pin(executor, tenant_id, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("news".into()))?;
        tracing::info!("news {} pinned: {}", news.id, news.is_pinned);
        Ok(news)
    }

    pub async fn delete<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if !self.news_repo.delete(executor, tenant_id, id).await? {
            return Err(AppError::ResourceNotFound("news".into()));
        }
        tracing::info!("news {} deleted", id);
        Ok(())
    }

    pub async fn list<'e, E>(&self, executor: E, tenant_id: Uuid) -> Result<Vec<News>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.news_repo.list(executor, tenant_id).await
    }

    pub async fn get<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<News, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.news_repo
            .find_by_id(executor, tenant_id, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("news".into()))
    }
}
