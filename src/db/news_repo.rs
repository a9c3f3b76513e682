// src/db/news_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::news::{News, NewsPayload},
};

#[derive(Clone, Default)]
pub struct NewsRepository;

impl NewsRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn create<'e, E>(&self, executor: E, tenant_id: Uuid, author: &str, input: &NewsPayload) -> Result<News, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let news = sqlx::query_as::<_, News>(
            r#"
            INSERT INTO news (tenant_id, title, content, is_pinned, author)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(input.title.trim())
        .bind(&input.content)
        .bind(input.is_pinned)
        .bind(author)
        .fetch_one(executor)
        .await?;
        Ok(news)
    }

    /// Title and content only; the pin has its own toggle.
    pub async fn update<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        input: &NewsPayload,
    ) -> Result<Option<News>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let news = sqlx::query_as::<_, News>(
            r#"
            UPDATE news SET title = $3, content = $4, edited_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .bind(input.title.trim())
        .bind(&input.content)
        .fetch_optional(executor)
        .await?;
        Ok(news)
    }

    pub async fn toggle_pin<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<Option<News>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let news = sqlx::query_as::<_, News>(
            "UPDATE news SET is_pinned = NOT is_pinned WHERE tenant_id = $1 AND id = $2 RETURNING *",
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(news)
    }

    pub async fn list<'e, E>(&self, executor: E, tenant_id: Uuid) -> Result<Vec<News>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let news = sqlx::query_as::<_, News>(
            "SELECT * FROM news WHERE tenant_id = $1 ORDER BY is_pinned DESC, created_at DESC",
        )
        .bind(tenant_id)
        .fetch_all(executor)
        .await?;
        Ok(news)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<Option<News>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let news = sqlx::query_as::<_, News>("SELECT * FROM news WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(news)
    }

    pub async fn delete<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM news WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
