// src/db/article_repo.rs

use sqlx::{types::Json, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::{db_utils::map_unique_violation, error::AppError},
    models::articles::{ArticleConfig, ArticleConfigPayload},
};

#[derive(Clone, Default)]
pub struct ArticleRepository;

impl ArticleRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        input: &ArticleConfigPayload,
    ) -> Result<ArticleConfig, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, ArticleConfig>(
            r#"
            INSERT INTO article_configs (
                tenant_id, workplace, article_number, article_name, pieces_per_box,
                boxes_per_pallet, requires_dmc, base_dmc, dmc_checks, dmc_date_check, hydra_process
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(input.workplace.trim())
        .bind(input.article_number.trim())
        .bind(&input.article_name)
        .bind(input.pieces_per_box)
        .bind(input.boxes_per_pallet)
        .bind(input.requires_dmc)
        .bind(input.base_dmc.as_deref().map(str::trim))
        .bind(Json(&input.dmc_checks))
        .bind(input.dmc_date_check.as_ref().map(Json))
        .bind(input.hydra_process.as_deref())
        .fetch_one(executor)
        .await
        .map_err(|e| map_unique_violation(e, &format!("{} @ {}", input.article_number, input.workplace)))
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        input: &ArticleConfigPayload,
    ) -> Result<Option<ArticleConfig>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, ArticleConfig>(
            r#"
            UPDATE article_configs SET
                workplace = $3, article_number = $4, article_name = $5, pieces_per_box = $6,
                boxes_per_pallet = $7, requires_dmc = $8, base_dmc = $9, dmc_checks = $10,
                dmc_date_check = $11, hydra_process = $12, updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .bind(input.workplace.trim())
        .bind(input.article_number.trim())
        .bind(&input.article_name)
        .bind(input.pieces_per_box)
        .bind(input.boxes_per_pallet)
        .bind(input.requires_dmc)
        .bind(input.base_dmc.as_deref().map(str::trim))
        .bind(Json(&input.dmc_checks))
        .bind(input.dmc_date_check.as_ref().map(Json))
        .bind(input.hydra_process.as_deref())
        .fetch_optional(executor)
        .await
        .map_err(|e| map_unique_violation(e, &format!("{} @ {}", input.article_number, input.workplace)))
    }

    pub async fn list<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        workplace: Option<&str>,
    ) -> Result<Vec<ArticleConfig>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let configs = sqlx::query_as::<_, ArticleConfig>(
            r#"
            SELECT * FROM article_configs
            WHERE tenant_id = $1 AND ($2::text IS NULL OR workplace = $2)
            ORDER BY workplace, article_number
            "#,
        )
        .bind(tenant_id)
        .bind(workplace)
        .fetch_all(executor)
        .await?;
        Ok(configs)
    }

    pub async fn find_by_id<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<ArticleConfig>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let config = sqlx::query_as::<_, ArticleConfig>(
            "SELECT * FROM article_configs WHERE tenant_id = $1 AND id = $2",
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(config)
    }

    /// Configuration a scan terminal works against.
    pub async fn find_for_workplace<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        workplace: &str,
        article_number: &str,
    ) -> Result<Option<ArticleConfig>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let config = sqlx::query_as::<_, ArticleConfig>(
            r#"
            SELECT * FROM article_configs
            WHERE tenant_id = $1 AND workplace = $2 AND article_number = $3
            "#,
        )
        .bind(tenant_id)
        .bind(workplace.trim())
        .bind(article_number.trim())
        .fetch_optional(executor)
        .await?;
        Ok(config)
    }

    pub async fn delete<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM article_configs WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
