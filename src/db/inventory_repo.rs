// src/db/inventory_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::inventory::{
        InventoryCard, InventoryCardSummary, InventoryExportRow, InventoryPosition, PositionPayload,
    },
};

#[derive(Clone, Default)]
pub struct InventoryRepository;

impl InventoryRepository {
    pub fn new() -> Self {
        Self
    }

    // ---
    // Cards
    // ---

    pub async fn create_card<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        number: i32,
        creators: &[String],
        warehouse: &str,
        sector: Option<&str>,
    ) -> Result<InventoryCard, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let card = sqlx::query_as::<_, InventoryCard>(
            r#"
            INSERT INTO inventory_cards (tenant_id, number, creators, warehouse, sector)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(number)
        .bind(creators)
        .bind(warehouse)
        .bind(sector)
        .fetch_one(executor)
        .await?;
        Ok(card)
    }

    pub async fn list_cards<'e, E>(&self, executor: E, tenant_id: Uuid) -> Result<Vec<InventoryCardSummary>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let cards = sqlx::query_as::<_, InventoryCardSummary>(
            r#"
            SELECT c.*,
                   COUNT(p.id) AS position_count,
                   COUNT(p.approved_at) AS approved_count
            FROM inventory_cards c
            LEFT JOIN inventory_positions p ON p.card_id = c.id
            WHERE c.tenant_id = $1
            GROUP BY c.id
            ORDER BY c.number DESC
            "#,
        )
        .bind(tenant_id)
        .fetch_all(executor)
        .await?;
        Ok(cards)
    }

    /// Row lock serializes position numbering on one card.
    pub async fn find_card_for_update<'e, E>(&self, executor: E, tenant_id: Uuid, card_id: Uuid) -> Result<Option<InventoryCard>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let card = sqlx::query_as::<_, InventoryCard>(
            "SELECT * FROM inventory_cards WHERE tenant_id = $1 AND id = $2 FOR UPDATE",
        )
        .bind(tenant_id)
        .bind(card_id)
        .fetch_optional(executor)
        .await?;
        Ok(card)
    }

    pub async fn card_exists<'e, E>(&self, executor: E, tenant_id: Uuid, card_id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM inventory_cards WHERE tenant_id = $1 AND id = $2)",
        )
        .bind(tenant_id)
        .bind(card_id)
        .fetch_one(executor)
        .await?;
        Ok(exists)
    }

    // ---
    // Positions
    // ---

    pub async fn max_position<'e, E>(&self, executor: E, card_id: Uuid) -> Result<i32, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let max: Option<i32> = sqlx::query_scalar("SELECT MAX(position) FROM inventory_positions WHERE card_id = $1")
            .bind(card_id)
            .fetch_one(executor)
            .await?;
        Ok(max.unwrap_or(0))
    }

    pub async fn insert_position<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        card: &InventoryCard,
        position: i32,
        identifier: &str,
        input: &PositionPayload,
    ) -> Result<InventoryPosition, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, InventoryPosition>(
            r#"
            INSERT INTO inventory_positions (
                tenant_id, card_id, position, identifier,
                article_number, article_name, quantity, unit, wip
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(card.id)
        .bind(position)
        .bind(identifier)
        .bind(input.article_number.trim())
        .bind(input.article_name.trim())
        .bind(input.quantity)
        .bind(input.unit)
        .bind(input.wip)
        .fetch_one(executor)
        .await?;
        Ok(row)
    }

    pub async fn find_position_for_update<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<InventoryPosition>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, InventoryPosition>(
            "SELECT * FROM inventory_positions WHERE tenant_id = $1 AND id = $2 FOR UPDATE",
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(row)
    }

    pub async fn update_position<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        input: &PositionPayload,
    ) -> Result<InventoryPosition, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, InventoryPosition>(
            r#"
            UPDATE inventory_positions SET
                article_number = $3, article_name = $4, quantity = $5, unit = $6, wip = $7,
                edited_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .bind(input.article_number.trim())
        .bind(input.article_name.trim())
        .bind(input.quantity)
        .bind(input.unit)
        .bind(input.wip)
        .fetch_one(executor)
        .await?;
        Ok(row)
    }

    pub async fn approve_position<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        approver: &str,
    ) -> Result<InventoryPosition, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, InventoryPosition>(
            r#"
            UPDATE inventory_positions SET approver = $3, approved_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .bind(approver)
        .fetch_one(executor)
        .await?;
        Ok(row)
    }

    pub async fn list_positions<'e, E>(&self, executor: E, tenant_id: Uuid, card_id: Uuid) -> Result<Vec<InventoryPosition>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, InventoryPosition>(
            "SELECT * FROM inventory_positions WHERE tenant_id = $1 AND card_id = $2 ORDER BY position",
        )
        .bind(tenant_id)
        .bind(card_id)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    pub async fn export_rows<'e, E>(&self, executor: E, tenant_id: Uuid) -> Result<Vec<InventoryExportRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, InventoryExportRow>(
            r#"
            SELECT c.number AS card_number, c.warehouse, c.sector,
                   p.identifier, p.article_number, p.article_name,
                   p.quantity, p.unit, p.wip, p.approver
            FROM inventory_positions p
            JOIN inventory_cards c ON c.id = p.card_id
            WHERE p.tenant_id = $1
            ORDER BY c.number, p.position
            "#,
        )
        .bind(tenant_id)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }
}
