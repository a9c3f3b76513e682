// src/services/inventory_service.rs

use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::{
        db_utils::next_counter,
        error::{AppError, RuleViolation},
    },
    db::InventoryRepository,
    models::inventory::{
        position_identifier, CreateCardPayload, InventoryCard, InventoryCardSummary, InventoryExportRow,
        InventoryPosition, PositionPayload, MAX_POSITIONS_PER_CARD,
    },
};

#[derive(Clone)]
pub struct InventoryService {
    inventory_repo: InventoryRepository,
}

/// Next free position number on a card holding `current_max`.
pub(crate) fn next_position(current_max: i32) -> Result<i32, RuleViolation> {
    if current_max >= MAX_POSITIONS_PER_CARD {
        Err(RuleViolation::CardFull)
    } else {
        Ok(current_max + 1)
    }
}

impl InventoryService {
    pub fn new(inventory_repo: InventoryRepository) -> Self {
        Self { inventory_repo }
    }

    // --- CARDS ---
    pub async fn create_card<'e, E>(&self, executor: E, tenant_id: Uuid, payload: &CreateCardPayload) -> Result<InventoryCard, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let number = next_counter(&mut *tx, tenant_id, "inventory-card").await?;
        let creators: Vec<String> = payload.creators.iter().map(|c| c.trim().to_string()).collect();

        let card = self
            .inventory_repo
            .create_card(&mut *tx, tenant_id, number, &creators, payload.warehouse.trim(), payload.sector.as_deref())
            .await?;

        tx.commit().await?;

        tracing::info!("inventory card {} opened by {:?}", card.number, card.creators);
        Ok(card)
    }

    pub async fn list_cards<'e, E>(&self, executor: E, tenant_id: Uuid) -> Result<Vec<InventoryCardSummary>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.inventory_repo.list_cards(executor, tenant_id).await
    }

    // --- POSITIONS ---
    pub async fn add_position<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        card_id: Uuid,
        payload: &PositionPayload,
    ) -> Result<InventoryPosition, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let card = self
            .inventory_repo
            .find_card_for_update(&mut *tx, tenant_id, card_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("inventory card".into()))?;

        let current_max = self.inventory_repo.max_position(&mut *tx, card.id).await?;
        let position = next_position(current_max)?;
        let identifier = position_identifier(card.number, position);

        let row = self
            .inventory_repo
            .insert_position(&mut *tx, tenant_id, &card, position, &identifier, payload)
            .await?;

        tx.commit().await?;

        tracing::info!("inventory position {} recorded", row.identifier);
        Ok(row)
    }

    pub async fn update_position<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        payload: &PositionPayload,
    ) -> Result<InventoryPosition, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let current = self
            .inventory_repo
            .find_position_for_update(&mut *tx, tenant_id, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("inventory position".into()))?;
        if current.approved_at.is_some() {
            return Err(RuleViolation::AlreadyApproved.into());
        }

        let row = self.inventory_repo.update_position(&mut *tx, tenant_id, id, payload).await?;
        tx.commit().await?;

        tracing::info!("inventory position {} edited", row.identifier);
        Ok(row)
    }

    pub async fn approve_position<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid, approver: &str) -> Result<InventoryPosition, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let current = self
            .inventory_repo
            .find_position_for_update(&mut *tx, tenant_id, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("inventory position".into()))?;
        if current.approved_at.is_some() {
            return Err(RuleViolation::AlreadyApproved.into());
        }

        let row = self.inventory_repo.approve_position(&mut *tx, tenant_id, id, approver).await?;
        tx.commit().await?;

        tracing::info!("inventory position {} approved by {}", row.identifier, approver);
        Ok(row)
    }

    pub async fn list_positions<'e, E>(&self, executor: E, tenant_id: Uuid, card_id: Uuid) -> Result<Vec<InventoryPosition>, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres, Connection = &'e mut sqlx::PgConnection>,
    {
        let mut conn = executor.acquire().await?;
        if !self.inventory_repo.card_exists(&mut *conn, tenant_id, card_id).await? {
            return Err(AppError::ResourceNotFound("inventory card".into()));
        }
        self.inventory_repo.list_positions(&mut *conn, tenant_id, card_id).await
    }

    pub async fn export_rows<'e, E>(&self, executor: E, tenant_id: Uuid) -> Result<Vec<InventoryExportRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.inventory_repo.export_rows(executor, tenant_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_are_numbered_from_one() {
        assert_eq!(next_position(0), Ok(1));
        assert_eq!(next_position(24), Ok(25));
    }

    #[test]
    fn twenty_five_positions_fill_a_card() {
        assert_eq!(next_position(25), Err(RuleViolation::CardFull));
    }
}
