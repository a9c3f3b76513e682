// src/services/capa_service.rs

use chrono::Utc;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::CapaRepository,
    models::capa::{Capa, CapaPayload, EditStamp},
};

#[derive(Clone)]
pub struct CapaService {
    capa_repo: CapaRepository,
}

impl CapaService {
    pub fn new(capa_repo: CapaRepository) -> Self {
        Self { capa_repo }
    }

    fn stamp(editor: &str) -> EditStamp {
        EditStamp { email: editor.to_string(), at: Utc::now() }
    }

    pub async fn create<'e, E>(&self, executor: E, tenant_id: Uuid, editor: &str, payload: &CapaPayload) -> Result<Capa, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let capa = self.capa_repo.create(executor, tenant_id, payload, &Self::stamp(editor)).await?;
        tracing::info!("capa {} created by {}", capa.article_number, editor);
        Ok(capa)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        editor: &str,
        id: Uuid,
        payload: &CapaPayload,
    ) -> Result<Capa, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let capa = self
            .capa_repo
            .update(executor, tenant_id, id, payload, &Self::stamp(editor))
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("capa".into()))?;
        tracing::info!("capa {} edited by {}", capa.article_number, editor);
        Ok(capa)
    }

    pub async fn delete<'e, E>(&self, executor: E, tenant_id: Uuid, editor: &str, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if !self.capa_repo.delete(executor, tenant_id, id).await? {
            return Err(AppError::ResourceNotFound("capa".into()));
        }
        tracing::info!("capa {} deleted by {}", id, editor);
        Ok(())
    }

    pub async fn list<'e, E>(&self, executor: E, tenant_id: Uuid, client: Option<&str>) -> Result<Vec<Capa>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.capa_repo.list(executor, tenant_id, client).await
    }

    pub async fn get<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<Capa, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.capa_repo
            .find_by_id(executor, tenant_id, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("capa".into()))
    }
}
