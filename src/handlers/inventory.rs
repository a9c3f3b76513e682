// src/handlers/inventory.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        db_utils::begin_rls_transaction,
        error::{ApiError, AppError},
    },
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{RequireRole, RoleInventory, RoleInventoryApprover},
        tenancy::TenantContext,
    },
    models::inventory::{CreateCardPayload, InventoryCard, InventoryCardSummary, InventoryPosition, PositionPayload},
};

// =============================================================================
//  1. CARDS
// =============================================================================

// POST /api/inventory/cards
#[utoipa::path(
    post,
    path = "/api/inventory/cards",
    tag = "Inventory",
    request_body = CreateCardPayload,
    responses((status = 201, description = "Card opened with the next number", body = InventoryCard)),
    params(("x-tenant-id" = Uuid, Header, description = "Plant id")),
    security(("api_jwt" = []))
)]
pub async fn create_card(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<RoleInventory>,
    Json(payload): Json<CreateCardPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut tx = begin_rls_transaction(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let card = app_state
        .inventory_service
        .create_card(&mut *tx, tenant.0, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    tx.commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(card)))
}

// GET /api/inventory/cards
#[utoipa::path(
    get,
    path = "/api/inventory/cards",
    tag = "Inventory",
    responses((status = 200, description = "Cards with position counts", body = Vec<InventoryCardSummary>)),
    params(("x-tenant-id" = Uuid, Header, description = "Plant id")),
    security(("api_jwt" = []))
)]
pub async fn list_cards(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<RoleInventory>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = begin_rls_transaction(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let cards = app_state
        .inventory_service
        .list_cards(&mut *tx, tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(cards))
}

// =============================================================================
//  2. POSITIONS
// =============================================================================

// POST /api/inventory/cards/{card_id}/positions
#[utoipa::path(
    post,
    path = "/api/inventory/cards/{card_id}/positions",
    tag = "Inventory",
    request_body = PositionPayload,
    responses(
        (status = 201, description = "Position recorded", body = InventoryPosition),
        (status = 422, description = "Card already holds 25 positions")
    ),
    params(
        ("card_id" = Uuid, Path, description = "Card id"),
        ("x-tenant-id" = Uuid, Header, description = "Plant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_position(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<RoleInventory>,
    Path(card_id): Path<Uuid>,
    Json(payload): Json<PositionPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut tx = begin_rls_transaction(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let position = app_state
        .inventory_service
        .add_position(&mut *tx, tenant.0, card_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    tx.commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(position)))
}

// GET /api/inventory/cards/{card_id}/positions
#[utoipa::path(
    get,
    path = "/api/inventory/cards/{card_id}/positions",
    tag = "Inventory",
    responses((status = 200, description = "Positions of the card", body = Vec<InventoryPosition>)),
    params(
        ("card_id" = Uuid, Path, description = "Card id"),
        ("x-tenant-id" = Uuid, Header, description = "Plant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_positions(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<RoleInventory>,
    Path(card_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = begin_rls_transaction(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let positions = app_state
        .inventory_service
        .list_positions(&mut *tx, tenant.0, card_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(positions))
}

// PUT /api/inventory/positions/{id}
#[utoipa::path(
    put,
    path = "/api/inventory/positions/{id}",
    tag = "Inventory",
    request_body = PositionPayload,
    responses(
        (status = 200, description = "Position corrected", body = InventoryPosition),
        (status = 409, description = "Position already approved")
    ),
    params(
        ("id" = Uuid, Path, description = "Position id"),
        ("x-tenant-id" = Uuid, Header, description = "Plant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_position(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<RoleInventory>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PositionPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut tx = begin_rls_transaction(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let position = app_state
        .inventory_service
        .update_position(&mut *tx, tenant.0, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    tx.commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(position))
}

// POST /api/inventory/positions/{id}/approve
#[utoipa::path(
    post,
    path = "/api/inventory/positions/{id}/approve",
    tag = "Inventory",
    responses(
        (status = 200, description = "Position approved", body = InventoryPosition),
        (status = 409, description = "Position already approved")
    ),
    params(
        ("id" = Uuid, Path, description = "Position id"),
        ("x-tenant-id" = Uuid, Header, description = "Plant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn approve_position(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<RoleInventoryApprover>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = begin_rls_transaction(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let position = app_state
        .inventory_service
        .approve_position(&mut *tx, tenant.0, id, &user.0.email)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    tx.commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(position))
}
