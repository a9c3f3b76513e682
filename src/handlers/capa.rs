// src/handlers/capa.rs

use axum::{
    extract::{Path, Query, State},
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
        rbac::{RequireRole, RoleCapaEditor},
        tenancy::TenantContext,
    },
    models::capa::{Capa, CapaFilter, CapaPayload},
};

// POST /api/capa
#[utoipa::path(
    post,
    path = "/api/capa",
    tag = "CAPA",
    request_body = CapaPayload,
    responses(
        (status = 201, description = "Capacity sheet created", body = Capa),
        (status = 409, description = "Article already has a sheet")
    ),
    params(("x-tenant-id" = Uuid, Header, description = "Plant id")),
    security(("api_jwt" = []))
)]
pub async fn create_capa(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<RoleCapaEditor>,
    Json(payload): Json<CapaPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut tx = begin_rls_transaction(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let capa = app_state
        .capa_service
        .create(&mut *tx, tenant.0, &user.0.email, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    tx.commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(capa)))
}

// GET /api/capa
#[utoipa::path(
    get,
    path = "/api/capa",
    tag = "CAPA",
    responses((status = 200, description = "Capacity sheets", body = Vec<Capa>)),
    params(
        CapaFilter,
        ("x-tenant-id" = Uuid, Header, description = "Plant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_capa(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Query(filter): Query<CapaFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = begin_rls_transaction(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let rows = app_state
        .capa_service
        .list(&mut *tx, tenant.0, filter.client.as_deref())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(rows))
}

// GET /api/capa/{id}
#[utoipa::path(
    get,
    path = "/api/capa/{id}",
    tag = "CAPA",
    responses((status = 200, description = "One capacity sheet", body = Capa)),
    params(
        ("id" = Uuid, Path, description = "Sheet id"),
        ("x-tenant-id" = Uuid, Header, description = "Plant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_capa(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = begin_rls_transaction(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let capa = app_state
        .capa_service
        .get(&mut *tx, tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(capa))
}

// PUT /api/capa/{id}
#[utoipa::path(
    put,
    path = "/api/capa/{id}",
    tag = "CAPA",
    request_body = CapaPayload,
    responses((status = 200, description = "Sheet updated, edit stamp refreshed", body = Capa)),
    params(
        ("id" = Uuid, Path, description = "Sheet id"),
        ("x-tenant-id" = Uuid, Header, description = "Plant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_capa(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<RoleCapaEditor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CapaPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut tx = begin_rls_transaction(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let capa = app_state
        .capa_service
        .update(&mut *tx, tenant.0, &user.0.email, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    tx.commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(capa))
}

// DELETE /api/capa/{id}
#[utoipa::path(
    delete,
    path = "/api/capa/{id}",
    tag = "CAPA",
    responses((status = 204, description = "Sheet deleted")),
    params(
        ("id" = Uuid, Path, description = "Sheet id"),
        ("x-tenant-id" = Uuid, Header, description = "Plant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_capa(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<RoleCapaEditor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = begin_rls_transaction(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .capa_service
        .delete(&mut *tx, tenant.0, &user.0.email, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    tx.commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
