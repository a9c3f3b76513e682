// src/handlers/overtime.rs

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
        rbac::{RequireRole, RoleGroupLeader, RoleHr, RoleOvertimeReader, RoleProductionManager},
        tenancy::TenantContext,
    },
    models::overtime::{DecisionPayload, MonthQuery, OvertimeFilter, OvertimePayload, OvertimeRequest, OvertimeSummaryRow},
};

// POST /api/overtime
#[utoipa::path(
    post,
    path = "/api/overtime",
    tag = "Overtime",
    request_body = OvertimePayload,
    responses((status = 201, description = "Request submitted, pending decision", body = OvertimeRequest)),
    params(("x-tenant-id" = Uuid, Header, description = "Plant id")),
    security(("api_jwt" = []))
)]
pub async fn submit_overtime(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<RoleGroupLeader>,
    Json(payload): Json<OvertimePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut tx = begin_rls_transaction(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let request = app_state
        .overtime_service
        .submit(&mut *tx, tenant.0, &user.0.email, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    tx.commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(request)))
}

// GET /api/overtime
#[utoipa::path(
    get,
    path = "/api/overtime",
    tag = "Overtime",
    responses((status = 200, description = "Requests matching the filter", body = Vec<OvertimeRequest>)),
    params(
        OvertimeFilter,
        ("x-tenant-id" = Uuid, Header, description = "Plant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_overtime(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<RoleOvertimeReader>,
    Query(filter): Query<OvertimeFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = begin_rls_transaction(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let requests = app_state
        .overtime_service
        .list(&mut *tx, tenant.0, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(requests))
}

// POST /api/overtime/{id}/decision
#[utoipa::path(
    post,
    path = "/api/overtime/{id}/decision",
    tag = "Overtime",
    request_body = DecisionPayload,
    responses(
        (status = 200, description = "Request approved or rejected", body = OvertimeRequest),
        (status = 409, description = "Request is no longer pending")
    ),
    params(
        ("id" = Uuid, Path, description = "Request id"),
        ("x-tenant-id" = Uuid, Header, description = "Plant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn decide_overtime(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<RoleProductionManager>,
    Path(id): Path<Uuid>,
    Json(payload): Json<DecisionPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = begin_rls_transaction(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let request = app_state
        .overtime_service
        .decide(&mut *tx, tenant.0, id, payload.approved, &user.0.email)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    tx.commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(request))
}

// POST /api/overtime/{id}/accounted
#[utoipa::path(
    post,
    path = "/api/overtime/{id}/accounted",
    tag = "Overtime",
    responses(
        (status = 200, description = "Request settled by HR", body = OvertimeRequest),
        (status = 409, description = "Request is not approved")
    ),
    params(
        ("id" = Uuid, Path, description = "Request id"),
        ("x-tenant-id" = Uuid, Header, description = "Plant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn mark_accounted(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<RoleHr>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = begin_rls_transaction(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let request = app_state
        .overtime_service
        .mark_accounted(&mut *tx, tenant.0, id, &user.0.email)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    tx.commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(request))
}

// GET /api/overtime/summary
#[utoipa::path(
    get,
    path = "/api/overtime/summary",
    tag = "Overtime",
    responses((status = 200, description = "Approved and accounted hours per employee", body = Vec<OvertimeSummaryRow>)),
    params(
        MonthQuery,
        ("x-tenant-id" = Uuid, Header, description = "Plant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn overtime_summary(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<RoleOvertimeReader>,
    Query(query): Query<MonthQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = begin_rls_transaction(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let rows = app_state
        .overtime_service
        .summary(&mut *tx, tenant.0, query.month.as_deref())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(rows))
}
