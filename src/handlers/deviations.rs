// src/handlers/deviations.rs

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
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
    middleware::{auth::AuthenticatedUser, i18n::Locale, tenancy::TenantContext},
    models::deviations::{ApprovePayload, CorrectiveActionPayload, Deviation, DeviationFilter, DeviationPayload},
};

// =============================================================================
//  1. LIFECYCLE
// =============================================================================

// POST /api/deviations
#[utoipa::path(
    post,
    path = "/api/deviations",
    tag = "Deviations",
    request_body = DeviationPayload,
    responses((status = 201, description = "Deviation created, caller is the owner", body = Deviation)),
    params(("x-tenant-id" = Uuid, Header, description = "Plant id")),
    security(("api_jwt" = []))
)]
pub async fn create_deviation(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Json(payload): Json<DeviationPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate_all()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut tx = begin_rls_transaction(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let deviation = app_state
        .deviation_service
        .create(&mut *tx, tenant.0, &user.0, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    tx.commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(deviation)))
}

// POST /api/deviations/{id}/submit
#[utoipa::path(
    post,
    path = "/api/deviations/{id}/submit",
    tag = "Deviations",
    responses(
        (status = 200, description = "Draft sent to approval", body = Deviation),
        (status = 409, description = "Not a draft")
    ),
    params(
        ("id" = Uuid, Path, description = "Deviation id"),
        ("x-tenant-id" = Uuid, Header, description = "Plant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn submit_deviation(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = begin_rls_transaction(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let deviation = app_state
        .deviation_service
        .submit(&mut *tx, tenant.0, &user.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    tx.commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(deviation))
}

// PUT /api/deviations/{id}
#[utoipa::path(
    put,
    path = "/api/deviations/{id}",
    tag = "Deviations",
    request_body = DeviationPayload,
    responses(
        (status = 200, description = "Content replaced, approvals reset", body = Deviation),
        (status = 403, description = "Not the owner"),
        (status = 409, description = "Already decided")
    ),
    params(
        ("id" = Uuid, Path, description = "Deviation id"),
        ("x-tenant-id" = Uuid, Header, description = "Plant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_deviation(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<DeviationPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate_all()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut tx = begin_rls_transaction(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let deviation = app_state
        .deviation_service
        .update(&mut *tx, tenant.0, &user.0, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    tx.commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(deviation))
}

// POST /api/deviations/{id}/approvals
#[utoipa::path(
    post,
    path = "/api/deviations/{id}/approvals",
    tag = "Deviations",
    request_body = ApprovePayload,
    responses(
        (status = 200, description = "Sign-off recorded", body = Deviation),
        (status = 403, description = "Caller lacks the approval role"),
        (status = 409, description = "Status does not accept sign-offs"),
        (status = 422, description = "Rejection without reason")
    ),
    params(
        ("id" = Uuid, Path, description = "Deviation id"),
        ("x-tenant-id" = Uuid, Header, description = "Plant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn approve_deviation(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<ApprovePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut tx = begin_rls_transaction(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let deviation = app_state
        .deviation_service
        .approve(
            &mut *tx,
            tenant.0,
            &user.0,
            id,
            payload.role,
            payload.approved,
            payload.reason.as_deref(),
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    tx.commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(deviation))
}

// DELETE /api/deviations/{id}
#[utoipa::path(
    delete,
    path = "/api/deviations/{id}",
    tag = "Deviations",
    responses((status = 204, description = "Draft deleted")),
    params(
        ("id" = Uuid, Path, description = "Deviation id"),
        ("x-tenant-id" = Uuid, Header, description = "Plant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_deviation(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = begin_rls_transaction(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .deviation_service
        .delete(&mut *tx, tenant.0, &user.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    tx.commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  2. CORRECTIVE ACTIONS
// =============================================================================

// POST /api/deviations/{id}/actions
#[utoipa::path(
    post,
    path = "/api/deviations/{id}/actions",
    tag = "Deviations",
    request_body = CorrectiveActionPayload,
    responses((status = 201, description = "Action added", body = Deviation)),
    params(
        ("id" = Uuid, Path, description = "Deviation id"),
        ("x-tenant-id" = Uuid, Header, description = "Plant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_corrective_action(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<CorrectiveActionPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut tx = begin_rls_transaction(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let deviation = app_state
        .deviation_service
        .add_corrective_action(&mut *tx, tenant.0, &user.0, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    tx.commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(deviation)))
}

// POST /api/deviations/{id}/actions/{action_id}/close
#[utoipa::path(
    post,
    path = "/api/deviations/{id}/actions/{action_id}/close",
    tag = "Deviations",
    responses(
        (status = 200, description = "Action closed", body = Deviation),
        (status = 403, description = "Neither responsible, owner nor quality")
    ),
    params(
        ("id" = Uuid, Path, description = "Deviation id"),
        ("action_id" = Uuid, Path, description = "Corrective action id"),
        ("x-tenant-id" = Uuid, Header, description = "Plant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn close_corrective_action(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path((id, action_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = begin_rls_transaction(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let deviation = app_state
        .deviation_service
        .close_corrective_action(&mut *tx, tenant.0, &user.0, id, action_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    tx.commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(deviation))
}

// =============================================================================
//  3. READING
// =============================================================================

// GET /api/deviations
#[utoipa::path(
    get,
    path = "/api/deviations",
    tag = "Deviations",
    responses((status = 200, description = "Deviations with their effective status", body = Vec<Deviation>)),
    params(
        DeviationFilter,
        ("x-tenant-id" = Uuid, Header, description = "Plant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_deviations(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Query(filter): Query<DeviationFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = begin_rls_transaction(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let deviations = app_state
        .deviation_service
        .list(&mut *tx, tenant.0, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(deviations))
}

// GET /api/deviations/{id}
#[utoipa::path(
    get,
    path = "/api/deviations/{id}",
    tag = "Deviations",
    responses((status = 200, description = "One deviation", body = Deviation)),
    params(
        ("id" = Uuid, Path, description = "Deviation id"),
        ("x-tenant-id" = Uuid, Header, description = "Plant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_deviation(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = begin_rls_transaction(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let deviation = app_state
        .deviation_service
        .get(&mut *tx, tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(deviation))
}

// GET /api/deviations/{id}/pdf
#[utoipa::path(
    get,
    path = "/api/deviations/{id}/pdf",
    tag = "Deviations",
    responses((status = 200, description = "Printable deviation", content_type = "application/pdf")),
    params(
        ("id" = Uuid, Path, description = "Deviation id"),
        ("x-tenant-id" = Uuid, Header, description = "Plant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn deviation_pdf(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let mut tx = begin_rls_transaction(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let (internal_id, pdf_bytes) = app_state
        .document_service
        .deviation_pdf(&mut *tx, tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}.pdf\"", internal_id)),
    ];

    Ok((headers, pdf_bytes).into_response())
}
