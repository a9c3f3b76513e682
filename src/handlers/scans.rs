// src/handlers/scans.rs

use axum::{
    extract::{Query, State},
    http::{header, HeaderName, StatusCode},
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
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{RequireRole, RoleOperator, RoleRework},
        tenancy::TenantContext,
    },
    models::scans::{
        CountBoxPayload, DmcScanPayload, LabelScanPayload, ReworkPayload, Scan, ScanFilter, ScanResult, ScanSnapshot,
        StatusQuery,
    },
    services::document_service::render_qr_png,
};

const PALLET_BATCH_HEADER: HeaderName = HeaderName::from_static("x-pallet-batch");

// =============================================================================
//  STATION SCANS
// =============================================================================

// POST /api/scans/dmc
#[utoipa::path(
    post,
    path = "/api/scans/dmc",
    tag = "Scans",
    request_body = DmcScanPayload,
    responses(
        (status = 201, description = "Part saved in the current box", body = ScanResult),
        (status = 409, description = "DMC already scanned"),
        (status = 422, description = "Scan rejected, `code` carries the reason")
    ),
    params(("x-tenant-id" = Uuid, Header, description = "Plant id")),
    security(("api_jwt" = []))
)]
pub async fn save_dmc(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<RoleOperator>,
    Json(payload): Json<DmcScanPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut tx = begin_rls_transaction(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let result = app_state
        .scan_service
        .save_dmc(
            &mut *tx,
            tenant.0,
            &payload.workplace,
            &payload.article_number,
            &payload.dmc,
            &payload.operator,
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    tx.commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(result)))
}

// POST /api/scans/hydra
#[utoipa::path(
    post,
    path = "/api/scans/hydra",
    tag = "Scans",
    request_body = LabelScanPayload,
    responses(
        (status = 200, description = "Box closed with the HYDRA batch", body = ScanResult),
        (status = 409, description = "Batch already used"),
        (status = 422, description = "Scan rejected, `code` carries the reason")
    ),
    params(("x-tenant-id" = Uuid, Header, description = "Plant id")),
    security(("api_jwt" = []))
)]
pub async fn save_hydra_batch(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<RoleOperator>,
    Json(payload): Json<LabelScanPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut tx = begin_rls_transaction(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let result = app_state
        .scan_service
        .save_hydra_batch(
            &mut *tx,
            tenant.0,
            &payload.workplace,
            &payload.article_number,
            &payload.qr,
            &payload.operator,
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    tx.commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(result))
}

// POST /api/scans/box
#[utoipa::path(
    post,
    path = "/api/scans/box",
    tag = "Scans",
    request_body = CountBoxPayload,
    responses(
        (status = 201, description = "Box counted", body = ScanResult),
        (status = 422, description = "Scan rejected, `code` carries the reason")
    ),
    params(("x-tenant-id" = Uuid, Header, description = "Plant id")),
    security(("api_jwt" = []))
)]
pub async fn count_box(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<RoleOperator>,
    Json(payload): Json<CountBoxPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut tx = begin_rls_transaction(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let result = app_state
        .scan_service
        .count_box(&mut *tx, tenant.0, &payload.workplace, &payload.article_number, &payload.operator)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    tx.commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(result)))
}

// POST /api/scans/pallet
#[utoipa::path(
    post,
    path = "/api/scans/pallet",
    tag = "Scans",
    request_body = LabelScanPayload,
    responses(
        (status = 200, description = "Pallet moved to the warehouse", body = ScanResult),
        (status = 409, description = "Batch already used"),
        (status = 422, description = "Scan rejected, `code` carries the reason")
    ),
    params(("x-tenant-id" = Uuid, Header, description = "Plant id")),
    security(("api_jwt" = []))
)]
pub async fn save_pallet_batch(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<RoleOperator>,
    Json(payload): Json<LabelScanPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut tx = begin_rls_transaction(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let result = app_state
        .scan_service
        .save_pallet_batch(
            &mut *tx,
            tenant.0,
            &payload.workplace,
            &payload.article_number,
            &payload.qr,
            &payload.operator,
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    tx.commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(result))
}

// GET /api/scans/status
#[utoipa::path(
    get,
    path = "/api/scans/status",
    tag = "Scans",
    responses((status = 200, description = "Box and pallet fill level", body = ScanSnapshot)),
    params(
        StatusQuery,
        ("x-tenant-id" = Uuid, Header, description = "Plant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_status(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<RoleOperator>,
    Query(query): Query<StatusQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = begin_rls_transaction(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let snapshot = app_state
        .scan_service
        .status(&mut *tx, tenant.0, &query.workplace, &query.article_number)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(snapshot))
}

// GET /api/scans/pallet-label
#[utoipa::path(
    get,
    path = "/api/scans/pallet-label",
    tag = "Scans",
    responses(
        (status = 200, description = "QR code of a new pallet label, batch id in `x-pallet-batch`", content_type = "image/png"),
        (status = 422, description = "Article has no pallet stage")
    ),
    params(
        StatusQuery,
        ("x-tenant-id" = Uuid, Header, description = "Plant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn pallet_label(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<RoleOperator>,
    Query(query): Query<StatusQuery>,
) -> Result<Response, ApiError> {
    let mut tx = begin_rls_transaction(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let label = app_state
        .scan_service
        .pallet_label(&mut *tx, tenant.0, &query.workplace, &query.article_number)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let png = render_qr_png(&label.payload).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let headers = [
        (header::CONTENT_TYPE, "image/png".to_string()),
        (PALLET_BATCH_HEADER, label.batch),
    ];
    Ok((headers, png).into_response())
}

// =============================================================================
//  QUALITY
// =============================================================================

// POST /api/scans/rework
#[utoipa::path(
    post,
    path = "/api/scans/rework",
    tag = "Scans",
    request_body = ReworkPayload,
    responses(
        (status = 200, description = "Part marked for rework", body = Scan),
        (status = 404, description = "No live record for this DMC")
    ),
    params(("x-tenant-id" = Uuid, Header, description = "Plant id")),
    security(("api_jwt" = []))
)]
pub async fn mark_rework(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<RoleRework>,
    Json(payload): Json<ReworkPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut tx = begin_rls_transaction(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let scan = app_state
        .scan_service
        .mark_rework(&mut *tx, tenant.0, &payload.dmc, &payload.reason, &user.0.email)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    tx.commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(scan))
}

// GET /api/scans
#[utoipa::path(
    get,
    path = "/api/scans",
    tag = "Scans",
    responses((status = 200, description = "Matching records, newest first", body = Vec<Scan>)),
    params(
        ScanFilter,
        ("x-tenant-id" = Uuid, Header, description = "Plant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn search_scans(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<RoleOperator>,
    Query(filter): Query<ScanFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = begin_rls_transaction(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let scans = app_state
        .scan_service
        .search(&mut *tx, tenant.0, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(scans))
}
