// src/handlers/exports.rs

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::{
    common::{
        db_utils::begin_rls_transaction,
        error::ApiError,
    },
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{RequireRole, RoleInventory, RoleOperator},
        tenancy::TenantContext,
    },
    models::{capa::CapaFilter, deviations::DeviationFilter, scans::ScanFilter},
    services::export,
};

fn csv_response(file_name: &str, body: Vec<u8>) -> Response {
    let headers = [
        (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
        (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}.csv\"", file_name)),
    ];
    (headers, body).into_response()
}

// GET /api/exports/scans.csv
#[utoipa::path(
    get,
    path = "/api/exports/scans.csv",
    tag = "Exports",
    responses((status = 200, description = "Scan search as CSV", content_type = "text/csv")),
    params(
        ScanFilter,
        ("x-tenant-id" = Uuid, Header, description = "Plant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn export_scans(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<RoleOperator>,
    Query(filter): Query<ScanFilter>,
) -> Result<Response, ApiError> {
    let mut tx = begin_rls_transaction(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let scans = app_state
        .scan_service
        .search(&mut *tx, tenant.0, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let body = export::scans_csv(&scans).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok(csv_response("scans", body))
}

// GET /api/exports/deviations.csv
#[utoipa::path(
    get,
    path = "/api/exports/deviations.csv",
    tag = "Exports",
    responses((status = 200, description = "Deviation register as CSV", content_type = "text/csv")),
    params(
        DeviationFilter,
        ("x-tenant-id" = Uuid, Header, description = "Plant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn export_deviations(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Query(filter): Query<DeviationFilter>,
) -> Result<Response, ApiError> {
    let mut tx = begin_rls_transaction(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let deviations = app_state
        .deviation_service
        .list(&mut *tx, tenant.0, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let body = export::deviations_csv(&deviations).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok(csv_response("deviations", body))
}

// GET /api/exports/capa.csv
#[utoipa::path(
    get,
    path = "/api/exports/capa.csv",
    tag = "Exports",
    responses((status = 200, description = "Capacity sheets as CSV, one line per machine", content_type = "text/csv")),
    params(
        CapaFilter,
        ("x-tenant-id" = Uuid, Header, description = "Plant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn export_capa(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Query(filter): Query<CapaFilter>,
) -> Result<Response, ApiError> {
    let mut tx = begin_rls_transaction(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let rows = app_state
        .capa_service
        .list(&mut *tx, tenant.0, filter.client.as_deref())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let body = export::capa_csv(&rows).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok(csv_response("capa", body))
}

// GET /api/exports/inventory.csv
#[utoipa::path(
    get,
    path = "/api/exports/inventory.csv",
    tag = "Exports",
    responses((status = 200, description = "All inventory positions as CSV", content_type = "text/csv")),
    params(("x-tenant-id" = Uuid, Header, description = "Plant id")),
    security(("api_jwt" = []))
)]
pub async fn export_inventory(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<RoleInventory>,
) -> Result<Response, ApiError> {
    let mut tx = begin_rls_transaction(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let rows = app_state
        .inventory_service
        .export_rows(&mut *tx, tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let body = export::inventory_csv(&rows).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok(csv_response("inventory", body))
}
