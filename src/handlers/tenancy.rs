// src/handlers/tenancy.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{RequireRole, RoleAdmin},
    },
    models::tenancy::{AddMemberPayload, CreateTenantPayload, Tenant, TenantMember},
};

// POST /api/admin/tenants
#[utoipa::path(
    post,
    path = "/api/admin/tenants",
    tag = "Tenancy",
    request_body = CreateTenantPayload,
    responses(
        (status = 201, description = "Plant created, creator joined", body = Tenant),
        (status = 409, description = "Code taken")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_tenant(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequireRole<RoleAdmin>,
    Json(payload): Json<CreateTenantPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let tenant = app_state
        .tenant_service
        .create_tenant(&payload.name, &payload.code, user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(tenant)))
}

// GET /api/admin/tenants/{tenant_id}/members
#[utoipa::path(
    get,
    path = "/api/admin/tenants/{tenant_id}/members",
    tag = "Tenancy",
    responses((status = 200, description = "Members of the plant", body = Vec<TenantMember>)),
    params(("tenant_id" = Uuid, Path, description = "Plant id")),
    security(("api_jwt" = []))
)]
pub async fn list_members(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<RoleAdmin>,
    Path(tenant_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let members = app_state
        .tenant_service
        .list_members(tenant_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(members))
}

// POST /api/admin/tenants/{tenant_id}/members
#[utoipa::path(
    post,
    path = "/api/admin/tenants/{tenant_id}/members",
    tag = "Tenancy",
    request_body = AddMemberPayload,
    responses(
        (status = 204, description = "User joined the plant"),
        (status = 404, description = "Unknown user")
    ),
    params(("tenant_id" = Uuid, Path, description = "Plant id")),
    security(("api_jwt" = []))
)]
pub async fn add_member(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<RoleAdmin>,
    Path(tenant_id): Path<Uuid>,
    Json(payload): Json<AddMemberPayload>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .tenant_service
        .add_member(tenant_id, payload.user_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// DELETE /api/admin/tenants/{tenant_id}/members/{user_id}
#[utoipa::path(
    delete,
    path = "/api/admin/tenants/{tenant_id}/members/{user_id}",
    tag = "Tenancy",
    responses((status = 204, description = "User left the plant")),
    params(
        ("tenant_id" = Uuid, Path, description = "Plant id"),
        ("user_id" = Uuid, Path, description = "User id")
    ),
    security(("api_jwt" = []))
)]
pub async fn remove_member(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<RoleAdmin>,
    Path((tenant_id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .tenant_service
        .remove_member(tenant_id, user_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
