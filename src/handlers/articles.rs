// src/handlers/articles.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::{
        db_utils::begin_rls_transaction,
        error::{ApiError, AppError},
    },
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{RequireRole, RoleArticleConfig},
        tenancy::TenantContext,
    },
    models::articles::{ArticleConfig, ArticleConfigPayload, ArticleFilter},
};

// POST /api/articles
#[utoipa::path(
    post,
    path = "/api/articles",
    tag = "Articles",
    request_body = ArticleConfigPayload,
    responses(
        (status = 201, description = "Article configured", body = ArticleConfig),
        (status = 409, description = "Article already configured at this workplace")
    ),
    params(("x-tenant-id" = Uuid, Header, description = "Plant id")),
    security(("api_jwt" = []))
)]
pub async fn create_article(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<RoleArticleConfig>,
    Json(payload): Json<ArticleConfigPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate_all()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut tx = begin_rls_transaction(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let article = app_state
        .article_service
        .create(&mut *tx, tenant.0, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    tx.commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(article)))
}

// GET /api/articles
#[utoipa::path(
    get,
    path = "/api/articles",
    tag = "Articles",
    responses((status = 200, description = "Configured articles", body = Vec<ArticleConfig>)),
    params(
        ArticleFilter,
        ("x-tenant-id" = Uuid, Header, description = "Plant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_articles(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Query(filter): Query<ArticleFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = begin_rls_transaction(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let articles = app_state
        .article_service
        .list(&mut *tx, tenant.0, filter.workplace.as_deref())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(articles))
}

// GET /api/articles/{id}
#[utoipa::path(
    get,
    path = "/api/articles/{id}",
    tag = "Articles",
    responses((status = 200, description = "Article configuration", body = ArticleConfig)),
    params(
        ("id" = Uuid, Path, description = "Article config id"),
        ("x-tenant-id" = Uuid, Header, description = "Plant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_article(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = begin_rls_transaction(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let article = app_state
        .article_service
        .get(&mut *tx, tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(article))
}

// PUT /api/articles/{id}
#[utoipa::path(
    put,
    path = "/api/articles/{id}",
    tag = "Articles",
    request_body = ArticleConfigPayload,
    responses((status = 200, description = "Article updated", body = ArticleConfig)),
    params(
        ("id" = Uuid, Path, description = "Article config id"),
        ("x-tenant-id" = Uuid, Header, description = "Plant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_article(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<RoleArticleConfig>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ArticleConfigPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate_all()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut tx = begin_rls_transaction(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let article = app_state
        .article_service
        .update(&mut *tx, tenant.0, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    tx.commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(article))
}

// DELETE /api/articles/{id}
#[utoipa::path(
    delete,
    path = "/api/articles/{id}",
    tag = "Articles",
    responses((status = 204, description = "Article removed")),
    params(
        ("id" = Uuid, Path, description = "Article config id"),
        ("x-tenant-id" = Uuid, Header, description = "Plant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_article(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<RoleArticleConfig>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = begin_rls_transaction(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .article_service
        .delete(&mut *tx, tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    tx.commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
