// src/routes.rs

use std::time::Duration;

use axum::{
    http::{header, Method},
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    config::AppState,
    docs::ApiDoc,
    handlers,
    middleware::auth::{auth_guard, tenant_guard},
};

/// Assembles the whole API: public, user-level and plant-scoped routes.
pub fn build_router(app_state: AppState) -> Router {
    // Public
    let public_routes = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/auth/login", post(handlers::auth::login));

    // Logged-in user, no plant needed
    let user_routes = Router::new()
        .route("/api/users/me", get(handlers::auth::get_me))
        .route("/api/users/me/tenants", get(handlers::auth::get_my_tenants))
        .route(
            "/api/admin/users",
            post(handlers::users::create_user).get(handlers::users::list_users),
        )
        .route("/api/admin/users/{id}", delete(handlers::users::delete_user))
        .route("/api/admin/users/{id}/roles", put(handlers::users::update_roles))
        .route("/api/admin/users/{id}/password", put(handlers::users::reset_password))
        .route("/api/admin/tenants", post(handlers::tenancy::create_tenant))
        .route(
            "/api/admin/tenants/{tenant_id}/members",
            post(handlers::tenancy::add_member).get(handlers::tenancy::list_members),
        )
        .route(
            "/api/admin/tenants/{tenant_id}/members/{user_id}",
            delete(handlers::tenancy::remove_member),
        )
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    // Plant scoped (X-Tenant-ID + membership)
    let tenant_routes = Router::new()
        // --- articles ---
        .route(
            "/api/articles",
            post(handlers::articles::create_article).get(handlers::articles::list_articles),
        )
        .route(
            "/api/articles/{id}",
            get(handlers::articles::get_article)
                .put(handlers::articles::update_article)
                .delete(handlers::articles::delete_article),
        )
        // --- scans ---
        .route("/api/scans", get(handlers::scans::search_scans))
        .route("/api/scans/dmc", post(handlers::scans::save_dmc))
        .route("/api/scans/hydra", post(handlers::scans::save_hydra_batch))
        .route("/api/scans/box", post(handlers::scans::count_box))
        .route("/api/scans/pallet", post(handlers::scans::save_pallet_batch))
        .route("/api/scans/status", get(handlers::scans::get_status))
        .route("/api/scans/pallet-label", get(handlers::scans::pallet_label))
        .route("/api/scans/rework", post(handlers::scans::mark_rework))
        // --- deviations ---
        .route(
            "/api/deviations",
            post(handlers::deviations::create_deviation).get(handlers::deviations::list_deviations),
        )
        .route(
            "/api/deviations/{id}",
            get(handlers::deviations::get_deviation)
                .put(handlers::deviations::update_deviation)
                .delete(handlers::deviations::delete_deviation),
        )
        .route("/api/deviations/{id}/submit", post(handlers::deviations::submit_deviation))
        .route("/api/deviations/{id}/approvals", post(handlers::deviations::approve_deviation))
        .route("/api/deviations/{id}/actions", post(handlers::deviations::add_corrective_action))
        .route(
            "/api/deviations/{id}/actions/{action_id}/close",
            post(handlers::deviations::close_corrective_action),
        )
        .route("/api/deviations/{id}/pdf", get(handlers::deviations::deviation_pdf))
        // --- capa ---
        .route("/api/capa", post(handlers::capa::create_capa).get(handlers::capa::list_capa))
        .route(
            "/api/capa/{id}",
            get(handlers::capa::get_capa)
                .put(handlers::capa::update_capa)
                .delete(handlers::capa::delete_capa),
        )
        // --- news ---
        .route("/api/news", post(handlers::news::create_news).get(handlers::news::list_news))
        .route(
            "/api/news/{id}",
            get(handlers::news::get_news)
                .put(handlers::news::update_news)
                .delete(handlers::news::delete_news),
        )
        .route("/api/news/{id}/pin", post(handlers::news::toggle_pin))
        // --- inventory ---
        .route(
            "/api/inventory/cards",
            post(handlers::inventory::create_card).get(handlers::inventory::list_cards),
        )
        .route(
            "/api/inventory/cards/{card_id}/positions",
            post(handlers::inventory::add_position).get(handlers::inventory::list_positions),
        )
        .route("/api/inventory/positions/{id}", put(handlers::inventory::update_position))
        .route("/api/inventory/positions/{id}/approve", post(handlers::inventory::approve_position))
        // --- overtime ---
        .route(
            "/api/overtime",
            post(handlers::overtime::submit_overtime).get(handlers::overtime::list_overtime),
        )
        .route("/api/overtime/summary", get(handlers::overtime::overtime_summary))
        .route("/api/overtime/{id}/decision", post(handlers::overtime::decide_overtime))
        .route("/api/overtime/{id}/accounted", post(handlers::overtime::mark_accounted))
        // --- project time ---
        .route(
            "/api/projects/entries",
            post(handlers::projects::add_entry).get(handlers::projects::my_entries),
        )
        .route("/api/projects/entries/{id}", delete(handlers::projects::delete_entry))
        .route("/api/projects/summary", get(handlers::projects::project_summary))
        // --- exports ---
        .route("/api/exports/scans.csv", get(handlers::exports::export_scans))
        .route("/api/exports/deviations.csv", get(handlers::exports::export_deviations))
        .route("/api/exports/capa.csv", get(handlers::exports::export_capa))
        .route("/api/exports/inventory.csv", get(handlers::exports::export_inventory))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), tenant_guard));

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT_LANGUAGE,
            header::HeaderName::from_static("x-tenant-id"),
        ])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .merge(public_routes)
        .merge(user_routes)
        .merge(tenant_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}
