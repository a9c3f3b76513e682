// tests/access_control.rs
//
// Role gates on plant routes, through the full router and a real database.

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

use next_bruss::{routes::build_router, AppConfig, AppState};

const PASSWORD: &str = "station-29-pass";

fn test_config() -> AppConfig {
    AppConfig {
        database_url: String::new(),
        jwt_secret: "test-secret".to_string(),
        jwt_ttl_hours: 1,
        bind_addr: "127.0.0.1:0".to_string(),
        db_max_connections: 1,
        ldap: None,
        fonts_dir: "./fonts".to_string(),
        bootstrap_admin: None,
    }
}

fn app(pool: PgPool) -> Router {
    build_router(AppState::with_pool(test_config(), pool).unwrap())
}

async fn plant(pool: &PgPool) -> Uuid {
    sqlx::query_scalar("INSERT INTO tenants (name, code) VALUES ('Plant', 'P1') RETURNING id")
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn member(pool: &PgPool, tenant_id: Uuid, email: &str, roles: &[&str]) {
    let hash = bcrypt::hash(PASSWORD, 4).unwrap();
    let roles: Vec<String> = roles.iter().map(|r| r.to_string()).collect();
    let user_id: Uuid = sqlx::query_scalar(
        "INSERT INTO users (email, roles, password_hash) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(email)
    .bind(&roles)
    .bind(hash)
    .fetch_one(pool)
    .await
    .unwrap();

    sqlx::query("INSERT INTO tenant_members (user_id, tenant_id) VALUES ($1, $2)")
        .bind(user_id)
        .bind(tenant_id)
        .execute(pool)
        .await
        .unwrap();
}

async fn login(app: &Router, email: &str) -> String {
    let body = serde_json::json!({ "email": email, "password": PASSWORD }).to_string();
    let response = app
        .clone()
        .oneshot(
            Request::post("/api/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    json["token"].as_str().unwrap().to_string()
}

async fn get(app: &Router, uri: &str, token: &str, tenant_id: Uuid) -> StatusCode {
    app.clone()
        .oneshot(
            Request::get(uri)
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .header("x-tenant-id", tenant_id.to_string())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
        .status()
}

#[sqlx::test(migrations = "./migrations")]
async fn scan_reads_need_the_operator_role(pool: PgPool) {
    let tenant = plant(&pool).await;
    member(&pool, tenant, "clerk@bruss.example", &["hr"]).await;
    member(&pool, tenant, "operator@bruss.example", &["operator"]).await;
    let app = app(pool);

    let clerk = login(&app, "clerk@bruss.example").await;
    let operator = login(&app, "operator@bruss.example").await;

    let status_uri = "/api/scans/status?workplace=eol-29&articleNumber=28042";
    assert_eq!(get(&app, status_uri, &clerk, tenant).await, StatusCode::FORBIDDEN);
    assert_eq!(get(&app, "/api/scans", &clerk, tenant).await, StatusCode::FORBIDDEN);
    assert_eq!(get(&app, "/api/exports/scans.csv", &clerk, tenant).await, StatusCode::FORBIDDEN);

    // past the gate: no such article is configured yet
    assert_eq!(get(&app, status_uri, &operator, tenant).await, StatusCode::NOT_FOUND);
    assert_eq!(get(&app, "/api/scans", &operator, tenant).await, StatusCode::OK);
}

#[sqlx::test(migrations = "./migrations")]
async fn members_of_another_plant_are_turned_away(pool: PgPool) {
    let tenant = plant(&pool).await;
    member(&pool, tenant, "operator@bruss.example", &["operator"]).await;
    let app = app(pool);

    let operator = login(&app, "operator@bruss.example").await;
    assert_eq!(get(&app, "/api/scans", &operator, Uuid::new_v4()).await, StatusCode::FORBIDDEN);
}
