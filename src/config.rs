// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::i18n::I18nStore,
    db::{
        ArticleRepository, CapaRepository, DeviationRepository, InventoryRepository, NewsRepository,
        OvertimeRepository, ProjectRepository, ScanRepository, TenantRepository, UserRepository,
    },
    services::{
        article_service::ArticleService,
        auth::AuthService,
        capa_service::CapaService,
        deviation_service::DeviationService,
        document_service::DocumentService,
        inventory_service::InventoryService,
        ldap::LdapAuthenticator,
        news_service::NewsService,
        overtime_service::OvertimeService,
        project_service::ProjectService,
        scan_service::ScanService,
        tenancy_service::TenantService,
        user_service::UserService,
    },
};

/// Directory settings; absent when the plant runs without LDAP.
#[derive(Debug, Clone)]
pub struct LdapConfig {
    pub url: String,
    /// Bind DN pattern, `{login}` is replaced by the part of the e-mail before `@`.
    pub bind_template: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub ldap: Option<LdapConfig>,
    pub fonts_dir: String,
    pub bootstrap_admin: Option<(String, String)>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET must be set")?;

        let jwt_ttl_hours = env::var("JWT_TTL_HOURS")
            .ok()
            .map(|v| v.parse::<i64>())
            .transpose()
            .context("JWT_TTL_HOURS must be a number")?
            .unwrap_or(168);

        let db_max_connections = env::var("DB_MAX_CONNECTIONS")
            .ok()
            .map(|v| v.parse::<u32>())
            .transpose()
            .context("DB_MAX_CONNECTIONS must be a number")?
            .unwrap_or(5);

        let ldap = match (env::var("LDAP_URL"), env::var("LDAP_BIND_TEMPLATE")) {
            (Ok(url), Ok(bind_template)) => Some(LdapConfig { url, bind_template }),
            (Ok(_), Err(_)) => anyhow::bail!("LDAP_URL is set but LDAP_BIND_TEMPLATE is missing"),
            _ => None,
        };

        let bootstrap_admin = match (
            env::var("BOOTSTRAP_ADMIN_EMAIL"),
            env::var("BOOTSTRAP_ADMIN_PASSWORD"),
        ) {
            (Ok(email), Ok(password)) => Some((email, password)),
            _ => None,
        };

        Ok(Self {
            database_url,
            jwt_secret,
            jwt_ttl_hours,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            db_max_connections,
            ldap,
            fonts_dir: env::var("FONTS_DIR").unwrap_or_else(|_| "./fonts".to_string()),
            bootstrap_admin,
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Arc<AppConfig>,
    pub i18n_store: Arc<I18nStore>,
    pub auth_service: AuthService,
    pub user_service: UserService,
    pub tenant_service: TenantService,
    pub article_service: ArticleService,
    pub scan_service: ScanService,
    pub deviation_service: DeviationService,
    pub capa_service: CapaService,
    pub news_service: NewsService,
    pub inventory_service: InventoryService,
    pub overtime_service: OvertimeService,
    pub project_service: ProjectService,
    pub document_service: DocumentService,
}

impl AppState {
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("failed to connect to the database")?;

        tracing::info!("database connection established");

        Self::with_pool(config, db_pool)
    }

    /// Wires the dependency graph over an existing pool.
    pub fn with_pool(config: AppConfig, db_pool: PgPool) -> anyhow::Result<Self> {
        let i18n_store = Arc::new(I18nStore::load()?);

        let user_repo = UserRepository::new(db_pool.clone());
        let tenant_repo = TenantRepository::new(db_pool.clone());
        let article_repo = ArticleRepository::new();
        let scan_repo = ScanRepository::new();
        let deviation_repo = DeviationRepository::new();

        let ldap = LdapAuthenticator::new(config.ldap.clone());
        let auth_service = AuthService::new(
            user_repo.clone(),
            ldap,
            config.jwt_secret.clone(),
            config.jwt_ttl_hours,
        );
        let user_service = UserService::new(user_repo, db_pool.clone());
        let tenant_service = TenantService::new(tenant_repo, db_pool.clone());
        let article_service = ArticleService::new(article_repo.clone());
        let scan_service = ScanService::new(scan_repo, article_repo);
        let deviation_service = DeviationService::new(deviation_repo.clone());
        let document_service = DocumentService::new(deviation_repo, config.fonts_dir.clone());

        Ok(Self {
            db_pool,
            config: Arc::new(config),
            i18n_store,
            auth_service,
            user_service,
            tenant_service,
            article_service,
            scan_service,
            deviation_service,
            capa_service: CapaService::new(CapaRepository::new()),
            news_service: NewsService::new(NewsRepository::new()),
            inventory_service: InventoryService::new(InventoryRepository::new()),
            overtime_service: OvertimeService::new(OvertimeRepository::new()),
            project_service: ProjectService::new(ProjectRepository::new()),
            document_service,
        })
    }
}
