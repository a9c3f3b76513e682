pub mod article_service;
pub mod auth;
pub mod capa_service;
pub mod deviation_service;
pub mod document_service;
pub mod export;
pub mod inventory_service;
pub mod ldap;
pub mod news_service;
pub mod overtime_service;
pub mod project_service;
pub mod scan_rules;
pub mod scan_service;
pub mod tenancy_service;
pub mod user_service;
