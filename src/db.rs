// src/db.rs

pub mod article_repo;
pub mod capa_repo;
pub mod deviation_repo;
pub mod inventory_repo;
pub mod news_repo;
pub mod overtime_repo;
pub mod project_repo;
pub mod scan_repo;
pub mod tenancy_repo;
pub mod user_repo;

pub use article_repo::ArticleRepository;
pub use capa_repo::CapaRepository;
pub use deviation_repo::DeviationRepository;
pub use inventory_repo::InventoryRepository;
pub use news_repo::NewsRepository;
pub use overtime_repo::OvertimeRepository;
pub use project_repo::ProjectRepository;
pub use scan_repo::ScanRepository;
pub use tenancy_repo::TenantRepository;
pub use user_repo::UserRepository;
