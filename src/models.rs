pub mod articles;
pub mod auth;
pub mod capa;
pub mod deviations;
pub mod inventory;
pub mod news;
pub mod overtime;
pub mod projects;
pub mod scans;
pub mod tenancy;
