// src/docs.rs

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::OpenApi;

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,

        // --- Users ---
        handlers::auth::get_me,
        handlers::auth::get_my_tenants,

        // --- Admin ---
        handlers::users::create_user,
        handlers::users::list_users,
        handlers::users::update_roles,
        handlers::users::reset_password,
        handlers::users::delete_user,

        // --- Tenancy ---
        handlers::tenancy::create_tenant,
        handlers::tenancy::list_members,
        handlers::tenancy::add_member,
        handlers::tenancy::remove_member,

        // --- Articles ---
        handlers::articles::create_article,
        handlers::articles::list_articles,
        handlers::articles::get_article,
        handlers::articles::update_article,
        handlers::articles::delete_article,

        // --- Scans ---
        handlers::scans::save_dmc,
        handlers::scans::save_hydra_batch,
        handlers::scans::count_box,
        handlers::scans::save_pallet_batch,
        handlers::scans::get_status,
        handlers::scans::pallet_label,
        handlers::scans::mark_rework,
        handlers::scans::search_scans,

        // --- Deviations ---
        handlers::deviations::create_deviation,
        handlers::deviations::submit_deviation,
        handlers::deviations::update_deviation,
        handlers::deviations::approve_deviation,
        handlers::deviations::delete_deviation,
        handlers::deviations::add_corrective_action,
        handlers::deviations::close_corrective_action,
        handlers::deviations::list_deviations,
        handlers::deviations::get_deviation,
        handlers::deviations::deviation_pdf,

        // --- CAPA ---
        handlers::capa::create_capa,
        handlers::capa::list_capa,
        handlers::capa::get_capa,
        handlers::capa::update_capa,
        handlers::capa::delete_capa,

        // --- News ---
        handlers::news::list_news,
        handlers::news::get_news,
        handlers::news::create_news,
        handlers::news::update_news,
        handlers::news::toggle_pin,
        handlers::news::delete_news,

        // --- Inventory ---
        handlers::inventory::create_card,
        handlers::inventory::list_cards,
        handlers::inventory::add_position,
        handlers::inventory::list_positions,
        handlers::inventory::update_position,
        handlers::inventory::approve_position,

        // --- Overtime ---
        handlers::overtime::submit_overtime,
        handlers::overtime::list_overtime,
        handlers::overtime::decide_overtime,
        handlers::overtime::mark_accounted,
        handlers::overtime::overtime_summary,

        // --- Projects ---
        handlers::projects::add_entry,
        handlers::projects::delete_entry,
        handlers::projects::my_entries,
        handlers::projects::project_summary,

        // --- Exports ---
        handlers::exports::export_scans,
        handlers::exports::export_deviations,
        handlers::exports::export_capa,
        handlers::exports::export_inventory,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::CredentialSource,
            models::auth::User,
            models::auth::LoginUserPayload,
            models::auth::CreateUserPayload,
            models::auth::UpdateRolesPayload,
            models::auth::ResetPasswordPayload,
            models::auth::AuthResponse,

            // --- Tenancy ---
            models::tenancy::Tenant,
            models::tenancy::TenantMember,
            models::tenancy::CreateTenantPayload,
            models::tenancy::AddMemberPayload,

            // --- Articles ---
            models::articles::DmcCheck,
            models::articles::DmcDateFormat,
            models::articles::DmcDateCheck,
            models::articles::ArticleConfig,
            models::articles::ArticleConfigPayload,

            // --- Scans ---
            models::scans::ScanStatus,
            models::scans::Scan,
            models::scans::ScanSnapshot,
            models::scans::ScanResult,
            models::scans::DmcScanPayload,
            models::scans::LabelScanPayload,
            models::scans::CountBoxPayload,
            models::scans::ReworkPayload,

            // --- Deviations ---
            models::deviations::DeviationStatus,
            models::deviations::DeviationArea,
            models::deviations::ApprovalRole,
            models::deviations::Approval,
            models::deviations::Approvals,
            models::deviations::ActionStatus,
            models::deviations::CorrectiveAction,
            models::deviations::Deviation,
            models::deviations::DeviationPayload,
            models::deviations::ApprovePayload,
            models::deviations::CorrectiveActionPayload,

            // --- CAPA ---
            models::capa::MachineCapacity,
            models::capa::EditStamp,
            models::capa::Capa,
            models::capa::CapaPayload,

            // --- News ---
            models::news::News,
            models::news::NewsPayload,

            // --- Inventory ---
            models::inventory::InventoryUnit,
            models::inventory::InventoryCard,
            models::inventory::InventoryCardSummary,
            models::inventory::InventoryPosition,
            models::inventory::CreateCardPayload,
            models::inventory::PositionPayload,

            // --- Overtime ---
            models::overtime::OvertimeStatus,
            models::overtime::OvertimeRequest,
            models::overtime::OvertimePayload,
            models::overtime::DecisionPayload,
            models::overtime::OvertimeSummaryRow,

            // --- Projects ---
            models::projects::ProjectTimeEntry,
            models::projects::ProjectTimePayload,
            models::projects::ProjectSummaryRow,
        )
    ),
    tags(
        (name = "Auth", description = "Login"),
        (name = "Users", description = "Current user and plants"),
        (name = "Admin", description = "User administration"),
        (name = "Tenancy", description = "Plants and membership"),
        (name = "Articles", description = "Scan configuration per workplace and article"),
        (name = "Scans", description = "DMC, HYDRA and pallet tracking"),
        (name = "Deviations", description = "Deviation approval workflow"),
        (name = "CAPA", description = "Capacity sheets"),
        (name = "News", description = "Postings"),
        (name = "Inventory", description = "Inventory cards and positions"),
        (name = "Overtime", description = "Overtime requests"),
        (name = "Projects", description = "Project time booking"),
        (name = "Exports", description = "CSV downloads")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme("api_jwt", SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)));
    }
}
