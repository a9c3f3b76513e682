// src/middleware/rbac.rs

use std::marker::PhantomData;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::auth::roles,
};

/// A role gate: the user passes holding any of `roles()` (or `admin`).
pub trait RoleDef: Send + Sync + 'static {
    fn roles() -> &'static [&'static str];
}

/// Guard extractor, rejects with 403 when the role is missing.
pub struct RequireRole<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let locale = Locale::from_headers(&parts.headers);

        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .ok_or(AppError::InvalidToken)
            .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

        if !user.0.has_any_role(T::roles()) {
            let required = T::roles().join(" | ");
            return Err(AppError::Forbidden(required).to_api_error(&locale, &app_state.i18n_store));
        }

        Ok(RequireRole(PhantomData))
    }
}

macro_rules! role_gate {
    ($name:ident => [$($role:expr),+ $(,)?]) => {
        pub struct $name;
        impl RoleDef for $name {
            fn roles() -> &'static [&'static str] {
                &[$($role),+]
            }
        }
    };
}

// ---
// ROLE GATES
// ---

role_gate!(RoleAdmin => [roles::ADMIN]);
role_gate!(RoleOperator => [roles::OPERATOR]);
role_gate!(RoleRework => [roles::REWORK, roles::QUALITY]);
role_gate!(RoleArticleConfig => [roles::QUALITY]);
role_gate!(RoleGroupLeader => [roles::GROUP_LEADER]);
role_gate!(RoleProductionManager => [roles::PRODUCTION_MANAGER]);
role_gate!(RoleHr => [roles::HR]);
role_gate!(RoleInventory => [roles::INVENTORY, roles::INVENTORY_APPROVER]);
role_gate!(RoleInventoryApprover => [roles::INVENTORY_APPROVER]);
role_gate!(RoleNewsEditor => [roles::NEWS_EDITOR]);
role_gate!(RoleCapaEditor => [roles::CAPA_EDITOR]);
role_gate!(RoleOvertimeReader => [roles::GROUP_LEADER, roles::PRODUCTION_MANAGER, roles::HR]);
