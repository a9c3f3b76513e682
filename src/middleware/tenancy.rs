// src/middleware/tenancy.rs

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use uuid::Uuid;

use crate::common::error::AppError;

const TENANT_ID_HEADER: &str = "x-tenant-id";

/// The plant the request works on.
#[derive(Debug, Clone, Copy)]
pub struct TenantContext(pub Uuid);

impl TenantContext {
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, AppError> {
        let value = headers.get(TENANT_ID_HEADER).ok_or(AppError::TenantMissing)?;
        let value_str = value.to_str().map_err(|_| AppError::TenantInvalid)?;
        let tenant_id = Uuid::parse_str(value_str.trim()).map_err(|_| AppError::TenantInvalid)?;
        Ok(TenantContext(tenant_id))
    }
}

impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Checked by tenant_guard already; fall back to the raw header.
        if let Some(ctx) = parts.extensions.get::<TenantContext>() {
            return Ok(*ctx);
        }
        TenantContext::from_headers(&parts.headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn missing_header_is_rejected() {
        let headers = HeaderMap::new();
        assert!(matches!(TenantContext::from_headers(&headers), Err(AppError::TenantMissing)));
    }

    #[test]
    fn non_uuid_header_is_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(TENANT_ID_HEADER, HeaderValue::from_static("plant-1"));
        assert!(matches!(TenantContext::from_headers(&headers), Err(AppError::TenantInvalid)));
    }

    #[test]
    fn uuid_header_is_accepted() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(TENANT_ID_HEADER, HeaderValue::from_str(&id.to_string()).unwrap());
        assert_eq!(TenantContext::from_headers(&headers).unwrap().0, id);
    }
}
