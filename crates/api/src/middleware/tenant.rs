//! Tenant identity forwarded by the upstream auth layer.
//!
//! Authentication happens before requests reach this service. The auth layer
//! forwards the resolved tenant in `X-Tenant-Id` and the caller's role in
//! `X-Tenant-Role`; every handler is scoped by the tenant taken from here.

use axum::{extract::FromRequestParts, http::request::Parts};
use tally_shared::AppError;
use tally_shared::types::TenantId;

use crate::error::ApiError;

/// Header carrying the tenant id.
pub const TENANT_HEADER: &str = "x-tenant-id";

/// Header carrying the caller's role within the tenant.
pub const ROLE_HEADER: &str = "x-tenant-role";

const ADMIN_ROLE: &str = "admin";

/// Extractor for the calling tenant.
///
/// ```ignore
/// async fn handler(tenant: Tenant) -> impl IntoResponse {
///     let tenant_id = tenant.id();
///     // ...
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tenant {
    id: TenantId,
    role: Option<String>,
}

impl Tenant {
    /// Returns the tenant id.
    #[must_use]
    pub const fn id(&self) -> TenantId {
        self.id
    }

    /// Returns the caller's role, if forwarded.
    #[must_use]
    pub fn role(&self) -> Option<&str> {
        self.role.as_deref()
    }

    /// Fails with `FORBIDDEN` unless the caller is a tenant admin.
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self
            .role()
            .is_some_and(|role| role.eq_ignore_ascii_case(ADMIN_ROLE))
        {
            Ok(())
        } else {
            Err(AppError::Forbidden("tenant admin role required".into()).into())
        }
    }
}

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

impl<S> FromRequestParts<S> for Tenant
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = header(parts, TENANT_HEADER)
            .ok_or_else(|| AppError::MissingTenant(format!("{TENANT_HEADER} header is required")))?;
        let id = raw
            .parse::<TenantId>()
            .map_err(|_| AppError::MissingTenant(format!("{TENANT_HEADER} is not a valid id")))?;

        Ok(Self {
            id,
            role: header(parts, ROLE_HEADER).map(str::to_string),
        })
    }
}
