//! Static admin-key authentication for the administrative API.
//!
//! The credential is a single shared secret supplied via configuration
//! (`AEGIS_ADMIN_KEY`). Callers present it either as a `?key=` query
//! parameter or an `X-Admin-Key` header; it is compared by exact match.
//! There are no scopes, tokens, or sessions.

use axum::http::HeaderMap;
use serde::Deserialize;

use crate::errors::{LicenseError, LicenseResult};
use crate::server::handlers::AppState;

/// Header carrying the admin credential.
pub const ADMIN_KEY_HEADER: &str = "x-admin-key";

/// Query parameters recognized by every admin endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct AdminKeyQuery {
    /// The admin credential, `?key=...`
    pub key: Option<String>,
}

/// Check the admin credential on a request, query parameter first, then
/// header. Missing or mismatched → `Unauthorized`.
pub fn require_admin(
    state: &AppState,
    query: &AdminKeyQuery,
    headers: &HeaderMap,
) -> LicenseResult<()> {
    let supplied = query
        .key
        .as_deref()
        .or_else(|| headers.get(ADMIN_KEY_HEADER).and_then(|v| v.to_str().ok()));

    match supplied {
        Some(key) if key == state.admin_key => Ok(()),
        _ => Err(LicenseError::Unauthorized),
    }
}
