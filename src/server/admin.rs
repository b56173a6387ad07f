//! Administrative endpoints for license management.
//!
//! Every operation requires the shared admin key (see
//! [`crate::server::auth`]) and answers `{"message": string}` — 200 on
//! success, 400/404 on the respective input errors, 403 when the credential
//! is missing or wrong.
//!
//! # Endpoints
//!
//! - `POST /admin/add_license` - Provision a fresh, unactivated license
//! - `POST /admin/reset_license` - Return a license to the unactivated state
//! - `POST /admin/extend_license` - Lengthen the validity window
//! - `POST /admin/delete_license` - Remove a license
//! - `POST /admin/edit_max_uses` - Overwrite the usage ceiling
//! - `GET  /admin/licenses` - List every record with derived fields

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::engine::LicenseState;
use crate::errors::LicenseError;
use crate::server::api_error::{AdminError, AdminMessage};
use crate::server::auth::{require_admin, AdminKeyQuery};
use crate::server::handlers::{now, AppState, LicenseInfoResponse};
use crate::server::logging::{log_license_event, LicenseEvent};
use crate::server::validation::{
    validate_device_id, validate_length, validate_not_empty, MAX_FIELD_LENGTH,
};
use crate::table::{LicenseRecord, MAX_MAX_USES, MIN_MAX_USES};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for provisioning a license.
#[derive(Debug, Deserialize)]
pub struct AddLicenseRequest {
    /// Device identifier the license binds to
    pub hwid: String,
    /// Human-readable owner label
    pub username: String,
    /// Validity window in seconds; config default when omitted
    pub duration: Option<i64>,
    /// Usage ceiling; config default when omitted
    pub max_uses: Option<u32>,
}

/// Request body for operations addressing one license.
#[derive(Debug, Deserialize)]
pub struct TargetLicenseRequest {
    pub hwid: String,
}

/// Request body for extending a license.
#[derive(Debug, Deserialize)]
pub struct ExtendLicenseRequest {
    pub hwid: String,
    /// Minutes to add to the validity window
    pub minutes: i64,
}

/// Request body for editing the usage ceiling.
#[derive(Debug, Deserialize)]
pub struct EditMaxUsesRequest {
    pub hwid: String,
    pub max_uses: u32,
}

/// Response for the license listing.
#[derive(Debug, Serialize)]
pub struct ListLicensesResponse {
    pub total: usize,
    pub active: usize,
    pub expired: usize,
    pub licenses: Vec<LicenseInfoResponse>,
}

// ============================================================================
// Helpers
// ============================================================================

/// Unwrap a JSON body, mapping extraction failures to a 400 in the admin
/// wire shape.
fn require_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AdminError> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        AdminError(LicenseError::InvalidArgument(format!(
            "Invalid request body: {rejection}"
        )))
    })
}

// ============================================================================
// Handlers
// ============================================================================

/// Provision a fresh, unactivated license.
pub async fn add_license_handler(
    State(state): State<AppState>,
    Query(query): Query<AdminKeyQuery>,
    headers: HeaderMap,
    payload: Result<Json<AddLicenseRequest>, JsonRejection>,
) -> Result<Json<AdminMessage>, AdminError> {
    require_admin(&state, &query, &headers)?;
    let req = require_body(payload)?;

    validate_device_id(&req.hwid, "hwid").map_err(LicenseError::from)?;
    validate_not_empty(&req.username, "username").map_err(LicenseError::from)?;
    validate_length(&req.username, 1, MAX_FIELD_LENGTH, "username").map_err(LicenseError::from)?;

    let duration = req.duration.unwrap_or(state.default_duration_secs);
    let max_uses = req.max_uses.unwrap_or(state.default_max_uses);

    let record = LicenseRecord::new(req.hwid.clone(), req.username, duration, max_uses)?;
    state.table.insert(record)?;

    log_license_event(
        LicenseEvent::Created,
        &req.hwid,
        Some(&format!("duration={duration}s max_uses={max_uses}")),
    );
    Ok(Json(AdminMessage::new(format!(
        "License for {} added",
        req.hwid
    ))))
}

/// Return a license to the unactivated state with counters zeroed.
///
/// The next successful validation re-activates it with a fresh timestamp.
pub async fn reset_license_handler(
    State(state): State<AppState>,
    Query(query): Query<AdminKeyQuery>,
    headers: HeaderMap,
    payload: Result<Json<TargetLicenseRequest>, JsonRejection>,
) -> Result<Json<AdminMessage>, AdminError> {
    require_admin(&state, &query, &headers)?;
    let req = require_body(payload)?;

    state.table.mutate(&req.hwid, |record| record.reset())?;

    log_license_event(LicenseEvent::Reset, &req.hwid, None);
    Ok(Json(AdminMessage::new(format!(
        "License for {} reset",
        req.hwid
    ))))
}

/// Lengthen the validity window by `minutes`.
///
/// `activated_at` is untouched, so the effective window end moves forward
/// even for an already-running license.
pub async fn extend_license_handler(
    State(state): State<AppState>,
    Query(query): Query<AdminKeyQuery>,
    headers: HeaderMap,
    payload: Result<Json<ExtendLicenseRequest>, JsonRejection>,
) -> Result<Json<AdminMessage>, AdminError> {
    require_admin(&state, &query, &headers)?;
    let req = require_body(payload)?;

    if req.minutes < 1 {
        return Err(AdminError(LicenseError::InvalidArgument(
            "minutes must be at least 1".to_string(),
        )));
    }

    state.table.mutate(&req.hwid, |record| {
        record.duration = record.duration.saturating_add(req.minutes.saturating_mul(60));
    })?;

    log_license_event(
        LicenseEvent::Extended,
        &req.hwid,
        Some(&format!("{} minutes", req.minutes)),
    );
    Ok(Json(AdminMessage::new(format!(
        "License for {} extended by {} minutes",
        req.hwid, req.minutes
    ))))
}

/// Remove a license. Expired records are never collected automatically;
/// this is the only way a record leaves the table.
pub async fn delete_license_handler(
    State(state): State<AppState>,
    Query(query): Query<AdminKeyQuery>,
    headers: HeaderMap,
    payload: Result<Json<TargetLicenseRequest>, JsonRejection>,
) -> Result<Json<AdminMessage>, AdminError> {
    require_admin(&state, &query, &headers)?;
    let req = require_body(payload)?;

    state.table.delete(&req.hwid)?;

    log_license_event(LicenseEvent::Deleted, &req.hwid, None);
    Ok(Json(AdminMessage::new(format!(
        "License for {} deleted",
        req.hwid
    ))))
}

/// Overwrite the usage ceiling.
///
/// Lowering it below the current `use_count` leaves the record immediately
/// exhausted; the counter is never rolled back.
pub async fn edit_max_uses_handler(
    State(state): State<AppState>,
    Query(query): Query<AdminKeyQuery>,
    headers: HeaderMap,
    payload: Result<Json<EditMaxUsesRequest>, JsonRejection>,
) -> Result<Json<AdminMessage>, AdminError> {
    require_admin(&state, &query, &headers)?;
    let req = require_body(payload)?;

    if !(MIN_MAX_USES..=MAX_MAX_USES).contains(&req.max_uses) {
        return Err(AdminError(LicenseError::InvalidArgument(format!(
            "max_uses must be between {MIN_MAX_USES} and {MAX_MAX_USES}"
        ))));
    }

    state
        .table
        .mutate(&req.hwid, |record| record.max_uses = req.max_uses)?;

    log_license_event(
        LicenseEvent::LimitChanged,
        &req.hwid,
        Some(&format!("max_uses={}", req.max_uses)),
    );
    Ok(Json(AdminMessage::new(format!(
        "Max uses for {} changed to {}",
        req.hwid, req.max_uses
    ))))
}

/// List every record with the derived fields plus aggregate counts.
pub async fn list_licenses_handler(
    State(state): State<AppState>,
    Query(query): Query<AdminKeyQuery>,
    headers: HeaderMap,
) -> Result<Json<ListLicensesResponse>, AdminError> {
    require_admin(&state, &query, &headers)?;

    let at = now();
    let mut records = state.table.snapshot()?;
    records.sort_by(|a, b| a.device_id.cmp(&b.device_id));

    let mut active = 0usize;
    let licenses: Vec<LicenseInfoResponse> = records
        .into_iter()
        .map(|record| {
            let view = LicenseInfoResponse::from_record(record, at);
            if view.status == LicenseState::Active.as_str() {
                active += 1;
            }
            view
        })
        .collect();

    let total = licenses.len();
    info!(total, active, "Listing licenses");

    Ok(Json(ListLicensesResponse {
        total,
        active,
        expired: total - active,
        licenses,
    }))
}
