//! Public endpoints: license validation, license info, service index.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::AegisConfig;
use crate::engine::{self, MSG_ACTIVATED};
use crate::errors::{LicenseError, LicenseResult};
use crate::server::api_error::ValidateReject;
use crate::server::logging::{log_license_event, LicenseEvent};
use crate::server::validation::validate_device_id;
use crate::signing;
use crate::table::{LicenseRecord, LicenseTable};

/// Shared application state for handlers.
///
/// The table is the only mutable piece; secrets and license defaults are
/// read-only copies taken from configuration at startup.
#[derive(Clone)]
pub struct AppState {
    pub table: Arc<LicenseTable>,
    pub signing_secret: String,
    pub admin_key: String,
    pub default_duration_secs: i64,
    pub default_max_uses: u32,
}

impl AppState {
    pub fn new(table: Arc<LicenseTable>, config: &AegisConfig) -> Self {
        Self {
            table,
            signing_secret: config.secrets.signing_secret.clone(),
            admin_key: config.secrets.admin_key.clone(),
            default_duration_secs: config.license.default_duration_secs,
            default_max_uses: config.license.default_max_uses,
        }
    }
}

/// Current wall-clock time in unix seconds.
pub fn now() -> i64 {
    Utc::now().timestamp()
}

/// Render a unix timestamp for humans, with `fallback` for the zero sentinel.
pub fn format_timestamp(ts: i64, fallback: &str) -> String {
    if ts <= 0 {
        return fallback.to_string();
    }
    match DateTime::<Utc>::from_timestamp(ts, 0) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => fallback.to_string(),
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Body of a validation request.
#[derive(Debug, Deserialize)]
pub struct CheckLicenseRequest {
    /// Hardware-bound device identifier.
    pub hwid: String,
}

/// A successful, signed validation verdict.
///
/// The signature covers every other field (see [`crate::signing`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub message: String,
    pub user_name: String,
    pub expiration_time: i64,
    pub remaining_time: i64,
    pub use_count: u32,
    pub max_uses: u32,
    pub signature: String,
}

/// Query parameters for the info endpoint.
#[derive(Debug, Deserialize)]
pub struct InfoQuery {
    pub hwid: Option<String>,
}

/// Full record view with derived human-readable fields.
#[derive(Debug, Serialize)]
pub struct LicenseInfoResponse {
    pub device_id: String,
    pub owner_label: String,
    pub duration: i64,
    pub max_uses: u32,
    pub activated_at: i64,
    pub last_used_at: i64,
    pub use_count: u32,
    pub status: String,
    pub expiration_time: i64,
    pub remaining_time: i64,
    pub activated_at_readable: String,
    pub last_used_at_readable: String,
    pub expires_at_readable: String,
}

impl LicenseInfoResponse {
    pub fn from_record(record: LicenseRecord, now: i64) -> Self {
        let status = engine::state_of(&record, now).as_str().to_string();
        let activated = record.is_activated();
        let expiration_time = record.expiration_time();
        Self {
            activated_at_readable: format_timestamp(record.activated_at, "Not activated"),
            last_used_at_readable: format_timestamp(record.last_used_at, "Never"),
            expires_at_readable: if activated {
                format_timestamp(expiration_time, "Not activated")
            } else {
                "Not activated".to_string()
            },
            remaining_time: if activated {
                record.remaining_time(now)
            } else {
                0
            },
            expiration_time,
            status,
            device_id: record.device_id,
            owner_label: record.owner_label,
            duration: record.duration,
            max_uses: record.max_uses,
            activated_at: record.activated_at,
            last_used_at: record.last_used_at,
            use_count: record.use_count,
        }
    }
}

/// Service index / health payload.
#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub message: String,
    pub version: String,
    pub status: String,
    pub endpoints: ServiceEndpoints,
}

#[derive(Debug, Serialize)]
pub struct ServiceEndpoints {
    pub check_license: String,
    pub license_info: String,
    pub admin_licenses: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// Service index: name, version, and the endpoint map.
pub async fn index_handler() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        message: "Aegis License Server".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "online".to_string(),
        endpoints: ServiceEndpoints {
            check_license: "/check_license".to_string(),
            license_info: "/get_license_info?hwid=YOUR_HWID".to_string(),
            admin_licenses: "/admin/licenses".to_string(),
        },
    })
}

/// Validate a license.
///
/// The decision, the first-activation stamp, and the usage increment all
/// happen in one critical section per device id. A success is answered with
/// the signed verdict payload; every rejection is side-effect-free and comes
/// back as `{"valid": false, "message"}` with 400 (malformed input) or 403
/// (invalid verdict).
pub async fn check_license_handler(
    State(state): State<AppState>,
    payload: Result<Json<CheckLicenseRequest>, JsonRejection>,
) -> Result<Json<ValidateResponse>, ValidateReject> {
    let Json(req) = payload.map_err(|rejection| {
        warn!("Malformed validation request: {rejection}");
        LicenseError::InvalidArgument("Invalid request".to_string())
    })?;
    validate_device_id(&req.hwid, "hwid").map_err(LicenseError::from)?;

    let verdict = engine::validate(&state.table, &req.hwid, now()).map_err(|err| {
        log_license_event(LicenseEvent::ValidationFailed, &req.hwid, Some(&err.to_string()));
        err
    })?;

    let event = if verdict.message == MSG_ACTIVATED {
        LicenseEvent::Activated
    } else {
        LicenseEvent::Validated
    };
    log_license_event(
        event,
        &req.hwid,
        Some(&format!("use {}/{}", verdict.use_count, verdict.max_uses)),
    );

    let mut response = ValidateResponse {
        valid: true,
        message: verdict.message.to_string(),
        user_name: verdict.user_name,
        expiration_time: verdict.expiration_time,
        remaining_time: verdict.remaining_time,
        use_count: verdict.use_count,
        max_uses: verdict.max_uses,
        signature: String::new(),
    };
    response.signature = signing::sign(&response, &state.signing_secret)?;

    Ok(Json(response))
}

/// Read-only license info for a device id, 404 if absent.
pub async fn license_info_handler(
    State(state): State<AppState>,
    Query(query): Query<InfoQuery>,
) -> Response {
    let record = match query.hwid.as_deref() {
        Some(hwid) => match state.table.get(hwid) {
            Ok(record) => record,
            Err(err) => return ValidateReject(err).into_response(),
        },
        None => None,
    };

    match record {
        Some(record) => Json(LicenseInfoResponse::from_record(record, now())).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "License not found" })),
        )
            .into_response(),
    }
}

/// Record one use without a validity check.
///
/// Bumps `use_count` and `last_used_at` unconditionally; 404 for unknown
/// ids. This is a bookkeeping hook, not a verdict — it never activates and
/// never checks the window or the ceiling.
pub async fn increment_usage_handler(
    State(state): State<AppState>,
    payload: Result<Json<CheckLicenseRequest>, JsonRejection>,
) -> Response {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(_) => {
            return ValidateReject(LicenseError::InvalidArgument(
                "Invalid request".to_string(),
            ))
            .into_response();
        }
    };

    let at = now();
    let result: LicenseResult<()> = state.table.mutate(&req.hwid, |record| {
        record.use_count = record.use_count.saturating_add(1);
        record.last_used_at = at;
    });

    match result {
        Ok(()) => {
            log_license_event(LicenseEvent::UsageRecorded, &req.hwid, None);
            Json(serde_json::json!({ "valid": true, "message": "Usage recorded" }))
                .into_response()
        }
        Err(LicenseError::NotFound) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "valid": false, "message": "License not found" })),
        )
            .into_response(),
        Err(err) => ValidateReject(err).into_response(),
    }
}
