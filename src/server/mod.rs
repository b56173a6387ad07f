// src/server/mod.rs

//! Server-side components.
//!
//! This module contains:
//! - `handlers`   → Axum HTTP handlers for the public license endpoints
//! - `admin`      → Administrative API for license lifecycle management
//! - `auth`       → Static admin-key check
//! - `api_error`  → Error → HTTP response mapping
//! - `routes`     → Router builder
//! - `logging`    → Request logging middleware + license event logging
//! - `validation` → Request field validation utilities

pub mod admin;
pub mod api_error;
pub mod auth;
pub mod handlers;
pub mod logging;
pub mod routes;
pub mod validation;

// Convenient re-exports so callers can do `aegis::server::X`
// instead of digging into submodules.

pub use admin::{
    add_license_handler, delete_license_handler, edit_max_uses_handler, extend_license_handler,
    list_licenses_handler, reset_license_handler, AddLicenseRequest, EditMaxUsesRequest,
    ExtendLicenseRequest, ListLicensesResponse, TargetLicenseRequest,
};
pub use api_error::{AdminError, AdminMessage, ValidateReject};
pub use auth::{require_admin, AdminKeyQuery, ADMIN_KEY_HEADER};
pub use handlers::{
    check_license_handler, increment_usage_handler, index_handler, license_info_handler, AppState,
    CheckLicenseRequest, LicenseInfoResponse, ValidateResponse,
};
pub use logging::{log_license_event, request_logging_middleware, LicenseEvent};
pub use routes::build_router;
pub use validation::{
    validate_device_id, validate_length, validate_not_empty, ValidationError, ValidationResult,
};
