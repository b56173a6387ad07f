use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::server::admin::{
    add_license_handler, delete_license_handler, edit_max_uses_handler, extend_license_handler,
    list_licenses_handler, reset_license_handler,
};
use crate::server::handlers::{
    check_license_handler, increment_usage_handler, index_handler, license_info_handler, AppState,
};
use crate::server::logging::request_logging_middleware;

/// Build the application router.
///
/// # Routes
///
/// ## Public endpoints
/// - `GET /` - Service info / health probe
/// - `POST /check_license` - Validate a license, signed verdict on success
/// - `GET /get_license_info` - Full record for a device id
/// - `POST /increment_usage` - Record one use without a validity check
///
/// ## Admin endpoints (shared admin key required)
/// - `POST /admin/add_license` - Provision a license
/// - `POST /admin/reset_license` - Return a license to unactivated
/// - `POST /admin/extend_license` - Lengthen the validity window
/// - `POST /admin/delete_license` - Remove a license
/// - `POST /admin/edit_max_uses` - Overwrite the usage ceiling
/// - `GET /admin/licenses` - List all records
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Public endpoints
        .route("/", get(index_handler))
        .route("/check_license", post(check_license_handler))
        .route("/get_license_info", get(license_info_handler))
        .route("/increment_usage", post(increment_usage_handler))
        // Admin endpoints
        .route("/admin/add_license", post(add_license_handler))
        .route("/admin/reset_license", post(reset_license_handler))
        .route("/admin/extend_license", post(extend_license_handler))
        .route("/admin/delete_license", post(delete_license_handler))
        .route("/admin/edit_max_uses", post(edit_max_uses_handler))
        .route("/admin/licenses", get(list_licenses_handler))
        .layer(middleware::from_fn(request_logging_middleware))
        .with_state(state)
}
