//! Request logging middleware and license event logging.
//!
//! Every request gets a unique id, a tracing span, and timing; the id is
//! echoed back in the `X-Request-Id` response header. License state changes
//! go through [`log_license_event`] so the audit trail has one shape.

use axum::{
    body::Body,
    extract::Request,
    http::{HeaderValue, Response},
    middleware::Next,
};
use std::time::Instant;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

/// License state change event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LicenseEvent {
    /// License was provisioned by an administrator
    Created,
    /// License completed its first successful validation
    Activated,
    /// License was validated successfully
    Validated,
    /// License validation failed
    ValidationFailed,
    /// License was returned to the unactivated state
    Reset,
    /// License validity window was extended
    Extended,
    /// License was removed
    Deleted,
    /// License usage ceiling was edited
    LimitChanged,
    /// Usage was recorded without a validity check
    UsageRecorded,
}

impl std::fmt::Display for LicenseEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LicenseEvent::Created => "created",
            LicenseEvent::Activated => "activated",
            LicenseEvent::Validated => "validated",
            LicenseEvent::ValidationFailed => "validation_failed",
            LicenseEvent::Reset => "reset",
            LicenseEvent::Extended => "extended",
            LicenseEvent::Deleted => "deleted",
            LicenseEvent::LimitChanged => "limit_changed",
            LicenseEvent::UsageRecorded => "usage_recorded",
        };
        write!(f, "{}", s)
    }
}

/// Log a license state change event.
///
/// Validation failures log at `warn`, everything else at `info`.
pub fn log_license_event(event: LicenseEvent, device_id: &str, details: Option<&str>) {
    let span = info_span!(
        "license_event",
        event = %event,
        device_id = %device_id,
    );
    let _enter = span.enter();

    match event {
        LicenseEvent::ValidationFailed => {
            if let Some(d) = details {
                warn!(reason = %d, "License event occurred");
            } else {
                warn!("License event occurred");
            }
        }
        _ => {
            if let Some(d) = details {
                info!(details = %d, "License event occurred");
            } else {
                info!("License event occurred");
            }
        }
    }
}

/// Header name for the request ID.
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Generate a new unique request ID.
pub fn generate_request_id() -> String {
    Uuid::new_v4().to_string()
}

/// Logging middleware that tracks request timing and generates request IDs.
pub async fn request_logging_middleware(request: Request, next: Next) -> Response<Body> {
    let request_id = generate_request_id();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let span = info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        path = %path,
    );

    let start = Instant::now();

    let response = async move {
        info!("Started processing request");
        next.run(request).await
    }
    .instrument(span.clone())
    .await;

    let duration = start.elapsed();
    let status = response.status();

    let _enter = span.enter();
    info!(
        status = %status.as_u16(),
        duration_ms = %duration.as_millis(),
        "Request completed"
    );

    let (mut parts, body) = response.into_parts();
    if let Ok(header_value) = HeaderValue::from_str(&request_id) {
        parts.headers.insert(REQUEST_ID_HEADER, header_value);
    }

    Response::from_parts(parts, body)
}
