//! Error → HTTP response mapping for the two API surfaces.
//!
//! The validation endpoints and the administrative endpoints speak different
//! wire shapes, so each gets its own wrapper around [`LicenseError`]:
//!
//! - validation surface: `{"valid": false, "message": "..."}`
//!   (400 malformed, 403 invalid verdicts, 500 internal)
//! - admin surface: `{"message": "..."}`
//!   (400 bad input, 403 unauthorized, 404 unknown id, 500 internal)
//!
//! Every rejection is request-scoped; nothing here terminates the process.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::errors::LicenseError;

/// Rejection body for the validation surface.
#[derive(Debug, Serialize)]
struct ValidateRejectBody {
    valid: bool,
    message: String,
}

/// The message a client may see for `err`. Internal details stay server-side.
fn client_message(err: &LicenseError) -> String {
    match err {
        LicenseError::Config(_) | LicenseError::Internal(_) => "Server error".to_string(),
        other => other.to_string(),
    }
}

/// A failed validation outcome, rendered in the validation wire shape.
#[derive(Debug)]
pub struct ValidateReject(pub LicenseError);

impl ValidateReject {
    fn status_code(&self) -> StatusCode {
        match self.0 {
            LicenseError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            LicenseError::NotFound
            | LicenseError::Exhausted
            | LicenseError::ExpiredByTime
            | LicenseError::Unauthorized => StatusCode::FORBIDDEN,
            LicenseError::AlreadyExists => StatusCode::BAD_REQUEST,
            LicenseError::Config(_) | LicenseError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<LicenseError> for ValidateReject {
    fn from(err: LicenseError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ValidateReject {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ValidateRejectBody {
            valid: false,
            message: client_message(&self.0),
        };
        (status, Json(body)).into_response()
    }
}

/// Message body shared by all administrative responses.
#[derive(Debug, Serialize)]
pub struct AdminMessage {
    pub message: String,
}

impl AdminMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A failed administrative operation, rendered in the admin wire shape.
#[derive(Debug)]
pub struct AdminError(pub LicenseError);

impl AdminError {
    fn status_code(&self) -> StatusCode {
        match self.0 {
            LicenseError::NotFound => StatusCode::NOT_FOUND,
            LicenseError::AlreadyExists | LicenseError::InvalidArgument(_) => {
                StatusCode::BAD_REQUEST
            }
            LicenseError::Unauthorized => StatusCode::FORBIDDEN,
            LicenseError::Exhausted | LicenseError::ExpiredByTime => StatusCode::BAD_REQUEST,
            LicenseError::Config(_) | LicenseError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<LicenseError> for AdminError {
    fn from(err: LicenseError) -> Self {
        Self(err)
    }
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(AdminMessage::new(client_message(&self.0)))).into_response()
    }
}
