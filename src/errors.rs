//! Error taxonomy for the license service.
//!
//! Every variant is a recoverable, request-scoped outcome. Rejections on the
//! validation path (`NotFound`, `Exhausted`, `ExpiredByTime`) leave the
//! license table untouched.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LicenseError {
    /// Unknown device identifier.
    #[error("License not found")]
    NotFound,

    /// Attempt to add a license for an id that already has one.
    #[error("License already exists")]
    AlreadyExists,

    /// Usage ceiling reached. Checked before everything but lookup, so an
    /// exhausted license never silently re-activates.
    #[error("Usage limit exceeded")]
    Exhausted,

    /// Validity window elapsed (`now > activated_at + duration`).
    #[error("License has expired")]
    ExpiredByTime,

    /// Malformed request body or out-of-range administrative value.
    #[error("{0}")]
    InvalidArgument(String),

    /// Bad or missing administrative credential.
    #[error("unauthorized")]
    Unauthorized,

    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// Unexpected internal failure (lock poisoning, serialization). Surfaced
    /// at the boundary as a generic server error, never a crash.
    #[error("internal error: {0}")]
    Internal(String),
}

pub type LicenseResult<T> = Result<T, LicenseError>;
