//! Shared-secret integrity tags for validation responses.
//!
//! The tag is `hex(sha256(canonical_json(payload) || secret))`, where the
//! canonical form serializes the payload's fields as a JSON object with
//! lexicographically ordered keys and no insignificant whitespace, with any
//! `signature` field removed first. Sender and verifier therefore agree
//! byte-for-byte on the signed input.
//!
//! This is a symmetric integrity tag, not a public-key signature: anyone
//! holding the shared secret can both verify and forge it. Key management
//! beyond the single shared secret is out of scope.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::errors::{LicenseError, LicenseResult};

/// Name of the field carrying the tag itself, excluded from signing.
pub const SIGNATURE_FIELD: &str = "signature";

/// Canonical serialization of `payload`: a JSON object, keys sorted,
/// `signature` stripped.
///
/// Relies on `serde_json`'s default map representation (a B-tree) for the
/// lexicographic key order.
pub fn canonical_payload<T: Serialize>(payload: &T) -> LicenseResult<String> {
    let mut value = serde_json::to_value(payload)
        .map_err(|e| LicenseError::Internal(format!("payload serialization failed: {e}")))?;

    match value {
        Value::Object(ref mut map) => {
            map.remove(SIGNATURE_FIELD);
        }
        _ => {
            return Err(LicenseError::Internal(
                "signable payload must be a JSON object".to_string(),
            ));
        }
    }

    serde_json::to_string(&value)
        .map_err(|e| LicenseError::Internal(format!("payload serialization failed: {e}")))
}

/// Compute the hex-encoded integrity tag for `payload` under `secret`.
pub fn sign<T: Serialize>(payload: &T, secret: &str) -> LicenseResult<String> {
    let canonical = canonical_payload(payload)?;

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hasher.update(secret.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Recompute the tag for `payload` and compare against `signature`.
pub fn verify<T: Serialize>(payload: &T, secret: &str, signature: &str) -> LicenseResult<bool> {
    Ok(sign(payload, secret)? == signature)
}
