//! The validation engine: pure decision logic over one license record.
//!
//! A record is in exactly one of four states at any instant. `Active` is the
//! only state from which a successful validation can occur; a success
//! stamps the first-activation timestamp (once) and advances the usage
//! counter. All rejections are side-effect-free.
//!
//! The expiry boundary is inclusive: a check at exactly
//! `activated_at + duration` still succeeds, one second later it is
//! `ExpiredByTime`. A `duration` of 0 is therefore valid only at the
//! activation instant, while the usage ceiling applies independently of time.

use crate::errors::{LicenseError, LicenseResult};
use crate::table::{LicenseRecord, LicenseTable};

/// Message returned on the activating validation.
pub const MSG_ACTIVATED: &str = "License activated";

/// Message returned on every subsequent successful validation.
pub const MSG_VALID: &str = "License valid";

/// The state of a license record at a given instant.
///
/// Exhaustion takes precedence over everything but existence, and time
/// expiry over activation, matching the order of checks in [`validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LicenseState {
    /// Never validated; `activated_at` is still the zero sentinel.
    Unactivated,
    /// Activated, inside the validity window, uses remaining.
    Active,
    /// The validity window has elapsed.
    ExpiredByTime,
    /// The usage ceiling has been reached, regardless of time.
    ExhaustedByUses,
}

impl LicenseState {
    /// Stable lowercase label, used by the admin listing.
    pub fn as_str(&self) -> &'static str {
        match self {
            LicenseState::Unactivated => "unactivated",
            LicenseState::Active => "active",
            LicenseState::ExpiredByTime => "expired",
            LicenseState::ExhaustedByUses => "exhausted",
        }
    }
}

impl std::fmt::Display for LicenseState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a record without touching it.
pub fn state_of(record: &LicenseRecord, now: i64) -> LicenseState {
    if record.use_count >= record.max_uses {
        LicenseState::ExhaustedByUses
    } else if !record.is_activated() {
        LicenseState::Unactivated
    } else if now > record.expiration_time() {
        LicenseState::ExpiredByTime
    } else {
        LicenseState::Active
    }
}

/// The data of a successful validation, before signing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    pub message: &'static str,
    pub user_name: String,
    pub expiration_time: i64,
    pub remaining_time: i64,
    pub use_count: u32,
    pub max_uses: u32,
}

/// Decide validity for the record of `device_id` at `now`, applying the side
/// effects of a success in the same critical section.
///
/// Decision order:
/// 1. unknown id → `NotFound`, no side effect;
/// 2. `use_count >= max_uses` → `Exhausted`, no side effect — checked before
///    the activation check so an already-exhausted license never silently
///    re-activates;
/// 3. unactivated → first activation: `activated_at = now`;
/// 4. `now > activated_at + duration` → `ExpiredByTime`, no side effect;
/// 5. success (including the activating call): `use_count += 1`,
///    `last_used_at = now`.
///
/// The activation stamp and the counter increment are one
/// successful-validation event: the activating call returns with
/// `use_count == 1`.
pub fn validate(table: &LicenseTable, device_id: &str, now: i64) -> LicenseResult<Validation> {
    table.mutate(device_id, |record| apply(record, now))?
}

/// The state-transition rules of [`validate`], applied to a record already
/// held under the table lock.
fn apply(record: &mut LicenseRecord, now: i64) -> LicenseResult<Validation> {
    if record.use_count >= record.max_uses {
        return Err(LicenseError::Exhausted);
    }

    let activating = !record.is_activated();
    if activating {
        record.activated_at = now;
    } else if now > record.expiration_time() {
        return Err(LicenseError::ExpiredByTime);
    }

    record.use_count += 1;
    record.last_used_at = now;

    let expiration_time = record.expiration_time();
    Ok(Validation {
        message: if activating { MSG_ACTIVATED } else { MSG_VALID },
        user_name: record.owner_label.clone(),
        expiration_time,
        remaining_time: record.remaining_time(now),
        use_count: record.use_count,
        max_uses: record.max_uses,
    })
}
