//! The license table: authoritative mapping from device identifier to
//! license record.
//!
//! All state is volatile and lives in one mutex-guarded map owned by
//! [`LicenseTable`]. Every read-decide-write sequence runs under the lock via
//! [`LicenseTable::mutate`], so concurrent validations of the same device id
//! cannot double-activate or lose a counter increment. The lock is global;
//! critical sections are constant-time per record.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::errors::{LicenseError, LicenseResult};

/// Lower bound for `max_uses` on add and edit.
pub const MIN_MAX_USES: u32 = 1;

/// Upper bound for `max_uses` on add and edit.
pub const MAX_MAX_USES: u32 = 1000;

/// One license, bound to a single device identifier.
///
/// Timestamps are unix seconds; `0` is the documented sentinel for "not yet"
/// (see [`LicenseRecord::is_activated`]). `duration` is the length of the
/// validity window that starts at activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseRecord {
    /// Opaque hardware-bound identifier; unique key of the table.
    pub device_id: String,
    /// Human-readable assignment, informational only.
    pub owner_label: String,
    /// Validity window length in seconds, starting at activation.
    pub duration: i64,
    /// Usage ceiling.
    pub max_uses: u32,
    /// Unix timestamp of first successful validation; `0` = not yet activated.
    pub activated_at: i64,
    /// Unix timestamp of the most recent successful validation; `0` = never.
    pub last_used_at: i64,
    /// Number of successful validations so far.
    pub use_count: u32,
}

impl LicenseRecord {
    /// Build a fresh, unactivated record, validating the caller-supplied
    /// fields.
    pub fn new(
        device_id: impl Into<String>,
        owner_label: impl Into<String>,
        duration: i64,
        max_uses: u32,
    ) -> LicenseResult<Self> {
        let device_id = device_id.into();
        let owner_label = owner_label.into();

        if device_id.trim().is_empty() {
            return Err(LicenseError::InvalidArgument(
                "device id cannot be empty".to_string(),
            ));
        }
        if owner_label.trim().is_empty() {
            return Err(LicenseError::InvalidArgument(
                "owner label cannot be empty".to_string(),
            ));
        }
        if duration < 0 {
            return Err(LicenseError::InvalidArgument(
                "duration must be non-negative".to_string(),
            ));
        }
        if !(MIN_MAX_USES..=MAX_MAX_USES).contains(&max_uses) {
            return Err(LicenseError::InvalidArgument(format!(
                "max_uses must be between {MIN_MAX_USES} and {MAX_MAX_USES}"
            )));
        }

        Ok(Self {
            device_id,
            owner_label,
            duration,
            max_uses,
            activated_at: 0,
            last_used_at: 0,
            use_count: 0,
        })
    }

    /// Whether the license has completed its first successful validation.
    pub fn is_activated(&self) -> bool {
        self.activated_at != 0
    }

    /// End of the validity window. Meaningless while unactivated.
    pub fn expiration_time(&self) -> i64 {
        self.activated_at.saturating_add(self.duration)
    }

    /// Seconds of validity left at `now`, floored at zero.
    pub fn remaining_time(&self, now: i64) -> i64 {
        (self.expiration_time() - now).max(0)
    }

    /// Return the record to the unactivated state with counters zeroed.
    pub fn reset(&mut self) {
        self.activated_at = 0;
        self.last_used_at = 0;
        self.use_count = 0;
    }
}

/// Exclusive, consistent storage for [`LicenseRecord`]s.
///
/// The table is the only shared mutable state in the service. It is owned by
/// whoever constructs it (no ambient globals) and handed to the server via
/// `Arc`.
#[derive(Debug, Default)]
pub struct LicenseTable {
    records: Mutex<HashMap<String, LicenseRecord>>,
}

impl LicenseTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> LicenseResult<std::sync::MutexGuard<'_, HashMap<String, LicenseRecord>>> {
        self.records
            .lock()
            .map_err(|_| LicenseError::Internal("license table lock poisoned".to_string()))
    }

    /// Fetch a copy of the record for `device_id`, if any.
    pub fn get(&self, device_id: &str) -> LicenseResult<Option<LicenseRecord>> {
        Ok(self.lock()?.get(device_id).cloned())
    }

    /// Insert a fresh record, keyed by its own `device_id`.
    pub fn insert(&self, record: LicenseRecord) -> LicenseResult<()> {
        let mut records = self.lock()?;
        if records.contains_key(&record.device_id) {
            return Err(LicenseError::AlreadyExists);
        }
        records.insert(record.device_id.clone(), record);
        Ok(())
    }

    /// Remove the record for `device_id`.
    pub fn delete(&self, device_id: &str) -> LicenseResult<()> {
        match self.lock()?.remove(device_id) {
            Some(_) => Ok(()),
            None => Err(LicenseError::NotFound),
        }
    }

    /// Apply `f` to the record for `device_id` as a single critical section.
    ///
    /// This is the one mutation primitive: lookup, decision, and write all
    /// happen under the table lock, so two concurrent callers can never both
    /// observe the same pre-mutation state.
    pub fn mutate<T>(
        &self,
        device_id: &str,
        f: impl FnOnce(&mut LicenseRecord) -> T,
    ) -> LicenseResult<T> {
        let mut records = self.lock()?;
        match records.get_mut(device_id) {
            Some(record) => Ok(f(record)),
            None => Err(LicenseError::NotFound),
        }
    }

    /// Copy of every record, in no particular order.
    pub fn snapshot(&self) -> LicenseResult<Vec<LicenseRecord>> {
        Ok(self.lock()?.values().cloned().collect())
    }

    /// Number of records in the table.
    pub fn len(&self) -> LicenseResult<usize> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> LicenseResult<bool> {
        Ok(self.lock()?.is_empty())
    }
}
