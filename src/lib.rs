//! Aegis - a hardware-bound license validation service
//!
//! Clients present a device identifier; the service decides whether the
//! corresponding license is currently valid, records the usage, and returns
//! a tamper-evident verdict. An administrative API provisions, inspects,
//! resets, extends, and retires licenses.
//!
//! # Features
//!
//! - `server` - HTTP server components (handlers, routes, admin API).
//!   Enabled by default.
//!
//! The core modules (license table, validation engine, signing) have no
//! dependency on the HTTP stack and can be embedded directly:
//!
//! ```
//! use aegis::engine;
//! use aegis::table::{LicenseRecord, LicenseTable};
//!
//! let table = LicenseTable::new();
//! table
//!     .insert(LicenseRecord::new("4553BEC6D63967B1", "alice", 300, 10).unwrap())
//!     .unwrap();
//!
//! let verdict = engine::validate(&table, "4553BEC6D63967B1", 1_700_000_000).unwrap();
//! assert_eq!(verdict.message, engine::MSG_ACTIVATED);
//! ```

// Core modules (always available)
pub mod config;
pub mod engine;
pub mod errors;
pub mod signing;
pub mod table;

// Server-related modules (requires "server" feature)
#[cfg(feature = "server")]
#[path = "server/mod.rs"]
pub mod server;

pub use engine::{LicenseState, Validation};
pub use errors::{LicenseError, LicenseResult};
pub use table::{LicenseRecord, LicenseTable};
