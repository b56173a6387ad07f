//! Configuration for the license service.
//!
//! Configuration is loaded from multiple sources with the following
//! precedence:
//! 1. Environment variables (highest priority)
//! 2. `config.toml` file
//! 3. Default values (lowest priority)
//!
//! # Environment Variables
//!
//! - `AEGIS_SERVER_HOST` - Server bind address
//! - `AEGIS_SERVER_PORT` - Server port
//! - `AEGIS_SIGNING_SECRET` - Shared secret for response integrity tags
//! - `AEGIS_ADMIN_KEY` - Shared administrative credential
//! - `AEGIS_DEFAULT_DURATION_SECS` - Default validity window for new licenses
//! - `AEGIS_DEFAULT_MAX_USES` - Default usage ceiling for new licenses
//! - `AEGIS_LOGGING_ENABLED` - Enable request/event logging
//! - `AEGIS_LOG_LEVEL` - Log level (trace, debug, info, warn, error)
//!
//! Both secrets are required and have no defaults: they are deployment
//! configuration, never source code.

use config::Config;
use serde::Deserialize;
use std::env;
use std::sync::OnceLock;

use crate::errors::{LicenseError, LicenseResult};
use crate::table::{MAX_MAX_USES, MIN_MAX_USES};

/// Global configuration singleton.
static CONFIG: OnceLock<AegisConfig> = OnceLock::new();

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AegisConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Shared secrets (signing + admin)
    pub secrets: SecretsConfig,
    /// Defaults applied when an add request omits fields
    pub license: LicenseDefaultsConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Shared secrets. No defaults; supplied via environment or config file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SecretsConfig {
    /// Secret keying the response integrity tag
    pub signing_secret: String,
    /// Administrative credential, compared by exact match
    pub admin_key: String,
}

/// Defaults for newly added licenses.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LicenseDefaultsConfig {
    /// Validity window in seconds when an add request omits `duration`
    pub default_duration_secs: i64,
    /// Usage ceiling when an add request omits `max_uses`
    pub default_max_uses: u32,
}

impl Default for LicenseDefaultsConfig {
    fn default() -> Self {
        Self {
            default_duration_secs: 300,
            default_max_uses: 10,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Enable logging
    pub enabled: bool,
    /// Log level: trace, debug, info, warn, error
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
        }
    }
}

impl AegisConfig {
    /// Load configuration from file and environment.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. `config.toml` file (optional)
    /// 3. Environment variables
    fn load() -> LicenseResult<Self> {
        let builder = Config::builder()
            // Start with defaults
            .set_default("server.host", "127.0.0.1")
            .map_err(|e| LicenseError::Config(e.to_string()))?
            .set_default("server.port", 8080)
            .map_err(|e| LicenseError::Config(e.to_string()))?
            .set_default("secrets.signing_secret", "")
            .map_err(|e| LicenseError::Config(e.to_string()))?
            .set_default("secrets.admin_key", "")
            .map_err(|e| LicenseError::Config(e.to_string()))?
            .set_default("license.default_duration_secs", 300)
            .map_err(|e| LicenseError::Config(e.to_string()))?
            .set_default("license.default_max_uses", 10)
            .map_err(|e| LicenseError::Config(e.to_string()))?
            .set_default("logging.enabled", true)
            .map_err(|e| LicenseError::Config(e.to_string()))?
            .set_default("logging.level", "info")
            .map_err(|e| LicenseError::Config(e.to_string()))?
            // Load from config.toml (optional)
            .add_source(config::File::with_name("config").required(false))
            // Override with environment variables
            .set_override_option("server.host", env::var("AEGIS_SERVER_HOST").ok())
            .map_err(|e| LicenseError::Config(e.to_string()))?
            .set_override_option(
                "server.port",
                env::var("AEGIS_SERVER_PORT")
                    .ok()
                    .and_then(|v| v.parse::<i64>().ok()),
            )
            .map_err(|e| LicenseError::Config(e.to_string()))?
            .set_override_option(
                "secrets.signing_secret",
                env::var("AEGIS_SIGNING_SECRET").ok(),
            )
            .map_err(|e| LicenseError::Config(e.to_string()))?
            .set_override_option("secrets.admin_key", env::var("AEGIS_ADMIN_KEY").ok())
            .map_err(|e| LicenseError::Config(e.to_string()))?
            .set_override_option(
                "license.default_duration_secs",
                env::var("AEGIS_DEFAULT_DURATION_SECS")
                    .ok()
                    .and_then(|v| v.parse::<i64>().ok()),
            )
            .map_err(|e| LicenseError::Config(e.to_string()))?
            .set_override_option(
                "license.default_max_uses",
                env::var("AEGIS_DEFAULT_MAX_USES")
                    .ok()
                    .and_then(|v| v.parse::<i64>().ok()),
            )
            .map_err(|e| LicenseError::Config(e.to_string()))?
            .set_override_option(
                "logging.enabled",
                env::var("AEGIS_LOGGING_ENABLED")
                    .ok()
                    .and_then(|v| v.parse::<bool>().ok()),
            )
            .map_err(|e| LicenseError::Config(e.to_string()))?
            .set_override_option("logging.level", env::var("AEGIS_LOG_LEVEL").ok())
            .map_err(|e| LicenseError::Config(e.to_string()))?;

        let settings = builder
            .build()
            .map_err(|e| LicenseError::Config(format!("failed to build config: {e}")))?;

        settings
            .try_deserialize()
            .map_err(|e| LicenseError::Config(format!("failed to deserialize config: {e}")))
    }

    /// Validate the configuration.
    pub fn validate(&self) -> LicenseResult<()> {
        if self.server.port == 0 {
            return Err(LicenseError::Config(
                "server.port must be greater than 0".to_string(),
            ));
        }

        if self.secrets.signing_secret.is_empty() {
            return Err(LicenseError::Config(
                "secrets.signing_secret is required (set AEGIS_SIGNING_SECRET)".to_string(),
            ));
        }
        if self.secrets.admin_key.is_empty() {
            return Err(LicenseError::Config(
                "secrets.admin_key is required (set AEGIS_ADMIN_KEY)".to_string(),
            ));
        }

        if self.license.default_duration_secs < 0 {
            return Err(LicenseError::Config(
                "license.default_duration_secs must be non-negative".to_string(),
            ));
        }
        if !(MIN_MAX_USES..=MAX_MAX_USES).contains(&self.license.default_max_uses) {
            return Err(LicenseError::Config(format!(
                "license.default_max_uses must be between {MIN_MAX_USES} and {MAX_MAX_USES}"
            )));
        }

        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(LicenseError::Config(format!(
                    "logging.level must be one of: trace, debug, info, warn, error. Got '{other}'"
                )));
            }
        }

        Ok(())
    }
}

/// Get the global configuration.
///
/// This loads the configuration on first access and caches it.
/// Returns an error if configuration loading or validation fails.
pub fn get_config() -> LicenseResult<&'static AegisConfig> {
    if let Some(config) = CONFIG.get() {
        return Ok(config);
    }

    let config = AegisConfig::load()?;
    config.validate()?;

    // Try to set it (ignore if another thread beat us)
    let _ = CONFIG.set(config.clone());

    Ok(CONFIG.get().expect("config was just set"))
}

/// Initialize configuration explicitly.
///
/// Call this early in your application to catch configuration errors.
/// Returns the validated configuration.
pub fn init_config() -> LicenseResult<&'static AegisConfig> {
    get_config()
}
