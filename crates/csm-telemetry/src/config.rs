//! Telemetry configuration from environment variables.

use std::env;

use serde::{Deserialize, Serialize};

pub const DEFAULT_SERVICE_NAME: &str = "csm";
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Name attached to the startup event
    pub service_name: String,

    /// `EnvFilter` directives, e.g. `info,csm_matrix=debug`
    pub log_level: String,

    /// JSON lines instead of the human-readable format
    pub json_logs: bool,

    /// ANSI colors in the human-readable format
    pub ansi: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            json_logs: false,
            ansi: true,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// - `CSM_SERVICE_NAME`: service name (default: csm)
    /// - `CSM_LOG_LEVEL` or `RUST_LOG`: filter directives (default: info)
    /// - `CSM_JSON_LOGS`: `true`/`1` for JSON output (default: false)
    /// - `NO_COLOR`: disables ANSI colors when set
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            service_name: non_empty("CSM_SERVICE_NAME").unwrap_or(defaults.service_name),
            log_level: non_empty("CSM_LOG_LEVEL")
                .or_else(|| non_empty("RUST_LOG"))
                .unwrap_or(defaults.log_level),
            json_logs: non_empty("CSM_JSON_LOGS")
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(defaults.json_logs),
            ansi: lookup("NO_COLOR").is_none(),
        }
    }

    /// Configuration for a named tool, keeping the environment overrides.
    pub fn for_service(name: &str) -> Self {
        let mut config = Self::from_env();
        if env::var("CSM_SERVICE_NAME").is_err() {
            config.service_name = name.to_string();
        }
        config
    }
}
