//! # CSM Telemetry
//!
//! Structured logging for the matrix crates. Library crates only emit
//! `tracing` events; binaries call `init_telemetry` once at startup.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use csm_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     init_telemetry(&TelemetryConfig::from_env())?;
//!     // ...
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `CSM_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter directives |
//! | `CSM_JSON_LOGS` | `false` | JSON lines instead of human output |
//! | `CSM_SERVICE_NAME` | `csm` | Service name attached to the startup event |

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::{build_filter, init_telemetry, InitOutcome};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("invalid log filter `{directives}`: {reason}")]
    Filter { directives: String, reason: String },
}

/// Span carrying the component name, for grouping a service's events.
#[macro_export]
macro_rules! component_span {
    ($name:expr $(, $($field:tt)*)?) => {
        tracing::info_span!("component", component = $name $(, $($field)*)?)
    };
}
