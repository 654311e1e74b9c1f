//! Subscriber installation.
//!
//! One registry with an `EnvFilter` and either a JSON or a human-readable
//! fmt layer. Installing twice is not an error: the first subscriber stays.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{TelemetryConfig, TelemetryError};

/// Result of `init_telemetry`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    /// This call installed the global subscriber
    Installed,
    /// A subscriber was already in place and was kept
    AlreadyInstalled,
}

/// Parse the configured filter directives.
pub fn build_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(&config.log_level).map_err(|e| TelemetryError::Filter {
        directives: config.log_level.clone(),
        reason: e.to_string(),
    })
}

/// Install the global subscriber described by `config`.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<InitOutcome, TelemetryError> {
    let filter = build_filter(config)?;

    let installed = if config.json_logs {
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true);
        tracing_subscriber::registry()
            .with(filter)
            .with(json_layer)
            .try_init()
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .with_ansi(config.ansi);
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init()
    };

    match installed {
        Ok(()) => {
            tracing::info!(
                service = %config.service_name,
                json = config.json_logs,
                "Telemetry initialized"
            );
            Ok(InitOutcome::Installed)
        }
        Err(_) => Ok(InitOutcome::AlreadyInstalled),
    }
}
