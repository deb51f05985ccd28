//! # QB Telemetry
//!
//! Logging setup shared by the devnet runtime and the integration tests.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use qb_telemetry::{init_tracing, TelemetryConfig};
//!
//! fn main() -> Result<(), qb_telemetry::TelemetryError> {
//!     let config = TelemetryConfig::from_env();
//!     init_tracing(&config)?;
//!     // every `[qb-NN]` log line now goes through the configured subscriber
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `QB_LOG_LEVEL` / `RUST_LOG` | `info` | `EnvFilter` directives |
//! | `QB_JSON_LOGS` | `false` | JSON lines instead of human-readable output |
//! | `QB_SERVICE_NAME` | `quantum-ballot` | Service name in the startup line |
//! | `QB_SUBSYSTEM_ID` | `00` | Subsystem identifier |

#![warn(missing_docs)]

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::{init_tracing, TracingInit};

use thiserror::Error;

/// Telemetry initialization errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TelemetryError {
    /// The log filter directives could not be parsed.
    #[error("Invalid log filter '{directives}': {reason}")]
    InvalidFilter {
        /// Directives as supplied.
        directives: String,
        /// Parser message.
        reason: String,
    },

    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Span tagged with the emitting subsystem.
///
/// ```rust,ignore
/// let _span = qb_telemetry::subsystem_span!("finalize", subsystem = "qb-04", poll_id = 7).entered();
/// ```
#[macro_export]
macro_rules! subsystem_span {
    ($name:expr, $($field:tt)*) => {
        tracing::info_span!($name, $($field)*)
    };
}
