//! Subscriber setup and structured log macros.
//!
//! Every record carries the target crate, so `EnvFilter` directives such as
//! `qb_05_result_registry=debug` select one subsystem.

use crate::{TelemetryConfig, TelemetryError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// What `init_tracing` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TracingInit {
    /// This call installed the global subscriber.
    Installed,
    /// A global subscriber was already set; nothing changed.
    AlreadySet,
}

/// Installs the global subscriber.
///
/// Safe to call more than once: later calls leave the first subscriber in
/// place and return [`TracingInit::AlreadySet`].
pub fn init_tracing(config: &TelemetryConfig) -> Result<TracingInit, TelemetryError> {
    config.validate()?;
    let env_filter = build_filter(&config.log_level)?;

    let fmt_layer = if config.json_logs {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_file(config.with_source_location)
            .with_line_number(config.with_source_location)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_file(config.with_source_location)
            .with_line_number(config.with_source_location)
            .boxed()
    };

    let installed = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .is_ok();
    if !installed {
        return Ok(TracingInit::AlreadySet);
    }

    tracing::info!(
        service = %config.full_service_name(),
        json = config.json_logs,
        filter = %config.log_level,
        "Tracing initialized"
    );
    Ok(TracingInit::Installed)
}

fn build_filter(directives: &str) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(directives).map_err(|e| TelemetryError::InvalidFilter {
        directives: directives.to_string(),
        reason: e.to_string(),
    })
}

/// Helper to create structured log entries with consistent formatting.
#[macro_export]
macro_rules! log_event {
    // Info level with subsystem
    (info, $subsystem:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::info!(
            subsystem = $subsystem,
            $($($field)*,)?
            $msg
        )
    };

    // Warn level with subsystem
    (warn, $subsystem:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::warn!(
            subsystem = $subsystem,
            $($($field)*,)?
            $msg
        )
    };

    // Error level with subsystem
    (error, $subsystem:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::error!(
            subsystem = $subsystem,
            $($($field)*,)?
            $msg
        )
    };

    // Debug level with subsystem
    (debug, $subsystem:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::debug!(
            subsystem = $subsystem,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log a poll-related event with the correlation fields.
#[macro_export]
macro_rules! log_poll_event {
    ($level:ident, $subsystem:expr, $msg:expr, $group_id:expr, $poll_id:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            subsystem = $subsystem,
            group_id = $group_id,
            poll_id = $poll_id,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log a bridge message event with standard fields.
#[macro_export]
macro_rules! log_message_event {
    ($level:ident, $subsystem:expr, $msg:expr, $message_id:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            subsystem = $subsystem,
            message_id = %$message_id,
            $($($field)*,)?
            $msg
        )
    };
}
