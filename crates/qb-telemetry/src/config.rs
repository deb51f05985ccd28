//! Telemetry configuration from environment variables.

use crate::TelemetryError;
use serde::{Deserialize, Serialize};
use std::env;

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Service name for the startup line and JSON records
    pub service_name: String,

    /// Subsystem identifier (00 for the whole process)
    pub subsystem_id: String,

    /// `EnvFilter` directives (trace, debug, info, warn, error, or per-target)
    pub log_level: String,

    /// Whether to emit JSON lines
    pub json_logs: bool,

    /// Whether to include file and line in records
    pub with_source_location: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "quantum-ballot".to_string(),
            subsystem_id: "00".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            with_source_location: false,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `QB_SERVICE_NAME`: Service name (default: quantum-ballot)
    /// - `QB_SUBSYSTEM_ID`: Subsystem ID (default: 00)
    /// - `QB_LOG_LEVEL` or `RUST_LOG`: Filter directives (default: info)
    /// - `QB_JSON_LOGS`: Enable JSON logs (default: false)
    /// - `QB_LOG_SOURCE`: Include file/line (default: false)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            service_name: lookup("QB_SERVICE_NAME").unwrap_or(defaults.service_name),
            subsystem_id: lookup("QB_SUBSYSTEM_ID").unwrap_or(defaults.subsystem_id),
            log_level: lookup("QB_LOG_LEVEL")
                .or_else(|| lookup("RUST_LOG"))
                .unwrap_or(defaults.log_level),
            json_logs: lookup("QB_JSON_LOGS")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.json_logs),
            with_source_location: lookup("QB_LOG_SOURCE")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.with_source_location),
        }
    }

    /// Create configuration for a specific subsystem.
    pub fn for_subsystem(subsystem_id: &str, subsystem_name: &str) -> Self {
        let mut config = Self::from_env();
        config.subsystem_id = subsystem_id.to_string();
        config.service_name = format!("qb-{}-{}", subsystem_id, subsystem_name);
        config
    }

    /// Get the full service name including subsystem.
    pub fn full_service_name(&self) -> String {
        if self.subsystem_id == "00" {
            self.service_name.clone()
        } else {
            format!("{}-{}", self.service_name, self.subsystem_id)
        }
    }

    /// Rejects empty fields.
    pub fn validate(&self) -> Result<(), TelemetryError> {
        if self.service_name.trim().is_empty() {
            return Err(TelemetryError::Config("service_name is empty".into()));
        }
        if self.log_level.trim().is_empty() {
            return Err(TelemetryError::Config("log_level is empty".into()));
        }
        Ok(())
    }
}

fn parse_flag(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value == "1"
}
