//! Runtime errors.

use qb_01_membership::MembershipError;
use qb_04_poll_engine::PollError;
use qb_05_result_registry::RegistryError;
use shared_types::TokenError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading configuration or wiring the devnet.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The config file could not be read.
    #[error("Failed to read config {path}: {source}")]
    ConfigRead {
        /// File path.
        path: PathBuf,
        /// I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid JSON for `RuntimeConfig`.
    #[error("Failed to parse config {path}: {source}")]
    ConfigParse {
        /// File path.
        path: PathBuf,
        /// Parser error.
        #[source]
        source: serde_json::Error,
    },

    /// An environment override has an unusable value.
    #[error("Invalid value for {var}: '{value}'")]
    InvalidOverride {
        /// Variable name.
        var: &'static str,
        /// Supplied value.
        value: String,
    },

    /// Inconsistent configuration.
    #[error("Invalid runtime configuration: {0}")]
    InvalidConfig(String),

    /// L2 deployment or call failed.
    #[error(transparent)]
    Poll(#[from] PollError),

    /// Membership call failed.
    #[error(transparent)]
    Membership(#[from] MembershipError),

    /// L1 deployment or call failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Token funding failed.
    #[error(transparent)]
    Token(#[from] TokenError),

    /// The relayer did not deliver in time.
    #[error("Timed out waiting for {0}")]
    Timeout(&'static str),
}
