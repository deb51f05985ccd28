//! # Error Taxonomy
//!
//! Classification shared by every subsystem error enum. Each crate keeps its
//! own `thiserror` enum and maps variants onto one of these kinds.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Broad class of a rejected operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Zero address / zero value configuration. Fatal at deployment.
    Configuration,
    /// Malformed or out-of-range input.
    Validation,
    /// Caller lacks the required role or membership.
    Authorization,
    /// Operation conflicts with current state (double vote, re-finalize, ...).
    StateConflict,
    /// Cross-chain message from a source that is not allow-listed.
    Provenance,
    /// Insufficient escrow, balance or allowance.
    Resource,
    /// Bridge transport failure.
    Transport,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Configuration => "configuration",
            Self::Validation => "validation",
            Self::Authorization => "authorization",
            Self::StateConflict => "state-conflict",
            Self::Provenance => "provenance",
            Self::Resource => "resource",
            Self::Transport => "transport",
        };
        f.write_str(name)
    }
}

/// Errors that can be classified into the shared taxonomy.
pub trait Classify {
    /// Kind of this error.
    fn kind(&self) -> ErrorKind;
}

impl Classify for crate::access::AccessError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::NotOwner { .. } => ErrorKind::Authorization,
            Self::Paused => ErrorKind::StateConflict,
            Self::ZeroOwner => ErrorKind::Configuration,
        }
    }
}

impl Classify for crate::token::TokenError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::InsufficientBalance { .. } | Self::InsufficientAllowance { .. } => {
                ErrorKind::Resource
            }
            Self::ZeroAddress => ErrorKind::Validation,
        }
    }
}

impl Classify for crate::abi::AbiError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Validation
    }
}
