//! # Domain Module
//!
//! Poll entity, outcome rules, configuration and errors.

pub mod config;
pub mod errors;
pub mod poll;

pub use config::EngineConfig;
pub use errors::PollError;
pub use poll::{
    compute_outcome, FinalizationRecord, Poll, PollStatus, QuorumRule, Settlement, Transmission,
    Vote,
};
