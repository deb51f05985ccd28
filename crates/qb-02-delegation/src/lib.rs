//! # QB-02 Delegation Ledger
//!
//! Per-poll vote delegation for the poll engine.
//!
//! **Subsystem ID:** 02
//! **Chain:** L2 (execution layer)
//!
//! ## Rules
//!
//! | Rule | Enforced by |
//! |------|-------------|
//! | No delegation after voting | `DelegatorAlreadyVoted` |
//! | No revoke once the delegate voted | `DelegationLocked` |
//! | Single hop, no cycles | `ChainedDelegation`, `DelegatorHasDelegators` |
//! | Re-delegation before either party voted | overwrite in `delegate` |
//!
//! The voting window itself is enforced by the poll engine.

#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod errors;
pub mod ledger;

pub use errors::DelegationError;
pub use ledger::{Delegation, DelegationLedger, VoteWeight};
