//! # QB-03 Escrow Account
//!
//! Per-poll fee-token balance funding bridge fees, platform fees and
//! executor compensation.
//!
//! **Subsystem ID:** 03
//! **Chain:** L2 (execution layer)
//!
//! Funds enter only through `deposit` (approve-then-transferFrom) and leave
//! only through `debit`, a multi-recipient `settle` or a router allowance
//! granted with `authorize_spend`.

#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod account;
pub mod errors;

pub use account::EscrowAccount;
pub use errors::EscrowError;
