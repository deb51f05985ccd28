//! # Shared Types Crate
//!
//! Primitives and protocol types shared by both chains and the bridge.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: addresses, hashes, selectors and the wire
//!   payloads are defined once here and used by L2, L1 and the bridge.
//! - **Content-Derived Correlation**: the finalize key is
//!   `keccak256(abi.encode(group_id, poll_id))`; bridge message ids are never
//!   used to correlate a finalize with its acknowledgment.
//! - **Explicit State**: owner/pause state and the chain clock are values
//!   passed to contracts, not globals.

pub mod abi;
pub mod access;
pub mod errors;
pub mod events;
pub mod ledger;
pub mod primitives;
pub mod protocol;
pub mod token;

pub use abi::AbiError;
pub use access::{AccessControl, AccessError, AdminEvent};
pub use errors::{Classify, ErrorKind};
pub use events::{block_range_chunks, EventLog, LoggedEvent};
pub use ledger::{Ledger, TxContext};
pub use primitives::{
    keccak256, Address, Amount, BlockNumber, ChainSelector, GroupId, Hash, PollId, Timestamp,
};
pub use protocol::{AckPayload, FinalizeKey, FinalizePayload, PollOutcome};
pub use token::{FeeToken, TokenError};

/// Basis-point denominator.
pub const BPS_DENOMINATOR: u64 = 10_000;
