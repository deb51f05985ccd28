//! # QB-04 Poll Engine
//!
//! Poll lifecycle on L2 and the L2 half of the cross-chain finalize protocol.
//!
//! **Subsystem ID:** 04
//! **Chain:** L2 (execution layer)
//! **Depends on:** qb-01 (membership), qb-02 (delegation), qb-03 (escrow)
//!
//! ## Lifecycle
//!
//! ```text
//! Upcoming ──(start)──→ Active ──(end)──→ Ended ──(finalize, ack)──→ Finalized
//!                       vote/delegate      finalize
//! ```
//!
//! Status is computed from the block time, the window and the ack flag; the
//! only stored bit is the acknowledgment itself.
//!
//! ## Cross-Chain Protocol
//!
//! | Step | Component | Action |
//! |------|-----------|--------|
//! | 1 | `PollEngine::finalize` | outcome, escrow check, attempt marker |
//! | 2 | `CrossChainMessenger` | `(group, poll, outcome)` to the L1 registry |
//! | 3 | L1 registry | records once, acknowledges with the finalize key |
//! | 4 | `AckGate` | provenance check, `ack_received[key] = true` once |
//!
//! Correlation is by `FinalizeKey` only; bridge message ids are kept for
//! reference.

#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod ack_gate;
pub mod domain;
pub mod engine;
pub mod events;
pub mod messenger;
pub mod service;

pub use ack_gate::{AckGate, AckOutcome, AckRecord};
pub use domain::{
    compute_outcome, EngineConfig, FinalizationRecord, Poll, PollError, PollStatus, QuorumRule,
    Settlement, Transmission, Vote,
};
pub use engine::{NewPoll, PollEngine};
pub use events::PollEvent;
pub use messenger::CrossChainMessenger;
pub use service::L2VotingService;
