//! # QB-05 L1 Result Registry
//!
//! Settlement-layer mirror of poll results.
//!
//! **Subsystem ID:** 05
//! **Chain:** L1 (settlement layer)
//!
//! ## Receive Path
//!
//! ```text
//! router ──→ caller check ──→ pause ──→ allow-list ──→ decode
//!                                                        │
//!            ┌──── recorded? ──── yes ──→ no-op ─────────┘
//!            no
//!            ↓
//!   fee check ──→ write record ──→ send ack(finalize_key, message_id)
//! ```
//!
//! `is_recorded` and `get_record` answer `false` and the zero record for
//! pairs that were never recorded.

#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod errors;
pub mod registry;
pub mod service;

pub use errors::RegistryError;
pub use registry::{ReceiveOutcome, RegistryEvent, ResultRecord, ResultRegistry};
pub use service::L1RegistryService;
