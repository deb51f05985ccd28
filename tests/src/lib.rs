//! # Quantum Ballot Test Suite
//!
//! Cross-crate flows run against a wired devnet (both chains plus the bridge).
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs       # Devnet, accounts, group/poll setup helpers
//! └── integration/
//!     ├── e2e.rs            # Full lifecycle per membership strategy
//!     ├── idempotency.rs    # Redelivery and reordering
//!     ├── provenance.rs     # Forged and misrouted messages
//!     └── failure_modes.rs  # Pause, router outage, unfunded registry
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p qb-tests
//! cargo test -p qb-tests integration::idempotency::
//! ```

#![allow(dead_code)]

pub mod fixtures;
pub mod integration;
