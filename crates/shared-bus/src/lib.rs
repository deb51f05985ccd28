//! # Shared Bus - Cross-Chain Message Transport
//!
//! In-memory model of the asynchronous bridge between the execution layer (L2)
//! and the settlement layer (L1).
//!
//! ```text
//! ┌──────────────┐  send()   ┌────────┐  relay   ┌──────────────┐
//! │ L2 contract  │ ────────→ │ Outbox │ ───────→ │ L1 contract  │
//! │              │ ←──────── │        │ ←─────── │              │
//! └──────────────┘   relay   └────────┘  send()  └──────────────┘
//! ```
//!
//! ## Delivery Model
//!
//! - **At-least-once:** delivered messages can be redelivered.
//! - **No ordering:** pending messages can be reordered arbitrarily.
//! - **Unauthenticated payloads:** only `(source_chain, sender)` is trustworthy.
//! - **Dead Letter Queue:** rejected deliveries are parked for manual re-execution.
//! - **No timeout or cancel:** an undelivered message simply stays pending.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod errors;
pub mod message;
pub mod network;
pub mod relayer;
pub mod router;

pub use errors::{BridgeError, DeliveryError};
pub use message::{CrossChainMessage, DeadLetter, DeliveryOutcome};
pub use network::{BridgeNetwork, MessageReceiver};
pub use relayer::Relayer;
pub use router::{FeeSchedule, InMemoryRouter, MessageRouter, Outbox};

/// Default relayer poll interval in milliseconds.
pub const DEFAULT_RELAY_INTERVAL_MS: u64 = 50;
