//! # Devnet Runtime Library
//!
//! Wires both chains and the bridge in one process for local runs and for
//! the integration tests. The `qb-devnet` binary is a thin shell around it.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (JSON file, then `QB_*` overrides)
//! 2. Create the L2 and L1 ledgers, fee tokens and routers
//! 3. Register both chains with the bridge network
//! 4. Deploy the poll engine and the result registry, configure both allow-lists
//! 5. Fund the registry for acknowledgment fees
//! 6. Spawn the relayer

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod config;
pub mod devnet;
pub mod errors;
pub mod scenario;

pub use config::{ChainConfig, RuntimeConfig};
pub use devnet::Devnet;
pub use errors::RuntimeError;
pub use scenario::{run_demo, DemoReport};
