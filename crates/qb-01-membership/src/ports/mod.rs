//! # Ports
//!
//! Outbound dependencies of the registry.

pub mod nft;

pub use nft::{InMemoryNftCollections, NftBalanceSource};
