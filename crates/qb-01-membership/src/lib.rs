//! # QB-01 Membership Registry
//!
//! Voting groups and their membership rules.
//!
//! **Subsystem ID:** 01
//! **Chain:** L2 (execution layer)
//!
//! ## Strategies
//!
//! | Strategy | Membership is | Configured by |
//! |----------|---------------|---------------|
//! | Manual | an explicit flag | owner, any time |
//! | NFT | holding ≥ 1 unit of the collection | owner sets the collection |
//! | ClaimCode | having redeemed the group's code | owner sets the code once |
//!
//! Each group stores one [`Membership`] variant and `is_member` is a match
//! over it. NFT membership is never stored; it is read through the
//! [`NftBalanceSource`] port at query time.
//!
//! ## Module Structure
//!
//! ```text
//! qb-01-membership/
//! ├── domain/      # Group, Membership variants, errors
//! ├── ports/       # NftBalanceSource
//! ├── events.rs    # MembershipEvent
//! └── registry.rs  # MembershipRegistry
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod domain;
pub mod events;
pub mod ports;
pub mod registry;

pub use domain::{Group, Membership, MembershipError, MembershipStrategy, StrategyConfig};
pub use events::MembershipEvent;
pub use ports::{InMemoryNftCollections, NftBalanceSource};
pub use registry::MembershipRegistry;
