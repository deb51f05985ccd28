//! # Group Entity
//!
//! A group carries one membership variant. Resolution is a match over the
//! variant; the NFT variant stores nothing per member and asks the
//! collection port instead.

use serde::{Deserialize, Serialize};
use shared_types::{Address, GroupId, Hash, Timestamp};
use std::collections::BTreeSet;

/// Strategy tag, used in errors and events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MembershipStrategy {
    /// Owner toggles members explicitly.
    Manual,
    /// Holding at least one unit of a collection.
    Nft,
    /// Redeeming the group's shared claim code.
    ClaimCode,
}

/// Strategy configuration supplied at group creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrategyConfig {
    /// Manual membership, starts empty.
    Manual,
    /// NFT-gated membership; the collection may be set later by the owner.
    Nft {
        /// Collection contract.
        collection: Option<Address>,
    },
    /// Claim-code membership; the code may be set later, exactly once.
    ClaimCode {
        /// Keccak-256 of the shared code.
        code_hash: Option<Hash>,
    },
}

/// Per-variant membership state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Membership {
    /// Explicit member set.
    Manual {
        /// Current members.
        members: BTreeSet<Address>,
    },
    /// Computed from collection balances.
    Nft {
        /// Collection contract, if configured.
        collection: Option<Address>,
    },
    /// One shared secret per group, redeemed per address.
    ClaimCode {
        /// Keccak-256 of the shared code, if configured.
        code_hash: Option<Hash>,
        /// Addresses that redeemed the code.
        claimed: BTreeSet<Address>,
    },
}

impl Membership {
    /// Builds the initial state for a creation-time config.
    #[must_use]
    pub fn from_config(config: StrategyConfig) -> Self {
        match config {
            StrategyConfig::Manual => Self::Manual {
                members: BTreeSet::new(),
            },
            StrategyConfig::Nft { collection } => Self::Nft { collection },
            StrategyConfig::ClaimCode { code_hash } => Self::ClaimCode {
                code_hash,
                claimed: BTreeSet::new(),
            },
        }
    }

    /// Strategy tag of this state.
    #[must_use]
    pub fn strategy(&self) -> MembershipStrategy {
        match self {
            Self::Manual { .. } => MembershipStrategy::Manual,
            Self::Nft { .. } => MembershipStrategy::Nft,
            Self::ClaimCode { .. } => MembershipStrategy::ClaimCode,
        }
    }
}

/// A voting group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Sequential id, starting at 1.
    pub id: GroupId,
    /// Creator; gates membership configuration.
    pub owner: Address,
    /// Non-empty display name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Creation timestamp.
    pub created_at: Timestamp,
    /// Membership variant and its state.
    pub membership: Membership,
}

impl Group {
    /// Strategy tag.
    #[must_use]
    pub fn strategy(&self) -> MembershipStrategy {
        self.membership.strategy()
    }
}
