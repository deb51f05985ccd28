//! # Membership Events
//!
//! Replayable record of every registry state transition.

use crate::domain::MembershipStrategy;
use serde::{Deserialize, Serialize};
use shared_types::{Address, GroupId, Hash};

/// Events emitted by the membership registry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MembershipEvent {
    /// A group was created.
    GroupCreated {
        /// New id.
        group_id: GroupId,
        /// Creator and owner.
        owner: Address,
        /// Group name.
        name: String,
        /// Selected strategy.
        strategy: MembershipStrategy,
    },
    /// Owner toggled a manual member.
    ManualMemberSet {
        /// Group.
        group_id: GroupId,
        /// Account toggled.
        member: Address,
        /// New flag.
        is_member: bool,
    },
    /// Owner configured the NFT collection.
    NftCollectionSet {
        /// Group.
        group_id: GroupId,
        /// Collection contract.
        collection: Address,
    },
    /// Owner registered the group's claim code.
    ClaimCodeCreated {
        /// Group.
        group_id: GroupId,
        /// Keccak-256 of the code.
        code_hash: Hash,
    },
    /// An address redeemed the claim code.
    CodeClaimed {
        /// Group.
        group_id: GroupId,
        /// New member.
        member: Address,
    },
}
