//! # Membership Errors

use super::group::MembershipStrategy;
use shared_types::{Address, Classify, ErrorKind, GroupId};
use thiserror::Error;

/// Errors raised by the membership registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MembershipError {
    /// Group name was empty.
    #[error("group name cannot be empty")]
    EmptyName,

    /// Group id was never allocated.
    #[error("group not found: {0}")]
    GroupNotFound(GroupId),

    /// Owner-gated operation called by someone else.
    #[error("unauthorized: caller {caller} is not the owner {owner} of group {group_id}")]
    NotGroupOwner {
        /// Group being configured.
        group_id: GroupId,
        /// Offending caller.
        caller: Address,
        /// Expected owner.
        owner: Address,
    },

    /// Operation does not apply to the group's strategy.
    #[error("group {group_id} uses {actual:?} membership, operation requires {expected:?}")]
    StrategyMismatch {
        /// Group being configured.
        group_id: GroupId,
        /// Strategy the operation needs.
        expected: MembershipStrategy,
        /// Strategy the group has.
        actual: MembershipStrategy,
    },

    /// Zero address supplied where an account or collection is required.
    #[error("zero address supplied")]
    ZeroAddress,

    /// Zero hash supplied as a claim code.
    #[error("claim code hash cannot be zero")]
    ZeroCodeHash,

    /// Group already has its claim code.
    #[error("group {0} already has a claim code")]
    ClaimCodeAlreadySet(GroupId),

    /// Group has no claim code yet.
    #[error("group {0} has no claim code")]
    ClaimCodeNotSet(GroupId),

    /// Supplied code hash does not match.
    #[error("invalid claim code for group {group_id}")]
    InvalidClaimCode {
        /// Group being claimed.
        group_id: GroupId,
    },

    /// Caller already redeemed the code.
    #[error("{member} already claimed membership of group {group_id}")]
    AlreadyClaimed {
        /// Group being claimed.
        group_id: GroupId,
        /// Caller.
        member: Address,
    },
}

impl Classify for MembershipError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyName | Self::InvalidClaimCode { .. } => ErrorKind::Validation,
            Self::ZeroAddress | Self::ZeroCodeHash => ErrorKind::Configuration,
            Self::NotGroupOwner { .. } => ErrorKind::Authorization,
            Self::GroupNotFound(_)
            | Self::StrategyMismatch { .. }
            | Self::ClaimCodeAlreadySet(_)
            | Self::ClaimCodeNotSet(_)
            | Self::AlreadyClaimed { .. } => ErrorKind::StateConflict,
        }
    }
}
