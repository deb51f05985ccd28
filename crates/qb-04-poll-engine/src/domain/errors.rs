//! # Poll Engine Errors
//!
//! Lower-layer errors compose through `#[from]`; the engine's own variants
//! carry the offending values.

use qb_01_membership::MembershipError;
use qb_02_delegation::DelegationError;
use qb_03_escrow::EscrowError;
use shared_bus::BridgeError;
use shared_types::{
    AbiError, AccessError, Address, Amount, ChainSelector, Classify, ErrorKind, GroupId, PollId,
    Timestamp,
};
use thiserror::Error;

use super::poll::PollStatus;

/// Poll engine error type.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PollError {
    /// Poll id was never allocated.
    #[error("poll not found: {0}")]
    PollNotFound(PollId),

    /// Fewer than two options.
    #[error("a poll needs at least 2 options, got {0}")]
    TooFewOptions(usize),

    /// Poll would start before the current block time.
    #[error("start time {start_time} is before current time {now}")]
    StartTimeInPast {
        /// Supplied start.
        start_time: Timestamp,
        /// Observed block time.
        now: Timestamp,
    },

    /// End is not after start.
    #[error("invalid voting window: end {end_time} must be after start {start_time}")]
    InvalidWindow {
        /// Supplied start.
        start_time: Timestamp,
        /// Supplied end.
        end_time: Timestamp,
    },

    /// Quorum threshold above 100%.
    #[error("quorum threshold {0} bps exceeds 10000")]
    InvalidQuorum(u64),

    /// Option index out of range.
    #[error("option {index} out of range for poll {poll_id} with {options} options")]
    InvalidOption {
        /// Poll.
        poll_id: PollId,
        /// Supplied index.
        index: u32,
        /// Number of options.
        options: usize,
    },

    /// Caller may not create polls in the group.
    #[error("{caller} is neither owner nor member of group {group_id}")]
    NotEligibleCreator {
        /// Group.
        group_id: GroupId,
        /// Offending caller.
        caller: Address,
    },

    /// Caller (or delegate target) is not a group member.
    #[error("{account} is not a member of group {group_id}")]
    NotMember {
        /// Group.
        group_id: GroupId,
        /// Offending account.
        account: Address,
    },

    /// Operation needs a different lifecycle status.
    #[error("poll {poll_id} is {actual:?}, operation requires {expected:?}")]
    WrongStatus {
        /// Poll.
        poll_id: PollId,
        /// Required status.
        expected: PollStatus,
        /// Current status.
        actual: PollStatus,
    },

    /// Finalize was already attempted for the poll.
    #[error("poll {0} has already been finalized")]
    AlreadyFinalized(PollId),

    /// Escrow cannot cover the bridge fee and executor reward.
    #[error("insufficient escrow for poll {poll_id}: required {required}, available {available}")]
    InsufficientEscrow {
        /// Poll.
        poll_id: PollId,
        /// Bridge fee plus executor reward.
        required: Amount,
        /// Current escrow.
        available: Amount,
    },

    /// Engine configuration is invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Inbound message not delivered by the local router.
    #[error("unauthorized router: {caller}, expected {expected}")]
    UnauthorizedRouter {
        /// Actual caller.
        caller: Address,
        /// Configured router.
        expected: Address,
    },

    /// Acknowledgment source was never configured.
    #[error("acknowledgment source not configured")]
    AckSourceNotConfigured,

    /// Acknowledgment from a source that is not allow-listed.
    #[error("acknowledgment from disallowed source {sender} on {chain}")]
    ProvenanceRejected {
        /// Source chain.
        chain: ChainSelector,
        /// Source sender.
        sender: Address,
    },

    /// Owner/pause check failed.
    #[error(transparent)]
    Access(#[from] AccessError),

    /// Membership registry rejected the call.
    #[error(transparent)]
    Membership(#[from] MembershipError),

    /// Delegation ledger rejected the call.
    #[error(transparent)]
    Delegation(#[from] DelegationError),

    /// Escrow rejected the call.
    #[error(transparent)]
    Escrow(#[from] EscrowError),

    /// Bridge rejected a quote or send.
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    /// Inbound payload was malformed.
    #[error("malformed payload: {0}")]
    Abi(#[from] AbiError),
}

impl Classify for PollError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::TooFewOptions(_)
            | Self::StartTimeInPast { .. }
            | Self::InvalidWindow { .. }
            | Self::InvalidQuorum(_)
            | Self::InvalidOption { .. }
            | Self::Abi(_) => ErrorKind::Validation,
            Self::NotEligibleCreator { .. }
            | Self::NotMember { .. }
            | Self::UnauthorizedRouter { .. } => ErrorKind::Authorization,
            Self::PollNotFound(_) | Self::WrongStatus { .. } | Self::AlreadyFinalized(_) => {
                ErrorKind::StateConflict
            }
            Self::InsufficientEscrow { .. } => ErrorKind::Resource,
            Self::InvalidConfig(_) => ErrorKind::Configuration,
            Self::AckSourceNotConfigured | Self::ProvenanceRejected { .. } => {
                ErrorKind::Provenance
            }
            Self::Access(err) => err.kind(),
            Self::Membership(err) => err.kind(),
            Self::Delegation(err) => err.kind(),
            Self::Escrow(err) => err.kind(),
            Self::Bridge(err) => err.kind(),
        }
    }
}
