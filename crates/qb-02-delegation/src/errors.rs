//! Delegation error types.

use shared_types::{Address, Classify, ErrorKind, PollId};
use thiserror::Error;

/// Delegation ledger error type.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DelegationError {
    /// Zero address as delegator or delegate.
    #[error("zero address supplied")]
    ZeroAddress,

    /// Delegating to oneself.
    #[error("{0} cannot delegate to itself")]
    SelfDelegation(Address),

    /// Delegator already voted on the poll.
    #[error("delegator {delegator} already voted on poll {poll_id}")]
    DelegatorAlreadyVoted { poll_id: PollId, delegator: Address },

    /// Target already voted, so the weight could never be counted.
    #[error("delegate {delegate} already voted on poll {poll_id}")]
    DelegateAlreadyVoted { poll_id: PollId, delegate: Address },

    /// Delegate already voted with this delegation's weight.
    #[error("delegation of {delegator} to {delegate} on poll {poll_id} is locked")]
    DelegationLocked {
        poll_id: PollId,
        delegator: Address,
        delegate: Address,
    },

    /// Target itself delegates; chains are not allowed.
    #[error("{delegate} already delegates on poll {poll_id}; delegation chains are not allowed")]
    ChainedDelegation { poll_id: PollId, delegate: Address },

    /// Caller receives delegations and cannot pass them on.
    #[error("{delegator} holds delegations on poll {poll_id} and cannot delegate")]
    DelegatorHasDelegators { poll_id: PollId, delegator: Address },

    /// Nothing to revoke.
    #[error("{delegator} has no delegation on poll {poll_id}")]
    NoDelegation { poll_id: PollId, delegator: Address },

    /// Second vote on the same poll.
    #[error("{voter} already voted on poll {poll_id}")]
    AlreadyVoted { poll_id: PollId, voter: Address },

    /// Voter handed its vote to someone else.
    #[error("{voter} delegated its vote on poll {poll_id} to {delegate}")]
    VoterHasDelegated {
        poll_id: PollId,
        voter: Address,
        delegate: Address,
    },
}

impl Classify for DelegationError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::ZeroAddress | Self::SelfDelegation(_) => ErrorKind::Validation,
            _ => ErrorKind::StateConflict,
        }
    }
}
