//! # Poll Engine Events
//!
//! One event per state transition, replayable by block range.

use crate::domain::Settlement;
use serde::{Deserialize, Serialize};
use shared_types::{
    AdminEvent, Address, Amount, ChainSelector, FinalizeKey, GroupId, Hash, PollId, PollOutcome,
    Timestamp,
};

/// Events emitted by the poll engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PollEvent {
    /// Poll created.
    PollCreated {
        /// New id.
        poll_id: PollId,
        /// Group.
        group_id: GroupId,
        /// Creator.
        creator: Address,
        /// Voting opens.
        start_time: Timestamp,
        /// Voting closes.
        end_time: Timestamp,
        /// Frozen eligible count.
        eligible_snapshot: u64,
    },
    /// Escrow funded at creation or topped up.
    EscrowFunded {
        /// Poll.
        poll_id: PollId,
        /// Payer.
        payer: Address,
        /// Amount added.
        amount: Amount,
        /// Balance afterwards.
        balance: Amount,
    },
    /// Vote cast.
    VoteCast {
        /// Poll.
        poll_id: PollId,
        /// Voter.
        voter: Address,
        /// Chosen option.
        option: u32,
        /// Weight counted.
        weight: u64,
    },
    /// Delegation set or redirected.
    DelegationSet {
        /// Poll.
        poll_id: PollId,
        /// Delegator.
        delegator: Address,
        /// Delegate.
        delegate: Address,
    },
    /// Delegation revoked.
    DelegationRevoked {
        /// Poll.
        poll_id: PollId,
        /// Delegator.
        delegator: Address,
        /// Former delegate.
        delegate: Address,
    },
    /// Finalize called.
    FinalizeRequested {
        /// Poll.
        poll_id: PollId,
        /// Correlation key.
        finalize_key: FinalizeKey,
        /// Local outcome.
        outcome: PollOutcome,
        /// Caller.
        executor: Address,
    },
    /// Finalize message accepted by the router.
    MessageTransmitted {
        /// Poll.
        poll_id: PollId,
        /// Correlation key.
        finalize_key: FinalizeKey,
        /// Transport id (reference only).
        message_id: Hash,
        /// Router fee.
        fee: Amount,
    },
    /// Quote or send failed.
    TransmissionFailed {
        /// Poll.
        poll_id: PollId,
        /// Correlation key.
        finalize_key: FinalizeKey,
        /// Router error text.
        reason: String,
    },
    /// Escrow distributed.
    EscrowSettled {
        /// Poll.
        poll_id: PollId,
        /// Distribution.
        settlement: Settlement,
    },
    /// Acknowledgment accepted.
    AckReceived {
        /// Correlation key.
        finalize_key: FinalizeKey,
        /// L1 message id of the finalize that was recorded.
        origin_message_id: Hash,
        /// L2 poll, if known locally.
        poll_id: Option<PollId>,
    },
    /// Acknowledgment allow-list changed.
    AckSourceSet {
        /// Allowed source chain.
        chain: ChainSelector,
        /// Allowed source sender.
        sender: Address,
    },
    /// Outbound destination changed.
    DestinationSet {
        /// L1 chain.
        chain: ChainSelector,
        /// L1 receiver.
        receiver: Address,
    },
    /// Pause, unpause or ownership change.
    Admin(AdminEvent),
}
