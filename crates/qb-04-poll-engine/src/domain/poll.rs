//! # Poll Entity
//!
//! Lifecycle status is derived, never stored: it is a function of the block
//! time, the voting window and whether the acknowledgment arrived.

use serde::{Deserialize, Serialize};
use shared_types::{
    Address, Amount, FinalizeKey, GroupId, Hash, PollId, PollOutcome, Timestamp, BPS_DENOMINATOR,
};
use std::collections::BTreeMap;

/// Lifecycle status of a poll.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PollStatus {
    /// `now < start_time`.
    Upcoming,
    /// `start_time <= now < end_time`; voting permitted.
    Active,
    /// `now >= end_time`; finalize permitted, not yet bridge-confirmed.
    Ended,
    /// Acknowledged by L1. Terminal.
    Finalized,
}

impl PollStatus {
    /// Status at `now` for the given window.
    #[must_use]
    pub fn at(now: Timestamp, start_time: Timestamp, end_time: Timestamp, acknowledged: bool) -> Self {
        if acknowledged {
            Self::Finalized
        } else if now < start_time {
            Self::Upcoming
        } else if now < end_time {
            Self::Active
        } else {
            Self::Ended
        }
    }
}

/// Quorum rule frozen at creation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuorumRule {
    /// Whether quorum is evaluated.
    pub enabled: bool,
    /// Threshold in basis points of the eligible snapshot.
    pub threshold_bps: u64,
}

impl QuorumRule {
    /// `cast_weight * 10000 >= threshold_bps * eligible`.
    #[must_use]
    pub fn is_met(&self, cast_weight: u64, eligible: u64) -> bool {
        if !self.enabled {
            return true;
        }
        u128::from(cast_weight) * u128::from(BPS_DENOMINATOR)
            >= u128::from(self.threshold_bps) * u128::from(eligible)
    }
}

/// A cast vote. Immutable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    /// Chosen option index.
    pub option: u32,
    /// 1 plus delegated weight counted at cast time.
    pub weight: u64,
    /// Block time of the vote.
    pub cast_at: Timestamp,
}

/// How the bridge hand-off went.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transmission {
    /// Attempt recorded, hand-off not yet returned.
    Pending,
    /// Router accepted the message.
    Sent {
        /// Transport-assigned id (reference only).
        message_id: Hash,
        /// Fee pulled by the router.
        fee: Amount,
    },
    /// Quote or send failed; escrow was refunded.
    Failed {
        /// Router error text.
        reason: String,
    },
}

impl Transmission {
    /// True for `Sent`.
    #[must_use]
    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent { .. })
    }
}

/// Where the escrow went at finalize.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    /// Paid to the router.
    pub bridge_fee: Amount,
    /// Paid to the finalize caller.
    pub executor_reward: Amount,
    /// Success fee or failure fee paid to the treasury.
    pub platform_fee: Amount,
    /// Remainder returned to the poll creator.
    pub refund: Amount,
}

impl Settlement {
    /// Split of `escrow` after the router accepted the message and took
    /// `bridge_fee`. `None` if the escrow cannot cover fee and reward.
    #[must_use]
    pub fn on_success(
        escrow: Amount,
        bridge_fee: Amount,
        executor_reward: Amount,
        success_fee_bps: u64,
    ) -> Option<Self> {
        let remaining = escrow
            .checked_sub(bridge_fee)?
            .checked_sub(executor_reward)?;
        let platform_fee = bps_of(remaining, success_fee_bps);
        Some(Self {
            bridge_fee,
            executor_reward,
            platform_fee,
            refund: remaining - platform_fee,
        })
    }

    /// Split of `escrow` when nothing was sent. The failure fee is capped at
    /// what is left after the reward.
    #[must_use]
    pub fn on_failure(escrow: Amount, executor_reward: Amount, failure_fee: Amount) -> Option<Self> {
        let remaining = escrow.checked_sub(executor_reward)?;
        let platform_fee = failure_fee.min(remaining);
        Some(Self {
            bridge_fee: 0,
            executor_reward,
            platform_fee,
            refund: remaining - platform_fee,
        })
    }

    /// Escrow payouts other than the bridge fee, in payment order.
    #[must_use]
    pub fn payouts(&self, executor: Address, treasury: Address, creator: Address) -> [(Address, Amount); 3] {
        [
            (executor, self.executor_reward),
            (treasury, self.platform_fee),
            (creator, self.refund),
        ]
    }

    /// Sum of every payout.
    #[must_use]
    pub fn total(&self) -> Amount {
        self.bridge_fee + self.executor_reward + self.platform_fee + self.refund
    }
}

/// `amount * bps / 10000` rounded down, without widening past `Amount`.
///
/// `bps` must not exceed 10000.
fn bps_of(amount: Amount, bps: u64) -> Amount {
    let denominator = Amount::from(BPS_DENOMINATOR);
    let bps = Amount::from(bps.min(BPS_DENOMINATOR));
    amount / denominator * bps + amount % denominator * bps / denominator
}

/// Record of the single finalize attempt of a poll.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizationRecord {
    /// Locally computed outcome.
    pub outcome: PollOutcome,
    /// Cross-chain correlation key.
    pub finalize_key: FinalizeKey,
    /// Finalize caller.
    pub executor: Address,
    /// Block time of the attempt.
    pub attempted_at: Timestamp,
    /// Bridge hand-off result.
    pub transmission: Transmission,
    /// Escrow distribution.
    pub settlement: Settlement,
}

/// A poll.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poll {
    /// Sequential id, starting at 1.
    pub id: PollId,
    /// Owning group.
    pub group_id: GroupId,
    /// Creator; receives escrow refunds.
    pub creator: Address,
    /// Title.
    pub title: String,
    /// Opaque off-chain content pointer, stored verbatim.
    pub content_pointer: String,
    /// Option labels (at least two).
    pub options: Vec<String>,
    /// Voting opens.
    pub start_time: Timestamp,
    /// Voting closes.
    pub end_time: Timestamp,
    /// Quorum rule.
    pub quorum: QuorumRule,
    /// Eligible-member count at creation. Never recomputed.
    pub eligible_snapshot: u64,
    /// Weight per option.
    pub tallies: Vec<u64>,
    /// Total weight cast.
    pub total_weight: u64,
    /// Votes by voter.
    pub votes: BTreeMap<Address, Vote>,
    /// Block time of creation.
    pub created_at: Timestamp,
    /// Set on the finalize attempt.
    pub finalization: Option<FinalizationRecord>,
}

impl Poll {
    /// Key correlating this poll across chains.
    #[must_use]
    pub fn finalize_key(&self) -> FinalizeKey {
        FinalizeKey::derive(self.group_id, self.id)
    }

    /// Status at `now`.
    #[must_use]
    pub fn status(&self, now: Timestamp, acknowledged: bool) -> PollStatus {
        PollStatus::at(now, self.start_time, self.end_time, acknowledged)
    }

    /// Outcome of the current tallies.
    #[must_use]
    pub fn outcome(&self) -> PollOutcome {
        compute_outcome(&self.tallies, self.total_weight, self.quorum, self.eligible_snapshot)
    }
}

/// Determines the outcome of a tally.
///
/// Quorum is checked first. Otherwise the highest tally wins, the lowest
/// index winning ties; no cast weight at all yields `NoVotes`.
#[must_use]
pub fn compute_outcome(tallies: &[u64], total_weight: u64, quorum: QuorumRule, eligible: u64) -> PollOutcome {
    if !quorum.is_met(total_weight, eligible) {
        return PollOutcome::QuorumFailed;
    }
    if total_weight == 0 {
        return PollOutcome::NoVotes;
    }
    let mut best = 0usize;
    for (index, tally) in tallies.iter().enumerate() {
        if *tally > tallies[best] {
            best = index;
        }
    }
    PollOutcome::Winner(best as u32)
}
