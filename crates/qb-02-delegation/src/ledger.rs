//! # Delegation Ledger
//!
//! Per-poll, single-hop delegation. A delegate's own delegation never
//! compounds: an address that delegates cannot receive delegations and an
//! address that receives delegations cannot delegate, so cycles cannot form.
//!
//! A delegation is locked the moment its delegate votes; locked delegations
//! cannot be revoked or redirected.

use crate::errors::DelegationError;
use serde::{Deserialize, Serialize};
use shared_types::{Address, PollId, Timestamp};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info};

/// One delegator → delegate relation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delegation {
    /// Address receiving the weight.
    pub delegate: Address,
    /// Set once the delegate voted with this weight.
    pub locked: bool,
    /// When the relation was (re)written.
    pub delegated_at: Timestamp,
}

/// Weight resolved at vote time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoteWeight {
    /// 1 plus the number of delegations counted.
    pub weight: u64,
    /// Delegators whose weight was counted, now locked.
    pub delegators: Vec<Address>,
}

#[derive(Debug, Default)]
struct PollDelegations {
    outgoing: HashMap<Address, Delegation>,
    incoming: HashMap<Address, BTreeSet<Address>>,
    voted: BTreeSet<Address>,
}

impl PollDelegations {
    fn detach(&mut self, delegator: Address, delegate: Address) {
        if let Some(set) = self.incoming.get_mut(&delegate) {
            set.remove(&delegator);
            if set.is_empty() {
                self.incoming.remove(&delegate);
            }
        }
    }
}

/// Delegation state of every poll.
#[derive(Debug, Default)]
pub struct DelegationLedger {
    polls: HashMap<PollId, PollDelegations>,
}

impl DelegationLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delegates `delegator`'s vote on `poll_id` to `to`.
    ///
    /// Overwrites an existing unlocked delegation and returns the previous
    /// delegate, if any.
    pub fn delegate(
        &mut self,
        poll_id: PollId,
        delegator: Address,
        to: Address,
        now: Timestamp,
    ) -> Result<Option<Address>, DelegationError> {
        self.check_delegate(poll_id, delegator, to)?;

        let state = self.polls.entry(poll_id).or_default();
        let previous = state
            .outgoing
            .insert(
                delegator,
                Delegation {
                    delegate: to,
                    locked: false,
                    delegated_at: now,
                },
            )
            .map(|old| old.delegate);
        if let Some(old) = previous {
            state.detach(delegator, old);
        }
        state.incoming.entry(to).or_default().insert(delegator);

        info!(poll_id, %delegator, delegate = %to, "[qb-02] Delegation set");
        Ok(previous)
    }

    /// Validates a delegation without applying it.
    pub fn check_delegate(
        &self,
        poll_id: PollId,
        delegator: Address,
        to: Address,
    ) -> Result<(), DelegationError> {
        if delegator.is_zero() || to.is_zero() {
            return Err(DelegationError::ZeroAddress);
        }
        if delegator == to {
            return Err(DelegationError::SelfDelegation(delegator));
        }
        let Some(state) = self.polls.get(&poll_id) else {
            return Ok(());
        };
        if state.voted.contains(&delegator) {
            debug!(poll_id, %delegator, "[qb-02] Delegation after vote rejected");
            return Err(DelegationError::DelegatorAlreadyVoted { poll_id, delegator });
        }
        if let Some(existing) = state.outgoing.get(&delegator) {
            if existing.locked {
                return Err(DelegationError::DelegationLocked {
                    poll_id,
                    delegator,
                    delegate: existing.delegate,
                });
            }
        }
        if state.voted.contains(&to) {
            return Err(DelegationError::DelegateAlreadyVoted {
                poll_id,
                delegate: to,
            });
        }
        if state.outgoing.contains_key(&to) {
            return Err(DelegationError::ChainedDelegation {
                poll_id,
                delegate: to,
            });
        }
        if state.incoming.get(&delegator).is_some_and(|set| !set.is_empty()) {
            return Err(DelegationError::DelegatorHasDelegators { poll_id, delegator });
        }
        Ok(())
    }

    /// Removes `delegator`'s unlocked delegation and returns the former delegate.
    pub fn revoke(&mut self, poll_id: PollId, delegator: Address) -> Result<Address, DelegationError> {
        let state = self
            .polls
            .get_mut(&poll_id)
            .ok_or(DelegationError::NoDelegation { poll_id, delegator })?;
        let existing = *state
            .outgoing
            .get(&delegator)
            .ok_or(DelegationError::NoDelegation { poll_id, delegator })?;
        if existing.locked {
            debug!(poll_id, %delegator, "[qb-02] Revoke of locked delegation rejected");
            return Err(DelegationError::DelegationLocked {
                poll_id,
                delegator,
                delegate: existing.delegate,
            });
        }
        state.outgoing.remove(&delegator);
        state.detach(delegator, existing.delegate);

        info!(poll_id, %delegator, delegate = %existing.delegate, "[qb-02] Delegation revoked");
        Ok(existing.delegate)
    }

    /// Validates that `voter` may vote on `poll_id`.
    pub fn check_vote(&self, poll_id: PollId, voter: Address) -> Result<(), DelegationError> {
        let Some(state) = self.polls.get(&poll_id) else {
            return Ok(());
        };
        if state.voted.contains(&voter) {
            return Err(DelegationError::AlreadyVoted { poll_id, voter });
        }
        if let Some(existing) = state.outgoing.get(&voter) {
            return Err(DelegationError::VoterHasDelegated {
                poll_id,
                voter,
                delegate: existing.delegate,
            });
        }
        Ok(())
    }

    /// Marks `voter` as voted and locks every delegation it holds.
    ///
    /// Returns the weight to tally.
    pub fn lock_for_vote(&mut self, poll_id: PollId, voter: Address) -> Result<VoteWeight, DelegationError> {
        self.check_vote(poll_id, voter)?;

        let state = self.polls.entry(poll_id).or_default();
        state.voted.insert(voter);
        let delegators: Vec<Address> = state
            .incoming
            .get(&voter)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        for delegator in &delegators {
            if let Some(delegation) = state.outgoing.get_mut(delegator) {
                delegation.locked = true;
            }
        }
        let weight = 1 + delegators.len() as u64;

        debug!(poll_id, %voter, weight, "[qb-02] Delegations locked for vote");
        Ok(VoteWeight { weight, delegators })
    }

    /// Delegation currently held by `delegator`.
    #[must_use]
    pub fn delegation_of(&self, poll_id: PollId, delegator: Address) -> Option<Delegation> {
        self.polls
            .get(&poll_id)
            .and_then(|state| state.outgoing.get(&delegator).copied())
    }

    /// Addresses delegating to `delegate`, in address order.
    #[must_use]
    pub fn delegators_of(&self, poll_id: PollId, delegate: Address) -> Vec<Address> {
        self.polls
            .get(&poll_id)
            .and_then(|state| state.incoming.get(&delegate))
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Weight `delegate` would cast if it voted now.
    #[must_use]
    pub fn pending_weight(&self, poll_id: PollId, delegate: Address) -> u64 {
        1 + self.delegators_of(poll_id, delegate).len() as u64
    }

    /// True if `delegator` has an active delegation.
    #[must_use]
    pub fn has_delegated(&self, poll_id: PollId, delegator: Address) -> bool {
        self.delegation_of(poll_id, delegator).is_some()
    }

    /// True if `voter` has voted on `poll_id`.
    #[must_use]
    pub fn has_voted(&self, poll_id: PollId, voter: Address) -> bool {
        self.polls
            .get(&poll_id)
            .is_some_and(|state| state.voted.contains(&voter))
    }
}
