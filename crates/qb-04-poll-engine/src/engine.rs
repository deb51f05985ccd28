//! # Poll Engine
//!
//! L2 contract state: groups, polls, votes, delegations, escrow and the
//! cross-chain finalize hand-off.
//!
//! Every entrypoint takes `&mut self` and a `TxContext`, so calls on one
//! chain are serialized and nothing can re-enter the engine while it runs.
//! Within `finalize` every payout is computed and checked before the
//! attempt marker is set, and the escrow bookkeeping for the whole
//! settlement commits before the first token transfer.

use crate::ack_gate::{AckGate, AckOutcome};
use crate::domain::{
    EngineConfig, FinalizationRecord, Poll, PollError, PollStatus, QuorumRule, Settlement,
    Transmission, Vote,
};
use crate::events::PollEvent;
use crate::messenger::CrossChainMessenger;
use qb_01_membership::{MembershipRegistry, NftBalanceSource};
use qb_02_delegation::{Delegation, DelegationLedger};
use qb_03_escrow::EscrowAccount;
use serde::{Deserialize, Serialize};
use shared_bus::{CrossChainMessage, MessageRouter};
use shared_types::{
    AccessControl, Address, Amount, ChainSelector, EventLog, FeeToken, FinalizeKey,
    FinalizePayload, GroupId, LoggedEvent, PollId, Timestamp, TxContext, BPS_DENOMINATOR,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{info, warn};

/// Parameters of `create_poll`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPoll {
    /// Group the poll belongs to.
    pub group_id: GroupId,
    /// Title.
    pub title: String,
    /// Opaque off-chain content pointer.
    pub content_pointer: String,
    /// Option labels.
    pub options: Vec<String>,
    /// Voting opens.
    pub start_time: Timestamp,
    /// Voting closes.
    pub end_time: Timestamp,
    /// Quorum rule.
    pub quorum: QuorumRule,
    /// Escrow pulled from the creator at creation (0 to skip).
    pub initial_escrow: Amount,
}

/// The L2 voting contract.
pub struct PollEngine {
    address: Address,
    access: AccessControl,
    config: EngineConfig,
    membership: MembershipRegistry,
    delegation: DelegationLedger,
    escrow: EscrowAccount,
    messenger: CrossChainMessenger,
    ack_gate: AckGate,
    polls: BTreeMap<PollId, Poll>,
    keys: HashMap<FinalizeKey, PollId>,
    next_poll_id: PollId,
    events: EventLog<PollEvent>,
}

impl PollEngine {
    /// Deploys the engine at `address`, owned by `owner`.
    ///
    /// Escrowed tokens are held at `address`, which is also the sender the
    /// router sees.
    pub fn new(
        address: Address,
        owner: Address,
        config: EngineConfig,
        fee_token: Arc<FeeToken>,
        router: Arc<dyn MessageRouter>,
        nft: Arc<dyn NftBalanceSource>,
    ) -> Result<Self, PollError> {
        config.validate()?;
        let access = AccessControl::new(owner)?;
        let escrow = EscrowAccount::new(address, fee_token)?;
        let messenger = CrossChainMessenger::new(
            router,
            address,
            config.destination_chain,
            config.destination_receiver,
        );
        info!(%address, %owner, "[qb-04] Poll engine deployed");
        Ok(Self {
            address,
            access,
            config,
            membership: MembershipRegistry::new(nft),
            delegation: DelegationLedger::new(),
            escrow,
            messenger,
            ack_gate: AckGate::new(),
            polls: BTreeMap::new(),
            keys: HashMap::new(),
            next_poll_id: 1,
            events: EventLog::new(),
        })
    }

    // =========================================================================
    // POLLS
    // =========================================================================

    /// Creates a poll and pulls its initial escrow from the caller.
    ///
    /// The caller must own the group or be a member of it.
    pub fn create_poll(&mut self, ctx: &TxContext, params: NewPoll) -> Result<PollId, PollError> {
        let group_id = params.group_id;
        let group_owner = self.membership.group(group_id)?.owner;
        if ctx.sender != group_owner && !self.membership.is_member(group_id, ctx.sender)? {
            warn!(group_id, caller = %ctx.sender, "[qb-04] Poll creation by non-member rejected");
            return Err(PollError::NotEligibleCreator {
                group_id,
                caller: ctx.sender,
            });
        }
        if params.options.len() < 2 {
            return Err(PollError::TooFewOptions(params.options.len()));
        }
        if params.start_time < ctx.timestamp {
            return Err(PollError::StartTimeInPast {
                start_time: params.start_time,
                now: ctx.timestamp,
            });
        }
        if params.end_time <= params.start_time {
            return Err(PollError::InvalidWindow {
                start_time: params.start_time,
                end_time: params.end_time,
            });
        }
        if params.quorum.threshold_bps > BPS_DENOMINATOR {
            return Err(PollError::InvalidQuorum(params.quorum.threshold_bps));
        }
        if params.initial_escrow > 0 {
            self.escrow.check_pull(ctx.sender, params.initial_escrow)?;
        }

        let poll_id = self.next_poll_id;
        let eligible_snapshot = self.membership.eligible_count(group_id)?;
        let poll = Poll {
            id: poll_id,
            group_id,
            creator: ctx.sender,
            title: params.title,
            content_pointer: params.content_pointer,
            tallies: vec![0; params.options.len()],
            options: params.options,
            start_time: params.start_time,
            end_time: params.end_time,
            quorum: params.quorum,
            eligible_snapshot,
            total_weight: 0,
            votes: BTreeMap::new(),
            created_at: ctx.timestamp,
            finalization: None,
        };
        self.next_poll_id += 1;
        self.keys.insert(poll.finalize_key(), poll_id);
        self.polls.insert(poll_id, poll);
        self.escrow.open(poll_id);

        self.events.emit(
            ctx,
            PollEvent::PollCreated {
                poll_id,
                group_id,
                creator: ctx.sender,
                start_time: params.start_time,
                end_time: params.end_time,
                eligible_snapshot,
            },
        );
        info!(
            poll_id,
            group_id,
            creator = %ctx.sender,
            eligible_snapshot,
            "[qb-04] Poll created"
        );

        if params.initial_escrow > 0 {
            let balance = self
                .escrow
                .deposit(poll_id, ctx.sender, params.initial_escrow)?;
            self.events.emit(
                ctx,
                PollEvent::EscrowFunded {
                    poll_id,
                    payer: ctx.sender,
                    amount: params.initial_escrow,
                    balance,
                },
            );
        }
        Ok(poll_id)
    }

    /// Casts the caller's vote; returns the weight counted.
    pub fn vote(&mut self, ctx: &TxContext, poll_id: PollId, option: u32) -> Result<u64, PollError> {
        self.access.ensure_not_paused()?;
        let (group_id, options) = {
            let poll = self.active_poll(ctx, poll_id)?;
            (poll.group_id, poll.options.len())
        };
        if option as usize >= options {
            return Err(PollError::InvalidOption {
                poll_id,
                index: option,
                options,
            });
        }
        self.ensure_member(group_id, ctx.sender)?;

        let weight = self.delegation.lock_for_vote(poll_id, ctx.sender)?.weight;
        let poll = self.poll_mut(poll_id)?;
        poll.tallies[option as usize] += weight;
        poll.total_weight += weight;
        poll.votes.insert(
            ctx.sender,
            Vote {
                option,
                weight,
                cast_at: ctx.timestamp,
            },
        );

        info!(poll_id, voter = %ctx.sender, option, weight, "[qb-04] Vote cast");
        self.events.emit(
            ctx,
            PollEvent::VoteCast {
                poll_id,
                voter: ctx.sender,
                option,
                weight,
            },
        );
        Ok(weight)
    }

    /// Delegates the caller's vote on `poll_id` to `to`.
    pub fn delegate(&mut self, ctx: &TxContext, poll_id: PollId, to: Address) -> Result<(), PollError> {
        self.access.ensure_not_paused()?;
        let group_id = self.active_poll(ctx, poll_id)?.group_id;
        self.ensure_member(group_id, ctx.sender)?;
        self.ensure_member(group_id, to)?;

        self.delegation
            .delegate(poll_id, ctx.sender, to, ctx.timestamp)?;
        self.events.emit(
            ctx,
            PollEvent::DelegationSet {
                poll_id,
                delegator: ctx.sender,
                delegate: to,
            },
        );
        Ok(())
    }

    /// Revokes the caller's unlocked delegation on `poll_id`.
    pub fn revoke(&mut self, ctx: &TxContext, poll_id: PollId) -> Result<(), PollError> {
        self.access.ensure_not_paused()?;
        self.active_poll(ctx, poll_id)?;

        let delegate = self.delegation.revoke(poll_id, ctx.sender)?;
        self.events.emit(
            ctx,
            PollEvent::DelegationRevoked {
                poll_id,
                delegator: ctx.sender,
                delegate,
            },
        );
        Ok(())
    }

    /// Adds caller funds to the poll's escrow; returns the new balance.
    pub fn top_up_escrow(&mut self, ctx: &TxContext, poll_id: PollId, amount: Amount) -> Result<Amount, PollError> {
        if self.poll(poll_id)?.finalization.is_some() {
            return Err(PollError::AlreadyFinalized(poll_id));
        }
        let balance = self.escrow.deposit(poll_id, ctx.sender, amount)?;
        self.events.emit(
            ctx,
            PollEvent::EscrowFunded {
                poll_id,
                payer: ctx.sender,
                amount,
                balance,
            },
        );
        Ok(balance)
    }

    // =========================================================================
    // FINALIZE
    // =========================================================================

    /// Evaluates an ended poll and mirrors its outcome to L1.
    ///
    /// Callable by anyone, once. On a successful hand-off the router fee, the
    /// caller's reward and the success fee are paid and the rest goes back to
    /// the creator. If the quote or the send fails the caller is still paid,
    /// the treasury keeps the failure fee and the creator gets the rest.
    pub fn finalize(&mut self, ctx: &TxContext, poll_id: PollId) -> Result<FinalizationRecord, PollError> {
        self.access.ensure_not_paused()?;
        let key = self.finalize_key(poll_id)?;
        let poll = self.poll(poll_id)?;
        if poll.finalization.is_some() {
            return Err(PollError::AlreadyFinalized(poll_id));
        }
        let status = poll.status(ctx.timestamp, self.ack_gate.ack_received(&key));
        if status != PollStatus::Ended {
            return Err(PollError::WrongStatus {
                poll_id,
                expected: PollStatus::Ended,
                actual: status,
            });
        }
        let outcome = poll.outcome();
        let creator = poll.creator;
        let payload = FinalizePayload {
            group_id: poll.group_id,
            poll_id,
            outcome,
        };

        let quote = self.messenger.quote(&payload);
        let reward = self.config.executor_reward;
        let available = self.escrow.balance_of(poll_id);
        let failure_plan = Settlement::on_failure(available, reward, self.config.failure_fee);
        let plan = match &quote {
            Ok(fee) => {
                Settlement::on_success(available, *fee, reward, self.config.success_fee_bps)
            }
            Err(_) => failure_plan,
        };
        let (Some(plan), Some(failure_plan)) = (plan, failure_plan) else {
            let required = match &quote {
                Ok(fee) => fee.saturating_add(reward),
                Err(_) => reward,
            };
            warn!(poll_id, required, available, "[qb-04] Finalize rejected, escrow too low");
            return Err(PollError::InsufficientEscrow {
                poll_id,
                required,
                available,
            });
        };

        // Validate payouts before any effect. Success payouts go to the same
        // recipients and total less.
        let treasury = self.config.treasury;
        self.escrow.check_settle(
            poll_id,
            &failure_plan.payouts(ctx.sender, treasury, creator),
        )?;
        let router = self.messenger.router_address();
        if let Ok(fee) = &quote {
            self.escrow.authorize_spend(poll_id, router, *fee)?;
        }

        // Effects: mark the attempt before the message leaves.
        self.poll_mut(poll_id)?.finalization = Some(FinalizationRecord {
            outcome,
            finalize_key: key,
            executor: ctx.sender,
            attempted_at: ctx.timestamp,
            transmission: Transmission::Pending,
            settlement: Settlement::default(),
        });
        self.events.emit(
            ctx,
            PollEvent::FinalizeRequested {
                poll_id,
                finalize_key: key,
                outcome,
                executor: ctx.sender,
            },
        );
        info!(poll_id, finalize_key = %key, ?outcome, executor = %ctx.sender, "[qb-04] Finalize requested");

        // Interactions.
        let sent = match quote {
            Ok(fee) => {
                let sent = self.messenger.transmit(&payload);
                let unspent = self.escrow.reclaim_allowance(poll_id, router)?;
                sent.map(|message_id| (message_id, fee - unspent))
            }
            Err(err) => Err(err),
        };

        let (transmission, settlement) = match sent {
            Ok((message_id, fee)) => {
                self.events.emit(
                    ctx,
                    PollEvent::MessageTransmitted {
                        poll_id,
                        finalize_key: key,
                        message_id,
                        fee,
                    },
                );
                let settlement = if fee == plan.bridge_fee {
                    plan
                } else {
                    Settlement::on_success(available, fee, reward, self.config.success_fee_bps)
                        .unwrap_or(plan)
                };
                (Transmission::Sent { message_id, fee }, settlement)
            }
            Err(err) => {
                warn!(poll_id, finalize_key = %key, error = %err, "[qb-04] Transmission failed, refunding escrow");
                let reason = err.to_string();
                self.events.emit(
                    ctx,
                    PollEvent::TransmissionFailed {
                        poll_id,
                        finalize_key: key,
                        reason: reason.clone(),
                    },
                );
                (Transmission::Failed { reason }, failure_plan)
            }
        };

        let record = FinalizationRecord {
            outcome,
            finalize_key: key,
            executor: ctx.sender,
            attempted_at: ctx.timestamp,
            transmission,
            settlement,
        };
        self.poll_mut(poll_id)?.finalization = Some(record.clone());

        self.escrow
            .settle(poll_id, &settlement.payouts(ctx.sender, treasury, creator))?;
        self.events.emit(ctx, PollEvent::EscrowSettled { poll_id, settlement });
        info!(
            poll_id,
            bridge_fee = settlement.bridge_fee,
            executor_reward = settlement.executor_reward,
            platform_fee = settlement.platform_fee,
            refund = settlement.refund,
            "[qb-04] Escrow settled"
        );
        Ok(record)
    }

    // =========================================================================
    // ACKNOWLEDGMENT
    // =========================================================================

    /// Bridge delivery entrypoint for acknowledgments.
    ///
    /// Not gated by pause: the L1 side already recorded the result.
    pub fn receive_ack(&mut self, ctx: &TxContext, message: &CrossChainMessage) -> Result<AckOutcome, PollError> {
        let router = self.messenger.router_address();
        let outcome = self.ack_gate.receive(ctx, router, message)?;
        if let AckOutcome::Recorded(payload) = outcome {
            let poll_id = self.keys.get(&payload.finalize_key).copied();
            if poll_id.is_none() {
                warn!(finalize_key = %payload.finalize_key, "[qb-04] Acknowledgment for unknown poll recorded");
            }
            info!(finalize_key = %payload.finalize_key, ?poll_id, "[qb-04] Acknowledgment received");
            self.events.emit(
                ctx,
                PollEvent::AckReceived {
                    finalize_key: payload.finalize_key,
                    origin_message_id: payload.origin_message_id,
                    poll_id,
                },
            );
        }
        Ok(outcome)
    }

    // =========================================================================
    // ADMINISTRATION
    // =========================================================================

    /// Sets the pause flag. Owner only.
    pub fn pause(&mut self, ctx: &TxContext) -> Result<(), PollError> {
        let event = self.access.pause(ctx.sender)?;
        self.events.emit(ctx, PollEvent::Admin(event));
        Ok(())
    }

    /// Clears the pause flag. Owner only.
    pub fn unpause(&mut self, ctx: &TxContext) -> Result<(), PollError> {
        let event = self.access.unpause(ctx.sender)?;
        self.events.emit(ctx, PollEvent::Admin(event));
        Ok(())
    }

    /// Moves the owner role. Owner only.
    pub fn transfer_ownership(&mut self, ctx: &TxContext, new_owner: Address) -> Result<(), PollError> {
        let event = self.access.transfer_ownership(ctx.sender, new_owner)?;
        self.events.emit(ctx, PollEvent::Admin(event));
        Ok(())
    }

    /// Allow-lists the L1 registry as acknowledgment source. Owner only.
    pub fn set_ack_source(&mut self, ctx: &TxContext, chain: ChainSelector, sender: Address) -> Result<(), PollError> {
        self.access.ensure_owner(ctx.sender)?;
        self.ack_gate.set_allowed_source(chain, sender)?;
        info!(%chain, %sender, "[qb-04] Acknowledgment source set");
        self.events
            .emit(ctx, PollEvent::AckSourceSet { chain, sender });
        Ok(())
    }

    /// Redirects finalize messages. Owner only.
    pub fn set_destination(&mut self, ctx: &TxContext, chain: ChainSelector, receiver: Address) -> Result<(), PollError> {
        self.access.ensure_owner(ctx.sender)?;
        let config = EngineConfig {
            destination_chain: chain,
            destination_receiver: receiver,
            ..self.config.clone()
        };
        config.validate()?;
        self.config = config;
        self.messenger.set_destination(chain, receiver);
        info!(%chain, %receiver, "[qb-04] Destination set");
        self.events
            .emit(ctx, PollEvent::DestinationSet { chain, receiver });
        Ok(())
    }

    /// Membership configuration entrypoints.
    pub fn membership_mut(&mut self) -> &mut MembershipRegistry {
        &mut self.membership
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// Contract address (holds escrow, sends messages).
    #[must_use]
    pub fn address(&self) -> Address {
        self.address
    }

    /// Current owner.
    #[must_use]
    pub fn owner(&self) -> Address {
        self.access.owner()
    }

    /// Pause flag.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.access.is_paused()
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Membership registry.
    #[must_use]
    pub fn membership(&self) -> &MembershipRegistry {
        &self.membership
    }

    /// Poll by id.
    pub fn poll(&self, poll_id: PollId) -> Result<&Poll, PollError> {
        self.polls.get(&poll_id).ok_or(PollError::PollNotFound(poll_id))
    }

    /// Number of polls created.
    #[must_use]
    pub fn poll_count(&self) -> u64 {
        self.next_poll_id - 1
    }

    /// Lifecycle status at `now`.
    pub fn poll_status(&self, poll_id: PollId, now: Timestamp) -> Result<PollStatus, PollError> {
        let poll = self.poll(poll_id)?;
        Ok(poll.status(now, self.ack_gate.ack_received(&poll.finalize_key())))
    }

    /// Weight per option.
    pub fn tallies(&self, poll_id: PollId) -> Result<Vec<u64>, PollError> {
        Ok(self.poll(poll_id)?.tallies.clone())
    }

    /// True if `voter` voted on `poll_id`.
    #[must_use]
    pub fn has_voted(&self, poll_id: PollId, voter: Address) -> bool {
        self.delegation.has_voted(poll_id, voter)
    }

    /// Vote cast by `voter`.
    #[must_use]
    pub fn vote_of(&self, poll_id: PollId, voter: Address) -> Option<Vote> {
        self.polls
            .get(&poll_id)
            .and_then(|poll| poll.votes.get(&voter).copied())
    }

    /// Active delegation of `delegator`.
    #[must_use]
    pub fn delegation_of(&self, poll_id: PollId, delegator: Address) -> Option<Delegation> {
        self.delegation.delegation_of(poll_id, delegator)
    }

    /// Addresses delegating to `delegate`.
    #[must_use]
    pub fn delegators_of(&self, poll_id: PollId, delegate: Address) -> Vec<Address> {
        self.delegation.delegators_of(poll_id, delegate)
    }

    /// Escrowed balance (0 for unknown polls).
    #[must_use]
    pub fn escrow_balance(&self, poll_id: PollId) -> Amount {
        self.escrow.balance_of(poll_id)
    }

    /// Cross-chain key of an existing poll.
    pub fn finalize_key(&self, poll_id: PollId) -> Result<FinalizeKey, PollError> {
        Ok(self.poll(poll_id)?.finalize_key())
    }

    /// Finalize attempt of `poll_id`, if any.
    #[must_use]
    pub fn finalization(&self, poll_id: PollId) -> Option<&FinalizationRecord> {
        self.polls
            .get(&poll_id)
            .and_then(|poll| poll.finalization.as_ref())
    }

    /// True once L1 acknowledged the poll's result.
    #[must_use]
    pub fn is_bridge_finalized(&self, poll_id: PollId) -> bool {
        self.polls
            .get(&poll_id)
            .is_some_and(|poll| self.ack_gate.ack_received(&poll.finalize_key()))
    }

    /// True once an acknowledgment for `key` was accepted.
    #[must_use]
    pub fn ack_received(&self, key: &FinalizeKey) -> bool {
        self.ack_gate.ack_received(key)
    }

    /// Acknowledgment gate (allow-list and records).
    #[must_use]
    pub fn ack_gate(&self) -> &AckGate {
        &self.ack_gate
    }

    /// Emitted events.
    #[must_use]
    pub fn events(&self) -> &[LoggedEvent<PollEvent>] {
        self.events.all()
    }

    /// Event log, for block-range queries.
    #[must_use]
    pub fn event_log(&self) -> &EventLog<PollEvent> {
        &self.events
    }

    fn poll_mut(&mut self, poll_id: PollId) -> Result<&mut Poll, PollError> {
        self.polls
            .get_mut(&poll_id)
            .ok_or(PollError::PollNotFound(poll_id))
    }

    fn active_poll(&self, ctx: &TxContext, poll_id: PollId) -> Result<&Poll, PollError> {
        let poll = self.poll(poll_id)?;
        let status = poll.status(ctx.timestamp, self.ack_gate.ack_received(&poll.finalize_key()));
        if status != PollStatus::Active {
            return Err(PollError::WrongStatus {
                poll_id,
                expected: PollStatus::Active,
                actual: status,
            });
        }
        Ok(poll)
    }

    fn ensure_member(&self, group_id: GroupId, account: Address) -> Result<(), PollError> {
        if !self.membership.is_member(group_id, account)? {
            return Err(PollError::NotMember { group_id, account });
        }
        Ok(())
    }
}

impl std::fmt::Debug for PollEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollEngine")
            .field("address", &self.address)
            .field("polls", &self.polls.len())
            .field("paused", &self.access.is_paused())
            .finish_non_exhaustive()
    }
}
