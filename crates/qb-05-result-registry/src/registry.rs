//! # L1 Result Registry
//!
//! Receives finalize messages from the L2 engine, records each
//! `(group, poll)` result once and acknowledges it back to L2.
//!
//! The bridge does not authenticate payloads, so the only trust anchor is
//! the `(source_chain, sender)` pair, which must equal the allow-listed pair
//! exactly. Redelivered messages for a recorded key are no-ops.

use crate::errors::RegistryError;
use serde::{Deserialize, Serialize};
use shared_bus::{BridgeError, CrossChainMessage, MessageRouter};
use shared_types::{
    AccessControl, AckPayload, AdminEvent, Address, Amount, ChainSelector, EventLog, FeeToken,
    FinalizeKey, FinalizePayload, GroupId, Hash, LoggedEvent, PollId, PollOutcome, Timestamp,
    TxContext,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Mirrored result of one poll. `Default` is the unknown-key answer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    /// L2 group.
    pub group_id: GroupId,
    /// L2 poll.
    pub poll_id: PollId,
    /// Write-once flag.
    pub recorded: bool,
    /// Outcome carried by the finalize message.
    pub outcome: Option<PollOutcome>,
    /// Bridge id of the finalize message (reference only).
    pub origin_message_id: Hash,
    /// Bridge id of the acknowledgment sent back.
    pub ack_message_id: Hash,
    /// L1 block time of recording.
    pub recorded_at: Timestamp,
}

/// Result of an accepted delivery.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReceiveOutcome {
    /// First valid message for the key; acknowledgment sent.
    Recorded {
        /// Correlation key.
        finalize_key: FinalizeKey,
        /// Bridge id of the acknowledgment.
        ack_message_id: Hash,
    },
    /// Key already recorded; nothing changed.
    Duplicate(FinalizeKey),
}

/// Events emitted by the registry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistryEvent {
    /// Result recorded.
    ResultRecorded {
        /// Correlation key.
        finalize_key: FinalizeKey,
        /// L2 group.
        group_id: GroupId,
        /// L2 poll.
        poll_id: PollId,
        /// Outcome.
        outcome: PollOutcome,
        /// Finalize message id.
        origin_message_id: Hash,
    },
    /// Redelivery of a recorded key.
    DuplicateIgnored {
        /// Correlation key.
        finalize_key: FinalizeKey,
        /// Redelivered message id.
        message_id: Hash,
    },
    /// Acknowledgment handed to the router.
    AckSent {
        /// Correlation key.
        finalize_key: FinalizeKey,
        /// Acknowledgment message id.
        ack_message_id: Hash,
        /// Router fee paid.
        fee: Amount,
    },
    /// Inbound allow-list changed.
    AllowedSourceSet {
        /// Allowed chain.
        chain: ChainSelector,
        /// Allowed sender.
        sender: Address,
    },
    /// Acknowledgment destination changed.
    AckTargetSet {
        /// L2 chain.
        chain: ChainSelector,
        /// L2 receiver.
        receiver: Address,
    },
    /// Pause, unpause or ownership change.
    Admin(AdminEvent),
}

/// The L1 registry contract.
pub struct ResultRegistry {
    address: Address,
    access: AccessControl,
    router: Arc<dyn MessageRouter>,
    fee_token: Arc<FeeToken>,
    allowed_source: Option<(ChainSelector, Address)>,
    ack_target: Option<(ChainSelector, Address)>,
    records: HashMap<FinalizeKey, ResultRecord>,
    events: EventLog<RegistryEvent>,
}

impl ResultRegistry {
    /// Deploys the registry at `address`. Acknowledgment fees are paid from
    /// the registry's own fee-token balance.
    pub fn new(
        address: Address,
        owner: Address,
        router: Arc<dyn MessageRouter>,
        fee_token: Arc<FeeToken>,
    ) -> Result<Self, RegistryError> {
        if address.is_zero() {
            return Err(RegistryError::InvalidConfig("registry address is zero"));
        }
        let access = AccessControl::new(owner)?;
        info!(%address, %owner, "[qb-05] Result registry deployed");
        Ok(Self {
            address,
            access,
            router,
            fee_token,
            allowed_source: None,
            ack_target: None,
            records: HashMap::new(),
            events: EventLog::new(),
        })
    }

    /// Bridge delivery entrypoint for finalize messages.
    ///
    /// A failed acknowledgment send rejects the whole delivery, so nothing
    /// is recorded and the bridge can re-execute it later.
    pub fn receive(&mut self, ctx: &TxContext, message: &CrossChainMessage) -> Result<ReceiveOutcome, RegistryError> {
        let router = self.router.address();
        if ctx.sender != router {
            return Err(RegistryError::UnauthorizedRouter {
                caller: ctx.sender,
                expected: router,
            });
        }
        self.access.ensure_not_paused()?;
        let (chain, sender) = self
            .allowed_source
            .ok_or(RegistryError::SourceNotConfigured)?;
        if message.source_chain != chain || message.sender != sender {
            warn!(
                source = %message.source_chain,
                sender = %message.sender,
                "[qb-05] Message from disallowed source rejected"
            );
            return Err(RegistryError::ProvenanceRejected {
                chain: message.source_chain,
                sender: message.sender,
            });
        }
        let payload = FinalizePayload::decode(&message.data)?;
        let finalize_key = payload.key();

        if self.is_recorded_key(&finalize_key) {
            debug!(%finalize_key, "[qb-05] Duplicate finalize ignored");
            self.events.emit(
                ctx,
                RegistryEvent::DuplicateIgnored {
                    finalize_key,
                    message_id: message.message_id,
                },
            );
            return Ok(ReceiveOutcome::Duplicate(finalize_key));
        }

        let (ack_chain, ack_receiver) = self
            .ack_target
            .ok_or(RegistryError::AckTargetNotConfigured)?;
        let ack = AckPayload {
            finalize_key,
            origin_message_id: message.message_id,
        }
        .encode();
        let fee = self.router.get_fee(ack_chain, &ack)?;
        let available = self.fee_token.balance_of(self.address);
        if available < fee {
            return Err(RegistryError::InsufficientFeeBalance {
                required: fee,
                available,
            });
        }

        // Effects before the send.
        self.records.insert(
            finalize_key,
            ResultRecord {
                group_id: payload.group_id,
                poll_id: payload.poll_id,
                recorded: true,
                outcome: Some(payload.outcome),
                origin_message_id: message.message_id,
                ack_message_id: Hash::ZERO,
                recorded_at: ctx.timestamp,
            },
        );

        let sent = self
            .fee_token
            .approve(self.address, router, fee)
            .map_err(|source| BridgeError::FeePayment { fee, source })
            .and_then(|()| self.router.send(self.address, ack_chain, ack_receiver, ack));
        let ack_message_id = match sent {
            Ok(id) => id,
            Err(err) => {
                self.records.remove(&finalize_key);
                self.fee_token.approve(self.address, router, 0)?;
                warn!(%finalize_key, error = %err, "[qb-05] Acknowledgment send failed, delivery reverted");
                return Err(err.into());
            }
        };
        if let Some(record) = self.records.get_mut(&finalize_key) {
            record.ack_message_id = ack_message_id;
        }

        info!(
            %finalize_key,
            group_id = payload.group_id,
            poll_id = payload.poll_id,
            outcome = ?payload.outcome,
            "[qb-05] Result recorded and acknowledged"
        );
        self.events.emit(
            ctx,
            RegistryEvent::ResultRecorded {
                finalize_key,
                group_id: payload.group_id,
                poll_id: payload.poll_id,
                outcome: payload.outcome,
                origin_message_id: message.message_id,
            },
        );
        self.events.emit(
            ctx,
            RegistryEvent::AckSent {
                finalize_key,
                ack_message_id,
                fee,
            },
        );
        Ok(ReceiveOutcome::Recorded {
            finalize_key,
            ack_message_id,
        })
    }

    // =========================================================================
    // ADMINISTRATION
    // =========================================================================

    /// Allow-lists the L2 engine. Owner only.
    pub fn set_allowed_source(&mut self, ctx: &TxContext, chain: ChainSelector, sender: Address) -> Result<(), RegistryError> {
        self.access.ensure_owner(ctx.sender)?;
        if chain.is_zero() || sender.is_zero() {
            return Err(RegistryError::InvalidConfig("allowed source needs a chain and a sender"));
        }
        self.allowed_source = Some((chain, sender));
        info!(%chain, %sender, "[qb-05] Allowed source set");
        self.events
            .emit(ctx, RegistryEvent::AllowedSourceSet { chain, sender });
        Ok(())
    }

    /// Sets where acknowledgments go. Owner only.
    pub fn set_ack_target(&mut self, ctx: &TxContext, chain: ChainSelector, receiver: Address) -> Result<(), RegistryError> {
        self.access.ensure_owner(ctx.sender)?;
        if chain.is_zero() || receiver.is_zero() {
            return Err(RegistryError::InvalidConfig("ack target needs a chain and a receiver"));
        }
        self.ack_target = Some((chain, receiver));
        info!(%chain, %receiver, "[qb-05] Acknowledgment target set");
        self.events
            .emit(ctx, RegistryEvent::AckTargetSet { chain, receiver });
        Ok(())
    }

    /// Sets the pause flag. Owner only.
    pub fn pause(&mut self, ctx: &TxContext) -> Result<(), RegistryError> {
        let event = self.access.pause(ctx.sender)?;
        self.events.emit(ctx, RegistryEvent::Admin(event));
        Ok(())
    }

    /// Clears the pause flag. Owner only.
    pub fn unpause(&mut self, ctx: &TxContext) -> Result<(), RegistryError> {
        let event = self.access.unpause(ctx.sender)?;
        self.events.emit(ctx, RegistryEvent::Admin(event));
        Ok(())
    }

    /// Moves the owner role. Owner only.
    pub fn transfer_ownership(&mut self, ctx: &TxContext, new_owner: Address) -> Result<(), RegistryError> {
        let event = self.access.transfer_ownership(ctx.sender, new_owner)?;
        self.events.emit(ctx, RegistryEvent::Admin(event));
        Ok(())
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// Contract address.
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

    /// Allowed inbound source.
    #[must_use]
    pub fn allowed_source(&self) -> Option<(ChainSelector, Address)> {
        self.allowed_source
    }

    /// Acknowledgment destination.
    #[must_use]
    pub fn ack_target(&self) -> Option<(ChainSelector, Address)> {
        self.ack_target
    }

    /// True once `(group_id, poll_id)` was recorded. False for unknown pairs.
    #[must_use]
    pub fn is_recorded(&self, group_id: GroupId, poll_id: PollId) -> bool {
        self.is_recorded_key(&FinalizeKey::derive(group_id, poll_id))
    }

    /// Record of `(group_id, poll_id)`, or the zero record.
    #[must_use]
    pub fn get_record(&self, group_id: GroupId, poll_id: PollId) -> ResultRecord {
        self.records
            .get(&FinalizeKey::derive(group_id, poll_id))
            .cloned()
            .unwrap_or_default()
    }

    /// Number of recorded results.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Emitted events.
    #[must_use]
    pub fn events(&self) -> &[LoggedEvent<RegistryEvent>] {
        self.events.all()
    }

    /// Event log, for block-range queries.
    #[must_use]
    pub fn event_log(&self) -> &EventLog<RegistryEvent> {
        &self.events
    }

    fn is_recorded_key(&self, key: &FinalizeKey) -> bool {
        self.records.get(key).is_some_and(|record| record.recorded)
    }
}

impl std::fmt::Debug for ResultRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultRegistry")
            .field("address", &self.address)
            .field("records", &self.records.len())
            .field("paused", &self.access.is_paused())
            .finish_non_exhaustive()
    }
}
