//! # Acknowledgment Gate
//!
//! L2 inbound side. Only the local router may deliver, and only messages
//! whose `(source_chain, sender)` equals the configured allow-list entry are
//! accepted. Acknowledgments are keyed by finalize key and written once.

use crate::domain::PollError;
use shared_bus::CrossChainMessage;
use shared_types::{AckPayload, Address, ChainSelector, FinalizeKey, Hash, Timestamp, TxContext};
use std::collections::HashMap;
use tracing::{debug, warn};

/// A recorded acknowledgment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AckRecord {
    /// L1 message id of the recorded finalize (reference only).
    pub origin_message_id: Hash,
    /// Transport id of the acknowledgment itself.
    pub ack_message_id: Hash,
    /// L2 block time of receipt.
    pub received_at: Timestamp,
}

/// Result of an accepted delivery.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AckOutcome {
    /// First acknowledgment for the key.
    Recorded(AckPayload),
    /// Redelivery; nothing changed.
    Duplicate(FinalizeKey),
}

/// Provenance check plus write-once acknowledgment store.
#[derive(Debug, Default)]
pub struct AckGate {
    allowed_source: Option<(ChainSelector, Address)>,
    received: HashMap<FinalizeKey, AckRecord>,
}

impl AckGate {
    /// Creates a gate with no allowed source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the allowed `(chain, sender)` pair.
    pub fn set_allowed_source(&mut self, chain: ChainSelector, sender: Address) -> Result<(), PollError> {
        if chain.is_zero() || sender.is_zero() {
            return Err(PollError::InvalidConfig(
                "acknowledgment source needs a non-zero chain and sender".into(),
            ));
        }
        self.allowed_source = Some((chain, sender));
        Ok(())
    }

    /// Currently allowed source.
    #[must_use]
    pub fn allowed_source(&self) -> Option<(ChainSelector, Address)> {
        self.allowed_source
    }

    /// Validates and records an acknowledgment delivered by `router`.
    pub fn receive(
        &mut self,
        ctx: &TxContext,
        router: Address,
        message: &CrossChainMessage,
    ) -> Result<AckOutcome, PollError> {
        if ctx.sender != router {
            return Err(PollError::UnauthorizedRouter {
                caller: ctx.sender,
                expected: router,
            });
        }
        let (chain, sender) = self
            .allowed_source
            .ok_or(PollError::AckSourceNotConfigured)?;
        if message.source_chain != chain || message.sender != sender {
            warn!(
                source = %message.source_chain,
                sender = %message.sender,
                "[qb-04] Acknowledgment from disallowed source rejected"
            );
            return Err(PollError::ProvenanceRejected {
                chain: message.source_chain,
                sender: message.sender,
            });
        }
        let payload = AckPayload::decode(&message.data)?;

        if self.received.contains_key(&payload.finalize_key) {
            debug!(finalize_key = %payload.finalize_key, "[qb-04] Duplicate acknowledgment ignored");
            return Ok(AckOutcome::Duplicate(payload.finalize_key));
        }
        self.received.insert(
            payload.finalize_key,
            AckRecord {
                origin_message_id: payload.origin_message_id,
                ack_message_id: message.message_id,
                received_at: ctx.timestamp,
            },
        );
        Ok(AckOutcome::Recorded(payload))
    }

    /// True once an acknowledgment for `key` was accepted.
    #[must_use]
    pub fn ack_received(&self, key: &FinalizeKey) -> bool {
        self.received.contains_key(key)
    }

    /// Stored acknowledgment for `key`.
    #[must_use]
    pub fn record(&self, key: &FinalizeKey) -> Option<&AckRecord> {
        self.received.get(key)
    }
}
