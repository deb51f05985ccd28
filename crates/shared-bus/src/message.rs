//! # Cross-Chain Message Envelope
//!
//! The bridge carries opaque payloads. Everything the receiver can trust about
//! provenance is the `(source_chain, sender)` pair stamped by the source-side
//! router; the payload itself is unauthenticated.

use serde::{Deserialize, Serialize};
use shared_types::{Address, Amount, BlockNumber, ChainSelector, Hash};

/// A message in flight between two chains.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossChainMessage {
    /// Transport-assigned id. Reference only, never a correlation key.
    pub message_id: Hash,
    /// Chain the message was sent from.
    pub source_chain: ChainSelector,
    /// Contract that sent the message on the source chain.
    pub sender: Address,
    /// Destination chain.
    pub dest_chain: ChainSelector,
    /// Receiving contract on the destination chain.
    pub receiver: Address,
    /// ABI-encoded payload.
    pub data: Vec<u8>,
    /// Fee paid to the source router.
    pub fee_paid: Amount,
    /// Source block the message was sent in.
    pub sent_at_block: BlockNumber,
}

/// Result of one delivery attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Receiver accepted the message.
    Delivered {
        /// Message id.
        message_id: Hash,
    },
    /// Receiver rejected the message; it was moved to the dead-letter queue.
    DeadLettered {
        /// Message id.
        message_id: Hash,
        /// Rejection reason reported by the receiver.
        reason: String,
    },
}

impl DeliveryOutcome {
    /// True for `Delivered`.
    #[must_use]
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }
}

/// A rejected message kept for inspection and manual re-execution.
#[derive(Clone, Debug)]
pub struct DeadLetter {
    /// The rejected message.
    pub message: CrossChainMessage,
    /// Last rejection reason.
    pub reason: String,
    /// Number of failed delivery attempts.
    pub attempts: u32,
}
