//! # Finalization Protocol Payloads
//!
//! Wire payloads exchanged between the L2 poll engine and the L1 result
//! registry, plus the finalize key that correlates them.
//!
//! ```text
//! L2 ── FinalizePayload(group_id, poll_id, outcome) ──→ L1
//! L2 ←──── AckPayload(finalize_key, origin_message_id) ── L1
//! ```
//!
//! The finalize key is derived from content only. Transport-assigned message
//! ids travel in the acknowledgment as a reference, never as a lookup key.

use crate::abi::{self, AbiError};
use crate::primitives::{keccak256, GroupId, Hash, PollId};
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// FINALIZE KEY
// =============================================================================

/// `keccak256(abi.encode(group_id, poll_id))`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct FinalizeKey(pub Hash);

impl FinalizeKey {
    /// Derives the key for a `(group, poll)` pair.
    #[must_use]
    pub fn derive(group_id: GroupId, poll_id: PollId) -> Self {
        let encoded = abi::encode(&[U256::from(group_id), U256::from(poll_id)]);
        Self(keccak256(&encoded))
    }

    /// Underlying digest.
    #[must_use]
    pub const fn as_hash(&self) -> &Hash {
        &self.0
    }
}

impl fmt::Display for FinalizeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// =============================================================================
// POLL OUTCOME
// =============================================================================

/// Result of a poll as mirrored across chains.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PollOutcome {
    /// Option at this index won (ties go to the lowest index).
    Winner(u32),
    /// Quorum was enabled and not reached.
    QuorumFailed,
    /// No weight was cast at all.
    NoVotes,
}

impl PollOutcome {
    /// Wire word for `QuorumFailed`.
    pub const QUORUM_FAILED_WORD: U256 = U256::MAX;

    /// Encodes the outcome into its single-word wire form.
    #[must_use]
    pub fn to_word(self) -> U256 {
        match self {
            Self::Winner(index) => U256::from(index),
            Self::QuorumFailed => Self::QUORUM_FAILED_WORD,
            Self::NoVotes => U256::MAX - U256::one(),
        }
    }

    /// Decodes the single-word wire form.
    pub fn from_word(word: U256, index: usize) -> Result<Self, AbiError> {
        if word == Self::QUORUM_FAILED_WORD {
            Ok(Self::QuorumFailed)
        } else if word == U256::MAX - U256::one() {
            Ok(Self::NoVotes)
        } else if word <= U256::from(u32::MAX) {
            Ok(Self::Winner(word.low_u32()))
        } else {
            Err(AbiError::UnknownOutcome { index })
        }
    }

    /// True if the result counts (a winner was determined).
    #[must_use]
    pub fn is_quorate_winner(&self) -> bool {
        matches!(self, Self::Winner(_))
    }
}

// =============================================================================
// PAYLOADS
// =============================================================================

/// Outbound L2 → L1 payload: `(uint256 groupId, uint256 pollId, uint256 outcome)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizePayload {
    /// Group the poll belongs to.
    pub group_id: GroupId,
    /// Poll being finalized.
    pub poll_id: PollId,
    /// Locally computed outcome.
    pub outcome: PollOutcome,
}

impl FinalizePayload {
    const WORDS: usize = 3;

    /// Correlation key for this payload.
    #[must_use]
    pub fn key(&self) -> FinalizeKey {
        FinalizeKey::derive(self.group_id, self.poll_id)
    }

    /// ABI-encodes the payload.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        abi::encode(&[
            U256::from(self.group_id),
            U256::from(self.poll_id),
            self.outcome.to_word(),
        ])
    }

    /// Decodes an ABI-encoded payload.
    pub fn decode(data: &[u8]) -> Result<Self, AbiError> {
        let words = abi::decode(data, Self::WORDS)?;
        Ok(Self {
            group_id: abi::word_to_u64(words[0], 0)?,
            poll_id: abi::word_to_u64(words[1], 1)?,
            outcome: PollOutcome::from_word(words[2], 2)?,
        })
    }
}

/// Inbound L1 → L2 payload: `(bytes32 finalizeKey, bytes32 originMessageId)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AckPayload {
    /// Key of the poll being acknowledged.
    pub finalize_key: FinalizeKey,
    /// Bridge id of the finalize message that was recorded (reference only).
    pub origin_message_id: Hash,
}

impl AckPayload {
    const WORDS: usize = 2;

    /// ABI-encodes the payload.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        abi::encode(&[
            abi::hash_to_word(&self.finalize_key.0),
            abi::hash_to_word(&self.origin_message_id),
        ])
    }

    /// Decodes an ABI-encoded payload.
    pub fn decode(data: &[u8]) -> Result<Self, AbiError> {
        let words = abi::decode(data, Self::WORDS)?;
        Ok(Self {
            finalize_key: FinalizeKey(abi::word_to_hash(words[0])),
            origin_message_id: abi::word_to_hash(words[1]),
        })
    }
}
