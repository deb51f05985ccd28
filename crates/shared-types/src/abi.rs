//! # ABI Word Codec
//!
//! Canonical, versionless encoding of static tuples: every element is one
//! 32-byte big-endian word, concatenated in declaration order. Both chains use
//! this layout, so `encode(&[a, b])` here equals `abi.encode(a, b)` on an EVM.

use crate::primitives::Hash;
use primitive_types::U256;
use thiserror::Error;

/// Size of one ABI word in bytes.
pub const WORD_SIZE: usize = 32;

/// ABI decoding errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbiError {
    /// Payload length is not exactly `words * 32`.
    #[error("invalid payload length: expected {expected} bytes, got {got}")]
    InvalidLength {
        /// Expected byte length.
        expected: usize,
        /// Actual byte length.
        got: usize,
    },

    /// A word does not fit the target integer type.
    #[error("word {index} overflows {target}")]
    Overflow {
        /// Word position in the tuple.
        index: usize,
        /// Target type name.
        target: &'static str,
    },

    /// A word does not map to a known poll outcome.
    #[error("unknown outcome word at index {index}")]
    UnknownOutcome {
        /// Word position in the tuple.
        index: usize,
    },
}

/// Encodes a static tuple of words.
#[must_use]
pub fn encode(words: &[U256]) -> Vec<u8> {
    let mut out = vec![0u8; words.len() * WORD_SIZE];
    for (i, word) in words.iter().enumerate() {
        word.to_big_endian(&mut out[i * WORD_SIZE..(i + 1) * WORD_SIZE]);
    }
    out
}

/// Decodes exactly `count` words. Trailing or missing bytes are rejected.
pub fn decode(data: &[u8], count: usize) -> Result<Vec<U256>, AbiError> {
    let expected = count * WORD_SIZE;
    if data.len() != expected {
        return Err(AbiError::InvalidLength {
            expected,
            got: data.len(),
        });
    }
    Ok(data
        .chunks_exact(WORD_SIZE)
        .map(U256::from_big_endian)
        .collect())
}

/// Narrows a word to `u64`.
pub fn word_to_u64(word: U256, index: usize) -> Result<u64, AbiError> {
    if word > U256::from(u64::MAX) {
        return Err(AbiError::Overflow {
            index,
            target: "u64",
        });
    }
    Ok(word.low_u64())
}

/// Reinterprets a `bytes32` value as a word.
#[must_use]
pub fn hash_to_word(hash: &Hash) -> U256 {
    U256::from_big_endian(&hash.0)
}

/// Reinterprets a word as a `bytes32` value.
#[must_use]
pub fn word_to_hash(word: U256) -> Hash {
    let mut bytes = [0u8; 32];
    word.to_big_endian(&mut bytes);
    Hash(bytes)
}
