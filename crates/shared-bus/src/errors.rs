//! # Bridge Errors

use shared_types::{Address, Amount, ChainSelector, Classify, ErrorKind, Hash, TokenError};
use thiserror::Error;

/// Errors raised by routers and the bridge network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    /// Router has no lane to the destination.
    #[error("unsupported destination chain: {0}")]
    UnsupportedDestination(ChainSelector),

    /// Router is halted (transport outage).
    #[error("router on {0} is halted")]
    RouterHalted(ChainSelector),

    /// Receiver address is zero.
    #[error("invalid receiver address")]
    InvalidReceiver,

    /// Fee could not be pulled from the sender.
    #[error("fee payment of {fee} failed: {source}")]
    FeePayment {
        /// Quoted fee.
        fee: Amount,
        /// Underlying token error.
        source: TokenError,
    },

    /// Destination chain was never registered with the network.
    #[error("chain {0} is not registered with the bridge")]
    ChainNotRegistered(ChainSelector),

    /// No receiver registered for the destination address.
    #[error("no receiver {receiver} on {chain}")]
    UnknownReceiver {
        /// Destination chain.
        chain: ChainSelector,
        /// Destination address.
        receiver: Address,
    },

    /// Message id unknown to the network.
    #[error("message not found: {0:?}")]
    MessageNotFound(Hash),
}

impl Classify for BridgeError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::FeePayment { .. } => ErrorKind::Resource,
            Self::InvalidReceiver => ErrorKind::Validation,
            _ => ErrorKind::Transport,
        }
    }
}

/// Rejection reported by a receiving contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} rejection: {reason}")]
pub struct DeliveryError {
    /// Error class of the rejection.
    pub kind: ErrorKind,
    /// Human-readable reason.
    pub reason: String,
}

impl DeliveryError {
    /// Wraps any classified receiver error.
    pub fn from_classified<E: Classify + std::fmt::Display>(err: &E) -> Self {
        Self {
            kind: err.kind(),
            reason: err.to_string(),
        }
    }
}
