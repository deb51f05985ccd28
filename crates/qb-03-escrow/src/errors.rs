//! Escrow error types.

use shared_types::{Address, Amount, Classify, ErrorKind, PollId, TokenError};
use thiserror::Error;

/// Escrow account error type.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EscrowError {
    /// Escrow contract address is zero.
    #[error("escrow address cannot be zero")]
    ZeroAddress,

    /// Poll has no escrow slot.
    #[error("no escrow for poll {0}")]
    UnknownPoll(PollId),

    /// Payout addressed to the zero address.
    #[error("escrow payout recipient cannot be zero")]
    ZeroRecipient,

    /// Zero-value deposit.
    #[error("escrow amount must be non-zero")]
    ZeroAmount,

    /// Debit larger than the poll's balance.
    #[error("insufficient escrow for poll {poll_id}: requested {requested}, available {available}")]
    InsufficientEscrow {
        poll_id: PollId,
        requested: Amount,
        available: Amount,
    },

    /// Payer has not approved enough for the escrow to pull.
    #[error("insufficient allowance from {payer}: required {required}, approved {available}")]
    InsufficientAllowance {
        payer: Address,
        required: Amount,
        available: Amount,
    },

    /// Payer does not hold enough tokens.
    #[error("insufficient balance of {payer}: required {required}, available {available}")]
    InsufficientBalance {
        payer: Address,
        required: Amount,
        available: Amount,
    },

    /// Token ledger rejected a transfer.
    #[error("token transfer failed: {0}")]
    Token(#[from] TokenError),
}

impl Classify for EscrowError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::ZeroAddress => ErrorKind::Configuration,
            Self::ZeroAmount | Self::ZeroRecipient => ErrorKind::Validation,
            Self::UnknownPoll(_) => ErrorKind::StateConflict,
            Self::InsufficientEscrow { .. }
            | Self::InsufficientAllowance { .. }
            | Self::InsufficientBalance { .. }
            | Self::Token(_) => ErrorKind::Resource,
        }
    }
}
