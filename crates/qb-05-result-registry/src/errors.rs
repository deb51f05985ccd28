//! Result registry error types.

use shared_bus::BridgeError;
use shared_types::{
    AbiError, AccessError, Address, Amount, ChainSelector, Classify, ErrorKind, TokenError,
};
use thiserror::Error;

/// L1 result registry error type.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Zero address or selector in configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),

    /// Delivery not made by the local router.
    #[error("unauthorized router: {caller}, expected {expected}")]
    UnauthorizedRouter {
        /// Actual caller.
        caller: Address,
        /// Configured router.
        expected: Address,
    },

    /// Allowed source never configured.
    #[error("allowed source not configured")]
    SourceNotConfigured,

    /// Message from a source that is not allow-listed.
    #[error("message from disallowed source {sender} on {chain}")]
    ProvenanceRejected {
        /// Source chain.
        chain: ChainSelector,
        /// Source sender.
        sender: Address,
    },

    /// Acknowledgment target never configured.
    #[error("acknowledgment target not configured")]
    AckTargetNotConfigured,

    /// Registry cannot pay the acknowledgment fee.
    #[error("insufficient fee balance: required {required}, available {available}")]
    InsufficientFeeBalance {
        /// Quoted fee.
        required: Amount,
        /// Registry token balance.
        available: Amount,
    },

    /// Owner/pause check failed.
    #[error(transparent)]
    Access(#[from] AccessError),

    /// Bridge rejected the acknowledgment.
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    /// Fee token rejected an approval.
    #[error(transparent)]
    Token(#[from] TokenError),

    /// Payload was malformed.
    #[error("malformed payload: {0}")]
    Abi(#[from] AbiError),
}

impl Classify for RegistryError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidConfig(_) => ErrorKind::Configuration,
            Self::UnauthorizedRouter { .. } => ErrorKind::Authorization,
            Self::SourceNotConfigured | Self::ProvenanceRejected { .. } => ErrorKind::Provenance,
            Self::AckTargetNotConfigured => ErrorKind::Configuration,
            Self::InsufficientFeeBalance { .. } => ErrorKind::Resource,
            Self::Abi(_) => ErrorKind::Validation,
            Self::Access(err) => err.kind(),
            Self::Bridge(err) => err.kind(),
            Self::Token(err) => err.kind(),
        }
    }
}
