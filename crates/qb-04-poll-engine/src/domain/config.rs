//! Engine configuration.

use super::errors::PollError;
use serde::{Deserialize, Serialize};
use shared_types::{Address, Amount, ChainSelector, BPS_DENOMINATOR};

/// Fee and routing configuration of the poll engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Receives success and failure fees.
    pub treasury: Address,
    /// Success fee in basis points of the escrow left after the bridge fee
    /// and executor reward.
    pub success_fee_bps: u64,
    /// Flat fee kept when transmission fails.
    pub failure_fee: Amount,
    /// Paid to whoever calls finalize.
    pub executor_reward: Amount,
    /// L1 chain selector.
    pub destination_chain: ChainSelector,
    /// L1 result registry address.
    pub destination_receiver: Address,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            treasury: Address::from_low_u64(0x7EA5),
            success_fee_bps: 250,
            failure_fee: 10_000,
            executor_reward: 20_000,
            destination_chain: ChainSelector(1),
            destination_receiver: Address::from_low_u64(0x1E6),
        }
    }
}

impl EngineConfig {
    /// Rejects zero addresses, a zero selector and fees above 100%.
    pub fn validate(&self) -> Result<(), PollError> {
        if self.treasury.is_zero() {
            return Err(PollError::InvalidConfig("treasury is the zero address".into()));
        }
        if self.destination_receiver.is_zero() {
            return Err(PollError::InvalidConfig(
                "destination receiver is the zero address".into(),
            ));
        }
        if self.destination_chain.is_zero() {
            return Err(PollError::InvalidConfig("destination chain selector is zero".into()));
        }
        if self.success_fee_bps > BPS_DENOMINATOR {
            return Err(PollError::InvalidConfig(format!(
                "success fee {} bps exceeds {}",
                self.success_fee_bps, BPS_DENOMINATOR
            )));
        }
        Ok(())
    }
}
