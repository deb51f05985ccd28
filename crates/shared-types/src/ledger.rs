//! # Chain Ledger
//!
//! Per-chain clock and transaction context. Every state-changing call on a
//! chain executes against a `TxContext` snapshot taken from that chain's
//! ledger, so "now" is always the block timestamp of the executing chain.

use crate::primitives::{Address, BlockNumber, ChainSelector, Timestamp};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Execution context of one transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxContext {
    /// Immediate caller (`msg.sender`).
    pub sender: Address,
    /// Chain executing the call.
    pub chain: ChainSelector,
    /// Block timestamp.
    pub timestamp: Timestamp,
    /// Block height.
    pub block_number: BlockNumber,
}

#[derive(Clone, Copy, Debug)]
struct ClockState {
    timestamp: Timestamp,
    block_number: BlockNumber,
}

/// Block clock of a single chain.
#[derive(Debug)]
pub struct Ledger {
    selector: ChainSelector,
    block_time_secs: u64,
    clock: RwLock<ClockState>,
}

impl Ledger {
    /// Creates a ledger at block 1 with the given genesis timestamp.
    #[must_use]
    pub fn new(selector: ChainSelector, genesis_timestamp: Timestamp, block_time_secs: u64) -> Self {
        Self {
            selector,
            block_time_secs: block_time_secs.max(1),
            clock: RwLock::new(ClockState {
                timestamp: genesis_timestamp,
                block_number: 1,
            }),
        }
    }

    /// Chain selector.
    #[must_use]
    pub fn selector(&self) -> ChainSelector {
        self.selector
    }

    /// Current block timestamp.
    #[must_use]
    pub fn timestamp(&self) -> Timestamp {
        self.clock.read().timestamp
    }

    /// Current block height.
    #[must_use]
    pub fn block_number(&self) -> BlockNumber {
        self.clock.read().block_number
    }

    /// Moves the clock forward, producing at least one block.
    pub fn advance_time(&self, secs: u64) {
        let mut clock = self.clock.write();
        clock.timestamp += secs;
        clock.block_number += (secs / self.block_time_secs).max(1);
    }

    /// Produces one block.
    pub fn mine_block(&self) {
        self.advance_time(self.block_time_secs);
    }

    /// Snapshot context for a call made by `sender`.
    #[must_use]
    pub fn context(&self, sender: Address) -> TxContext {
        let clock = *self.clock.read();
        TxContext {
            sender,
            chain: self.selector,
            timestamp: clock.timestamp,
            block_number: clock.block_number,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_time_produces_blocks() {
        let ledger = Ledger::new(ChainSelector(10), 1_000, 2);
        ledger.advance_time(10);
        assert_eq!(ledger.timestamp(), 1_010);
        assert_eq!(ledger.block_number(), 6);

        // Sub-block advances still produce a block.
        ledger.advance_time(1);
        assert_eq!(ledger.block_number(), 7);
    }

    #[test]
    fn test_context_snapshot() {
        let ledger = Ledger::new(ChainSelector(10), 500, 12);
        let sender = Address::from_low_u64(3);
        let ctx = ledger.context(sender);
        assert_eq!(ctx.sender, sender);
        assert_eq!(ctx.timestamp, 500);
        assert_eq!(ctx.chain, ChainSelector(10));
    }
}
