//! # L2 Voting Service
//!
//! Wraps the engine with its chain's ledger. Transactions run under the
//! write lock, one at a time, against a fresh `TxContext`; the bridge
//! delivers acknowledgments through [`MessageReceiver`].

use crate::domain::{PollError, PollStatus};
use crate::engine::PollEngine;
use parking_lot::RwLock;
use shared_bus::{CrossChainMessage, DeliveryError, MessageReceiver};
use shared_types::{Address, Ledger, PollId, TxContext};
use std::sync::Arc;

/// The deployed L2 contract.
pub struct L2VotingService {
    ledger: Arc<Ledger>,
    engine: RwLock<PollEngine>,
}

impl L2VotingService {
    /// Deploys `engine` on `ledger`'s chain.
    pub fn new(ledger: Arc<Ledger>, engine: PollEngine) -> Self {
        Self {
            ledger,
            engine: RwLock::new(engine),
        }
    }

    /// Contract address.
    pub fn address(&self) -> Address {
        self.engine.read().address()
    }

    /// Chain clock.
    pub fn ledger(&self) -> &Arc<Ledger> {
        &self.ledger
    }

    /// Executes one transaction sent by `sender`.
    pub fn execute<R>(&self, sender: Address, f: impl FnOnce(&TxContext, &mut PollEngine) -> R) -> R {
        let ctx = self.ledger.context(sender);
        let mut engine = self.engine.write();
        f(&ctx, &mut engine)
    }

    /// Read-only access.
    pub fn view<R>(&self, f: impl FnOnce(&PollEngine) -> R) -> R {
        f(&self.engine.read())
    }

    /// Status at the current block time.
    pub fn poll_status(&self, poll_id: PollId) -> Result<PollStatus, PollError> {
        let now = self.ledger.timestamp();
        self.engine.read().poll_status(poll_id, now)
    }

    /// True once L1 acknowledged the poll.
    pub fn is_bridge_finalized(&self, poll_id: PollId) -> bool {
        self.engine.read().is_bridge_finalized(poll_id)
    }
}

impl MessageReceiver for L2VotingService {
    fn receive(&self, ctx: &TxContext, message: &CrossChainMessage) -> Result<(), DeliveryError> {
        self.engine
            .write()
            .receive_ack(ctx, message)
            .map(|_| ())
            .map_err(|err| DeliveryError::from_classified(&err))
    }
}
