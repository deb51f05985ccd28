//! # Cross-Chain Messenger
//!
//! L2 outbound side: packages a finalize payload and hands it to the router.
//! The router pulls its fee from the engine address, so the engine must have
//! approved the router for the quoted fee before `transmit`.

use shared_bus::{BridgeError, MessageRouter};
use shared_types::{Address, Amount, ChainSelector, FinalizePayload, Hash};
use std::sync::Arc;
use tracing::info;

/// Outbound finalize sender.
pub struct CrossChainMessenger {
    router: Arc<dyn MessageRouter>,
    sender: Address,
    destination_chain: ChainSelector,
    destination_receiver: Address,
}

impl CrossChainMessenger {
    /// Creates a messenger sending as `sender` through `router`.
    pub fn new(
        router: Arc<dyn MessageRouter>,
        sender: Address,
        destination_chain: ChainSelector,
        destination_receiver: Address,
    ) -> Self {
        Self {
            router,
            sender,
            destination_chain,
            destination_receiver,
        }
    }

    /// Router address (spender of the fee allowance).
    #[must_use]
    pub fn router_address(&self) -> Address {
        self.router.address()
    }

    /// Destination chain selector.
    #[must_use]
    pub fn destination_chain(&self) -> ChainSelector {
        self.destination_chain
    }

    /// Destination receiver.
    #[must_use]
    pub fn destination_receiver(&self) -> Address {
        self.destination_receiver
    }

    /// Redirects future messages.
    pub fn set_destination(&mut self, chain: ChainSelector, receiver: Address) {
        self.destination_chain = chain;
        self.destination_receiver = receiver;
    }

    /// Router fee for `payload`.
    pub fn quote(&self, payload: &FinalizePayload) -> Result<Amount, BridgeError> {
        self.router.get_fee(self.destination_chain, &payload.encode())
    }

    /// Sends `payload`; returns the transport-assigned message id.
    pub fn transmit(&self, payload: &FinalizePayload) -> Result<Hash, BridgeError> {
        let message_id = self.router.send(
            self.sender,
            self.destination_chain,
            self.destination_receiver,
            payload.encode(),
        )?;
        info!(
            group_id = payload.group_id,
            poll_id = payload.poll_id,
            finalize_key = %payload.key(),
            dest = %self.destination_chain,
            "[qb-04] Finalize message transmitted"
        );
        Ok(message_id)
    }
}
