//! # Router
//!
//! Source-side entrypoint of the bridge. A contract quotes a fee, approves the
//! router for it on the fee token, then calls `send`. The fee pull and the
//! enqueue happen together: either both succeed or nothing moves.

use crate::errors::BridgeError;
use crate::message::CrossChainMessage;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use shared_types::{
    keccak256, Address, Amount, ChainSelector, FeeToken, Hash, Ledger,
};
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// Outbound port used by contracts to emit cross-chain messages.
pub trait MessageRouter: Send + Sync {
    /// Router contract address (the `msg.sender` seen by receivers).
    fn address(&self) -> Address;

    /// Chain this router lives on.
    fn chain(&self) -> ChainSelector;

    /// Whether a lane to `dest` exists.
    fn is_chain_supported(&self, dest: ChainSelector) -> bool;

    /// Fee for sending `data` to `dest`, in fee-token units.
    fn get_fee(&self, dest: ChainSelector, data: &[u8]) -> Result<Amount, BridgeError>;

    /// Pulls the fee from `sender` and enqueues the message.
    ///
    /// `sender` must have approved this router for at least the quoted fee.
    fn send(
        &self,
        sender: Address,
        dest: ChainSelector,
        receiver: Address,
        data: Vec<u8>,
    ) -> Result<Hash, BridgeError>;
}

/// Linear fee schedule: `base_fee + fee_per_byte * len(data)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// Flat component.
    pub base_fee: Amount,
    /// Per payload byte.
    pub fee_per_byte: Amount,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            base_fee: 50_000,
            fee_per_byte: 100,
        }
    }
}

impl FeeSchedule {
    /// Fee for a payload of `len` bytes.
    #[must_use]
    pub fn quote(&self, len: usize) -> Amount {
        self.base_fee + self.fee_per_byte * len as Amount
    }
}

/// Messages accepted by any router and not yet delivered.
#[derive(Debug, Default)]
pub struct Outbox {
    queue: Mutex<VecDeque<CrossChainMessage>>,
}

impl Outbox {
    /// Creates an empty outbox.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message.
    pub fn push(&self, message: CrossChainMessage) {
        self.queue.lock().push_back(message);
    }

    /// Removes the oldest message.
    pub fn pop(&self) -> Option<CrossChainMessage> {
        self.queue.lock().pop_front()
    }

    /// Snapshot of pending messages, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<CrossChainMessage> {
        self.queue.lock().iter().cloned().collect()
    }

    /// Number of pending messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    /// True if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    /// Rearranges pending messages in place.
    pub fn reorder(&self, f: impl FnOnce(&mut Vec<CrossChainMessage>)) {
        let mut queue = self.queue.lock();
        let mut pending: Vec<_> = queue.drain(..).collect();
        f(&mut pending);
        queue.extend(pending);
    }
}

/// In-memory router for one chain.
pub struct InMemoryRouter {
    address: Address,
    ledger: Arc<Ledger>,
    fee_token: Arc<FeeToken>,
    fee_vault: Address,
    schedule: FeeSchedule,
    lanes: HashSet<ChainSelector>,
    outbox: Arc<Outbox>,
    nonce: Mutex<u64>,
    halted: AtomicBool,
}

impl InMemoryRouter {
    /// Creates a router that collects fees into `fee_vault`.
    #[must_use]
    pub fn new(
        address: Address,
        ledger: Arc<Ledger>,
        fee_token: Arc<FeeToken>,
        fee_vault: Address,
        schedule: FeeSchedule,
        outbox: Arc<Outbox>,
    ) -> Self {
        Self {
            address,
            ledger,
            fee_token,
            fee_vault,
            schedule,
            lanes: HashSet::new(),
            outbox,
            nonce: Mutex::new(0),
            halted: AtomicBool::new(false),
        }
    }

    /// Opens a lane to `dest`.
    #[must_use]
    pub fn with_lane(mut self, dest: ChainSelector) -> Self {
        self.lanes.insert(dest);
        self
    }

    /// Simulates a transport outage (`true`) or recovery (`false`).
    pub fn set_halted(&self, halted: bool) {
        self.halted.store(halted, Ordering::SeqCst);
        warn!(chain = %self.ledger.selector(), halted, "[bridge] router halt switch");
    }

    /// Address collecting router fees.
    #[must_use]
    pub fn fee_vault(&self) -> Address {
        self.fee_vault
    }

    fn next_message_id(&self, sender: Address) -> Hash {
        let mut nonce = self.nonce.lock();
        *nonce += 1;
        let mut preimage = Vec::with_capacity(8 + 20 + 8);
        preimage.extend_from_slice(&self.ledger.selector().0.to_be_bytes());
        preimage.extend_from_slice(sender.as_bytes());
        preimage.extend_from_slice(&nonce.to_be_bytes());
        keccak256(&preimage)
    }
}

impl MessageRouter for InMemoryRouter {
    fn address(&self) -> Address {
        self.address
    }

    fn chain(&self) -> ChainSelector {
        self.ledger.selector()
    }

    fn is_chain_supported(&self, dest: ChainSelector) -> bool {
        self.lanes.contains(&dest)
    }

    fn get_fee(&self, dest: ChainSelector, data: &[u8]) -> Result<Amount, BridgeError> {
        if !self.is_chain_supported(dest) {
            return Err(BridgeError::UnsupportedDestination(dest));
        }
        Ok(self.schedule.quote(data.len()))
    }

    fn send(
        &self,
        sender: Address,
        dest: ChainSelector,
        receiver: Address,
        data: Vec<u8>,
    ) -> Result<Hash, BridgeError> {
        if self.halted.load(Ordering::SeqCst) {
            return Err(BridgeError::RouterHalted(self.chain()));
        }
        if receiver.is_zero() {
            return Err(BridgeError::InvalidReceiver);
        }
        let fee = self.get_fee(dest, &data)?;

        self.fee_token
            .transfer_from(self.address, sender, self.fee_vault, fee)
            .map_err(|source| BridgeError::FeePayment { fee, source })?;

        let message_id = self.next_message_id(sender);
        info!(
            source = %self.chain(),
            %dest,
            %sender,
            %receiver,
            fee,
            "[bridge] message {} accepted",
            message_id
        );
        self.outbox.push(CrossChainMessage {
            message_id,
            source_chain: self.chain(),
            sender,
            dest_chain: dest,
            receiver,
            data,
            fee_paid: fee,
            sent_at_block: self.ledger.block_number(),
        });
        Ok(message_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const L2: ChainSelector = ChainSelector(100);
    const L1: ChainSelector = ChainSelector(1);

    fn addr(n: u64) -> Address {
        Address::from_low_u64(n)
    }

    fn setup() -> (Arc<FeeToken>, Arc<Outbox>, InMemoryRouter) {
        let ledger = Arc::new(Ledger::new(L2, 1_000, 2));
        let token = Arc::new(FeeToken::new(addr(900), "LINK"));
        let outbox = Arc::new(Outbox::new());
        let schedule = FeeSchedule {
            base_fee: 10,
            fee_per_byte: 1,
        };
        let router = InMemoryRouter::new(
            addr(800),
            ledger,
            Arc::clone(&token),
            addr(801),
            schedule,
            Arc::clone(&outbox),
        )
        .with_lane(L1);
        (token, outbox, router)
    }

    #[test]
    fn test_fee_quote_and_unsupported_lane() {
        let (_, _, router) = setup();
        assert_eq!(router.get_fee(L1, &[0u8; 96]).unwrap(), 106);
        assert_eq!(
            router.get_fee(ChainSelector(7), &[]),
            Err(BridgeError::UnsupportedDestination(ChainSelector(7)))
        );
    }

    #[test]
    fn test_send_pulls_fee_and_enqueues() {
        let (token, outbox, router) = setup();
        token.mint(addr(1), 1_000).unwrap();
        token.approve(addr(1), addr(800), 106).unwrap();

        let id = router.send(addr(1), L1, addr(2), vec![0u8; 96]).unwrap();

        assert_eq!(token.balance_of(addr(801)), 106);
        assert_eq!(token.balance_of(addr(1)), 894);
        let pending = outbox.snapshot();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].message_id, id);
        assert_eq!(pending[0].source_chain, L2);
        assert_eq!(pending[0].fee_paid, 106);
    }

    #[test]
    fn test_send_without_approval_moves_nothing() {
        let (token, outbox, router) = setup();
        token.mint(addr(1), 1_000).unwrap();

        let err = router.send(addr(1), L1, addr(2), vec![1, 2, 3]).unwrap_err();
        assert!(matches!(err, BridgeError::FeePayment { fee: 13, .. }));
        assert!(outbox.is_empty());
        assert_eq!(token.balance_of(addr(1)), 1_000);
    }

    #[test]
    fn test_halted_router_rejects() {
        let (token, outbox, router) = setup();
        token.mint(addr(1), 1_000).unwrap();
        token.approve(addr(1), addr(800), 1_000).unwrap();
        router.set_halted(true);

        assert_eq!(
            router.send(addr(1), L1, addr(2), vec![]),
            Err(BridgeError::RouterHalted(L2))
        );
        assert!(outbox.is_empty());
    }

    #[test]
    fn test_message_ids_are_unique() {
        let (token, _, router) = setup();
        token.mint(addr(1), 1_000).unwrap();
        token.approve(addr(1), addr(800), 1_000).unwrap();
        let a = router.send(addr(1), L1, addr(2), vec![]).unwrap();
        let b = router.send(addr(1), L1, addr(2), vec![]).unwrap();
        assert_ne!(a, b);
    }
}
