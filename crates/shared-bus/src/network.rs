//! # Bridge Network
//!
//! Destination-side delivery. Messages leave the shared outbox in FIFO order
//! by default, but the network deliberately offers no ordering or exactly-once
//! guarantee: tests reorder pending messages, redeliver delivered ones and
//! inject forged ones. Receivers must be idempotent and check provenance.
//!
//! Rejected deliveries land in a dead-letter queue and can be re-executed
//! manually once the receiver's state allows it. Delivered messages stay
//! available for redelivery up to a fixed capacity, oldest evicted first.

use crate::errors::{BridgeError, DeliveryError};
use crate::message::{CrossChainMessage, DeadLetter, DeliveryOutcome};
use crate::router::Outbox;
use parking_lot::{Mutex, RwLock};
use shared_types::{Address, ChainSelector, Hash, Ledger, TxContext};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Destination-side entrypoint implemented by receiving contracts.
pub trait MessageReceiver: Send + Sync {
    /// Handles one delivered message.
    ///
    /// `ctx.sender` is the destination router; provenance lives in
    /// `message.source_chain` / `message.sender`.
    fn receive(&self, ctx: &TxContext, message: &CrossChainMessage) -> Result<(), DeliveryError>;
}

struct ChainEndpoint {
    ledger: Arc<Ledger>,
    router: Address,
}

/// Delivered messages kept for redelivery, bounded FIFO.
struct DeliveredLog {
    capacity: usize,
    order: VecDeque<Hash>,
    messages: HashMap<Hash, CrossChainMessage>,
}

impl DeliveredLog {
    fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            order: VecDeque::new(),
            messages: HashMap::new(),
        }
    }

    fn insert(&mut self, message: CrossChainMessage) {
        let message_id = message.message_id;
        if self.messages.insert(message_id, message).is_some() {
            return;
        }
        self.order.push_back(message_id);
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.messages.remove(&oldest);
            }
        }
    }
}

/// In-memory bridge connecting registered chains.
pub struct BridgeNetwork {
    outbox: Arc<Outbox>,
    chains: RwLock<HashMap<ChainSelector, ChainEndpoint>>,
    receivers: RwLock<HashMap<(ChainSelector, Address), Arc<dyn MessageReceiver>>>,
    delivered: Mutex<DeliveredLog>,
    dead_letters: Mutex<Vec<DeadLetter>>,
}

impl Default for BridgeNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl BridgeNetwork {
    /// Delivered messages retained for redelivery by default.
    pub const DEFAULT_DELIVERED_CAPACITY: usize = 4_096;

    /// Creates a network with an empty outbox.
    #[must_use]
    pub fn new() -> Self {
        Self::with_delivered_capacity(Self::DEFAULT_DELIVERED_CAPACITY)
    }

    /// Creates a network retaining at most `capacity` delivered messages.
    #[must_use]
    pub fn with_delivered_capacity(capacity: usize) -> Self {
        Self {
            outbox: Arc::new(Outbox::new()),
            chains: RwLock::new(HashMap::new()),
            receivers: RwLock::new(HashMap::new()),
            delivered: Mutex::new(DeliveredLog::new(capacity)),
            dead_letters: Mutex::new(Vec::new()),
        }
    }

    /// Outbox shared with every router on the network.
    #[must_use]
    pub fn outbox(&self) -> Arc<Outbox> {
        Arc::clone(&self.outbox)
    }

    /// Registers a chain's ledger and its destination-side router address.
    pub fn register_chain(&self, ledger: Arc<Ledger>, router: Address) {
        let selector = ledger.selector();
        self.chains
            .write()
            .insert(selector, ChainEndpoint { ledger, router });
        info!(chain = %selector, %router, "[bridge] chain registered");
    }

    /// Registers the contract that receives messages addressed to `(chain, address)`.
    pub fn register_receiver(
        &self,
        chain: ChainSelector,
        address: Address,
        receiver: Arc<dyn MessageReceiver>,
    ) {
        self.receivers.write().insert((chain, address), receiver);
        debug!(%chain, %address, "[bridge] receiver registered");
    }

    /// Pending messages, next-to-deliver first.
    #[must_use]
    pub fn pending(&self) -> Vec<CrossChainMessage> {
        self.outbox.snapshot()
    }

    /// Number of pending messages.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.outbox.len()
    }

    /// Rearranges pending messages (delivery order is not guaranteed).
    pub fn reorder_pending(&self, f: impl FnOnce(&mut Vec<CrossChainMessage>)) {
        self.outbox.reorder(f);
    }

    /// Enqueues an arbitrary message, bypassing any router.
    pub fn inject(&self, message: CrossChainMessage) {
        warn!(
            source = %message.source_chain,
            sender = %message.sender,
            "[bridge] injected message {}",
            message.message_id
        );
        self.outbox.push(message);
    }

    /// Number of delivered messages still available for redelivery.
    #[must_use]
    pub fn delivered_count(&self) -> usize {
        self.delivered.lock().messages.len()
    }

    /// Re-enqueues a copy of an already delivered message (at-least-once).
    ///
    /// Fails once the message was evicted from the delivered log.
    pub fn redeliver(&self, message_id: Hash) -> Result<(), BridgeError> {
        let message = self
            .delivered
            .lock()
            .messages
            .get(&message_id)
            .cloned()
            .ok_or(BridgeError::MessageNotFound(message_id))?;
        self.outbox.push(message);
        Ok(())
    }

    /// Messages currently in the dead-letter queue.
    #[must_use]
    pub fn dead_letters(&self) -> Vec<DeadLetter> {
        self.dead_letters.lock().clone()
    }

    /// Manually re-executes a dead-lettered message.
    pub fn retry_dead_letter(&self, message_id: Hash) -> Result<DeliveryOutcome, BridgeError> {
        let letter = {
            let mut letters = self.dead_letters.lock();
            let index = letters
                .iter()
                .position(|letter| letter.message.message_id == message_id)
                .ok_or(BridgeError::MessageNotFound(message_id))?;
            letters.remove(index)
        };
        self.dispatch(letter.message, letter.attempts)
    }

    /// Delivers the next pending message, if any.
    pub fn relay_next(&self) -> Option<Result<DeliveryOutcome, BridgeError>> {
        let message = self.outbox.pop()?;
        Some(self.dispatch(message, 0))
    }

    /// Delivers until the outbox is empty, including messages emitted during
    /// delivery (e.g. acknowledgments).
    pub fn relay_all(&self) -> Vec<Result<DeliveryOutcome, BridgeError>> {
        let mut outcomes = Vec::new();
        while let Some(outcome) = self.relay_next() {
            outcomes.push(outcome);
        }
        outcomes
    }

    fn dispatch(
        &self,
        message: CrossChainMessage,
        prior_attempts: u32,
    ) -> Result<DeliveryOutcome, BridgeError> {
        let ctx = {
            let chains = self.chains.read();
            let endpoint = chains
                .get(&message.dest_chain)
                .ok_or(BridgeError::ChainNotRegistered(message.dest_chain))?;
            endpoint.ledger.context(endpoint.router)
        };

        let receiver = self
            .receivers
            .read()
            .get(&(message.dest_chain, message.receiver))
            .cloned();

        // Lock guards are released here: receivers may send new messages.
        let result = match receiver {
            Some(receiver) => receiver.receive(&ctx, &message),
            None => Err(DeliveryError {
                kind: shared_types::ErrorKind::Transport,
                reason: BridgeError::UnknownReceiver {
                    chain: message.dest_chain,
                    receiver: message.receiver,
                }
                .to_string(),
            }),
        };

        let message_id = message.message_id;
        match result {
            Ok(()) => {
                debug!(dest = %message.dest_chain, "[bridge] delivered {}", message_id);
                self.delivered.lock().insert(message);
                Ok(DeliveryOutcome::Delivered { message_id })
            }
            Err(err) => {
                warn!(
                    dest = %message.dest_chain,
                    kind = %err.kind,
                    reason = %err.reason,
                    "[bridge] delivery of {} rejected, dead-lettered",
                    message_id
                );
                let reason = err.reason.clone();
                self.dead_letters.lock().push(DeadLetter {
                    message,
                    reason: err.reason,
                    attempts: prior_attempts + 1,
                });
                Ok(DeliveryOutcome::DeadLettered { message_id, reason })
            }
        }
    }
}
