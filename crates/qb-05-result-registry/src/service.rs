//! L1 registry deployed on its chain ledger.

use crate::errors::RegistryError;
use crate::registry::{ResultRecord, ResultRegistry};
use parking_lot::RwLock;
use shared_bus::{CrossChainMessage, DeliveryError, MessageReceiver};
use shared_types::{Address, GroupId, Ledger, PollId, TxContext};
use std::sync::Arc;

/// The deployed L1 contract.
pub struct L1RegistryService {
    ledger: Arc<Ledger>,
    registry: RwLock<ResultRegistry>,
}

impl L1RegistryService {
    /// Deploys `registry` on `ledger`'s chain.
    pub fn new(ledger: Arc<Ledger>, registry: ResultRegistry) -> Self {
        Self {
            ledger,
            registry: RwLock::new(registry),
        }
    }

    /// Contract address.
    pub fn address(&self) -> Address {
        self.registry.read().address()
    }

    /// Chain clock.
    pub fn ledger(&self) -> &Arc<Ledger> {
        &self.ledger
    }

    /// Executes one transaction sent by `sender`.
    pub fn execute<R>(
        &self,
        sender: Address,
        f: impl FnOnce(&TxContext, &mut ResultRegistry) -> Result<R, RegistryError>,
    ) -> Result<R, RegistryError> {
        let ctx = self.ledger.context(sender);
        let mut registry = self.registry.write();
        f(&ctx, &mut registry)
    }

    /// Read-only access.
    pub fn view<R>(&self, f: impl FnOnce(&ResultRegistry) -> R) -> R {
        f(&self.registry.read())
    }

    /// See [`ResultRegistry::is_recorded`].
    pub fn is_recorded(&self, group_id: GroupId, poll_id: PollId) -> bool {
        self.registry.read().is_recorded(group_id, poll_id)
    }

    /// See [`ResultRegistry::get_record`].
    pub fn get_record(&self, group_id: GroupId, poll_id: PollId) -> ResultRecord {
        self.registry.read().get_record(group_id, poll_id)
    }
}

impl MessageReceiver for L1RegistryService {
    fn receive(&self, ctx: &TxContext, message: &CrossChainMessage) -> Result<(), DeliveryError> {
        self.registry
            .write()
            .receive(ctx, message)
            .map(|_| ())
            .map_err(|err| DeliveryError::from_classified(&err))
    }
}
