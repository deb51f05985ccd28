//! # NFT Balance Port
//!
//! NFT-gated groups store nothing per member. Membership is computed from the
//! collection's balance at query time, so the registry depends on this port.

use parking_lot::RwLock;
use shared_types::Address;
use std::collections::HashMap;

/// Read-only view of external NFT collections - outbound port.
pub trait NftBalanceSource: Send + Sync {
    /// Units of `collection` held by `holder`.
    fn balance_of(&self, collection: Address, holder: Address) -> u64;

    /// Number of distinct holders with a non-zero balance.
    fn holder_count(&self, collection: Address) -> u64;
}

/// In-memory collections for the devnet and tests.
#[derive(Debug, Default)]
pub struct InMemoryNftCollections {
    balances: RwLock<HashMap<Address, HashMap<Address, u64>>>,
}

impl InMemoryNftCollections {
    /// Creates an empty set of collections.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mints `units` of `collection` to `holder`.
    pub fn mint(&self, collection: Address, holder: Address, units: u64) {
        let mut balances = self.balances.write();
        let entry = balances
            .entry(collection)
            .or_default()
            .entry(holder)
            .or_insert(0);
        *entry = entry.saturating_add(units);
    }

    /// Burns every unit `holder` owns in `collection`.
    pub fn burn_all(&self, collection: Address, holder: Address) {
        if let Some(holders) = self.balances.write().get_mut(&collection) {
            holders.remove(&holder);
        }
    }
}

impl NftBalanceSource for InMemoryNftCollections {
    fn balance_of(&self, collection: Address, holder: Address) -> u64 {
        self.balances
            .read()
            .get(&collection)
            .and_then(|holders| holders.get(&holder).copied())
            .unwrap_or(0)
    }

    fn holder_count(&self, collection: Address) -> u64 {
        self.balances
            .read()
            .get(&collection)
            .map_or(0, |holders| holders.values().filter(|b| **b > 0).count() as u64)
    }
}
