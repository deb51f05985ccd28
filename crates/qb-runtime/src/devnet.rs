//! # Devnet
//!
//! Both chains and the bridge in one process.
//!
//! ```text
//!   L2 (execution)                               L1 (settlement)
//! ┌──────────────────┐   finalize    ┌────────┐   ┌──────────────────┐
//! │ L2VotingService  │ ──router────→ │ Outbox │ → │ L1RegistryService│
//! │  PollEngine      │ ←──────────── │        │ ← │  ResultRegistry  │
//! └──────────────────┘   ack relay   └────────┘   └──────────────────┘
//! ```

use crate::config::{ChainConfig, RuntimeConfig};
use crate::errors::RuntimeError;
use qb_01_membership::InMemoryNftCollections;
use qb_04_poll_engine::{L2VotingService, PollEngine};
use qb_05_result_registry::{L1RegistryService, ResultRegistry};
use shared_bus::{BridgeNetwork, InMemoryRouter, MessageRouter, Relayer};
use shared_types::{Address, Amount, FeeToken, Ledger};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

/// A wired devnet.
pub struct Devnet {
    config: RuntimeConfig,
    /// L2 clock.
    pub l2_ledger: Arc<Ledger>,
    /// L1 clock.
    pub l1_ledger: Arc<Ledger>,
    /// L2 fee token (escrow and router fees).
    pub l2_token: Arc<FeeToken>,
    /// L1 fee token (acknowledgment fees).
    pub l1_token: Arc<FeeToken>,
    /// L2 router.
    pub l2_router: Arc<InMemoryRouter>,
    /// L1 router.
    pub l1_router: Arc<InMemoryRouter>,
    /// NFT balances consulted by NFT-gated groups.
    pub nft: Arc<InMemoryNftCollections>,
    /// The bridge.
    pub network: Arc<BridgeNetwork>,
    /// Deployed L2 contract.
    pub l2: Arc<L2VotingService>,
    /// Deployed L1 contract.
    pub l1: Arc<L1RegistryService>,
}

impl Devnet {
    /// Builds and configures everything described by `config`.
    pub fn new(config: RuntimeConfig) -> Result<Self, RuntimeError> {
        config.validate()?;
        let network = Arc::new(BridgeNetwork::new());

        let (l2_ledger, l2_token, l2_router) = build_chain(&config.l2, &config.l1, &network);
        let (l1_ledger, l1_token, l1_router) = build_chain(&config.l1, &config.l2, &network);
        let nft = Arc::new(InMemoryNftCollections::new());

        // L2: engine, acknowledgments accepted only from the registry.
        let mut engine = PollEngine::new(
            config.poll_engine,
            config.deployer,
            config.engine_config(),
            Arc::clone(&l2_token),
            Arc::clone(&l2_router) as Arc<dyn MessageRouter>,
            nft.clone(),
        )?;
        engine.set_ack_source(
            &l2_ledger.context(config.deployer),
            config.l1.selector,
            config.result_registry,
        )?;

        // L1: registry, finalize accepted only from the engine, acks go back to it.
        let mut registry = ResultRegistry::new(
            config.result_registry,
            config.deployer,
            Arc::clone(&l1_router) as Arc<dyn MessageRouter>,
            Arc::clone(&l1_token),
        )?;
        let l1_ctx = l1_ledger.context(config.deployer);
        registry.set_allowed_source(&l1_ctx, config.l2.selector, config.poll_engine)?;
        registry.set_ack_target(&l1_ctx, config.l2.selector, config.poll_engine)?;
        if config.registry_funding > 0 {
            l1_token.mint(config.result_registry, config.registry_funding)?;
        }

        let l2 = Arc::new(L2VotingService::new(Arc::clone(&l2_ledger), engine));
        let l1 = Arc::new(L1RegistryService::new(Arc::clone(&l1_ledger), registry));
        network.register_receiver(config.l2.selector, config.poll_engine, l2.clone());
        network.register_receiver(config.l1.selector, config.result_registry, l1.clone());

        info!(
            l2 = %config.l2.selector,
            l1 = %config.l1.selector,
            engine = %config.poll_engine,
            registry = %config.result_registry,
            "Devnet wired"
        );
        Ok(Self {
            config,
            l2_ledger,
            l1_ledger,
            l2_token,
            l1_token,
            l2_router,
            l1_router,
            nft,
            network,
            l2,
            l1,
        })
    }

    /// Configuration the devnet was built from.
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Relayer over this devnet's bridge.
    pub fn relayer(&self) -> Relayer {
        Relayer::new(
            Arc::clone(&self.network),
            Duration::from_millis(self.config.relay_interval_ms),
        )
    }

    /// Spawns the relayer on the current tokio runtime.
    pub fn spawn_relayer(&self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        self.relayer().spawn(shutdown)
    }

    /// Mints L2 fee tokens and approves the poll engine to pull them.
    pub fn fund_l2_account(&self, account: Address, amount: Amount) -> Result<(), RuntimeError> {
        self.l2_token.mint(account, amount)?;
        let allowance = self.l2_token.allowance(account, self.config.poll_engine);
        self.l2_token
            .approve(account, self.config.poll_engine, allowance + amount)?;
        Ok(())
    }

    /// Moves both chain clocks forward.
    pub fn advance_time(&self, secs: u64) {
        self.l2_ledger.advance_time(secs);
        self.l1_ledger.advance_time(secs);
    }
}

fn build_chain(
    chain: &ChainConfig,
    peer: &ChainConfig,
    network: &BridgeNetwork,
) -> (Arc<Ledger>, Arc<FeeToken>, Arc<InMemoryRouter>) {
    let ledger = Arc::new(Ledger::new(
        chain.selector,
        chain.genesis_timestamp,
        chain.block_time_secs,
    ));
    let token = Arc::new(FeeToken::new(chain.fee_token, chain.fee_symbol.clone()));
    let router = Arc::new(
        InMemoryRouter::new(
            chain.router,
            Arc::clone(&ledger),
            Arc::clone(&token),
            chain.fee_vault,
            chain.fee_schedule,
            network.outbox(),
        )
        .with_lane(peer.selector),
    );
    network.register_chain(Arc::clone(&ledger), chain.router);
    (ledger, token, router)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wiring_configures_both_allow_lists() {
        let devnet = Devnet::new(RuntimeConfig::default()).unwrap();
        let config = devnet.config().clone();

        let ack_source = devnet.l2.view(|engine| engine.ack_gate().allowed_source());
        assert_eq!(ack_source, Some((config.l1.selector, config.result_registry)));

        let (source, target) = devnet
            .l1
            .view(|registry| (registry.allowed_source(), registry.ack_target()));
        assert_eq!(source, Some((config.l2.selector, config.poll_engine)));
        assert_eq!(target, Some((config.l2.selector, config.poll_engine)));

        assert_eq!(
            devnet.l1_token.balance_of(config.result_registry),
            config.registry_funding
        );
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = RuntimeConfig::default();
        config.poll_engine = Address::ZERO;
        assert!(matches!(
            Devnet::new(config),
            Err(RuntimeError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_fund_l2_account_accumulates_allowance() {
        let devnet = Devnet::new(RuntimeConfig::default()).unwrap();
        let alice = Address::from_low_u64(0xA1);
        devnet.fund_l2_account(alice, 100).unwrap();
        devnet.fund_l2_account(alice, 50).unwrap();
        assert_eq!(devnet.l2_token.balance_of(alice), 150);
        assert_eq!(
            devnet.l2_token.allowance(alice, devnet.config().poll_engine),
            150
        );
    }
}
