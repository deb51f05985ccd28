//! # Runtime Configuration
//!
//! One JSON document describes both chains, the deployed contract addresses
//! and the fee parameters. Missing fields fall back to the defaults below and
//! a handful of `QB_*` variables override the file.

use crate::errors::RuntimeError;
use qb_04_poll_engine::EngineConfig;
use serde::{Deserialize, Serialize};
use shared_bus::{FeeSchedule, DEFAULT_RELAY_INTERVAL_MS};
use shared_types::{Address, Amount, ChainSelector, Timestamp};
use std::path::Path;
use tracing::{info, warn};

/// Complete devnet configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Execution layer.
    pub l2: ChainConfig,
    /// Settlement layer.
    pub l1: ChainConfig,
    /// Deploys and owns both contracts.
    pub deployer: Address,
    /// Poll engine address on L2.
    pub poll_engine: Address,
    /// Result registry address on L1.
    pub result_registry: Address,
    /// Receives platform fees.
    pub treasury: Address,
    /// Success fee in basis points.
    pub success_fee_bps: u64,
    /// Flat fee kept when transmission fails.
    pub failure_fee: Amount,
    /// Paid to the finalize caller.
    pub executor_reward: Amount,
    /// L1 fee tokens minted to the registry for acknowledgment fees.
    pub registry_funding: Amount,
    /// Relayer poll interval.
    pub relay_interval_ms: u64,
}

/// One chain of the devnet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Bridge selector.
    pub selector: ChainSelector,
    /// Genesis block time.
    pub genesis_timestamp: Timestamp,
    /// Seconds per block.
    pub block_time_secs: u64,
    /// Router contract.
    pub router: Address,
    /// Collects router fees.
    pub fee_vault: Address,
    /// Fee token contract.
    pub fee_token: Address,
    /// Fee token symbol.
    pub fee_symbol: String,
    /// Router fee schedule.
    pub fee_schedule: FeeSchedule,
}

impl ChainConfig {
    fn l2_default() -> Self {
        Self {
            selector: ChainSelector(100),
            genesis_timestamp: 1_700_000_000,
            block_time_secs: 2,
            router: Address::from_low_u64(0x2040),
            fee_vault: Address::from_low_u64(0x2041),
            fee_token: Address::from_low_u64(0x2070),
            fee_symbol: "LINK".to_string(),
            fee_schedule: FeeSchedule::default(),
        }
    }

    fn l1_default() -> Self {
        Self {
            selector: ChainSelector(1),
            genesis_timestamp: 1_700_000_000,
            block_time_secs: 12,
            router: Address::from_low_u64(0x1040),
            fee_vault: Address::from_low_u64(0x1041),
            fee_token: Address::from_low_u64(0x1070),
            fee_symbol: "LINK".to_string(),
            fee_schedule: FeeSchedule::default(),
        }
    }

    fn validate(&self, name: &str) -> Result<(), RuntimeError> {
        if self.selector.is_zero() {
            return Err(RuntimeError::InvalidConfig(format!("{name} selector is zero")));
        }
        for (field, address) in [
            ("router", self.router),
            ("fee_vault", self.fee_vault),
            ("fee_token", self.fee_token),
        ] {
            if address.is_zero() {
                return Err(RuntimeError::InvalidConfig(format!("{name}.{field} is zero")));
            }
        }
        Ok(())
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            l2: ChainConfig::l2_default(),
            l1: ChainConfig::l1_default(),
            deployer: Address::from_low_u64(0xD0),
            poll_engine: Address::from_low_u64(0xE0),
            result_registry: Address::from_low_u64(0x1E0),
            treasury: Address::from_low_u64(0x7EA5),
            success_fee_bps: 250,
            failure_fee: 10_000,
            executor_reward: 20_000,
            registry_funding: 10_000_000,
            relay_interval_ms: DEFAULT_RELAY_INTERVAL_MS,
        }
    }
}

impl RuntimeConfig {
    /// Reads `path` (if given) and applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, RuntimeError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a JSON config file.
    pub fn from_file(path: &Path) -> Result<Self, RuntimeError> {
        let raw = std::fs::read_to_string(path).map_err(|source| RuntimeError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&raw).map_err(|source| RuntimeError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "Loaded runtime config");
        Ok(config)
    }

    /// Applies `QB_*` overrides read through `lookup`.
    ///
    /// - `QB_L2_SELECTOR`, `QB_L1_SELECTOR`: chain selectors
    /// - `QB_SUCCESS_FEE_BPS`, `QB_FAILURE_FEE`, `QB_EXECUTOR_REWARD`: engine fees
    /// - `QB_REGISTRY_FUNDING`: L1 ack-fee funding
    /// - `QB_RELAY_INTERVAL_MS`: relayer interval
    /// - `QB_TREASURY`: treasury as 40 hex chars, `0x` optional
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), RuntimeError> {
        if let Some(v) = lookup("QB_L2_SELECTOR") {
            self.l2.selector = ChainSelector(parse_u64("QB_L2_SELECTOR", v)?);
        }
        if let Some(v) = lookup("QB_L1_SELECTOR") {
            self.l1.selector = ChainSelector(parse_u64("QB_L1_SELECTOR", v)?);
        }
        if let Some(v) = lookup("QB_SUCCESS_FEE_BPS") {
            self.success_fee_bps = parse_u64("QB_SUCCESS_FEE_BPS", v)?;
        }
        if let Some(v) = lookup("QB_FAILURE_FEE") {
            self.failure_fee = parse_amount("QB_FAILURE_FEE", v)?;
        }
        if let Some(v) = lookup("QB_EXECUTOR_REWARD") {
            self.executor_reward = parse_amount("QB_EXECUTOR_REWARD", v)?;
        }
        if let Some(v) = lookup("QB_REGISTRY_FUNDING") {
            self.registry_funding = parse_amount("QB_REGISTRY_FUNDING", v)?;
        }
        if let Some(v) = lookup("QB_RELAY_INTERVAL_MS") {
            self.relay_interval_ms = parse_u64("QB_RELAY_INTERVAL_MS", v)?;
        }
        if let Some(v) = lookup("QB_TREASURY") {
            self.treasury = parse_address("QB_TREASURY", v)?;
        }
        Ok(())
    }

    /// Rejects zero addresses, equal selectors and address collisions.
    pub fn validate(&self) -> Result<(), RuntimeError> {
        self.l2.validate("l2")?;
        self.l1.validate("l1")?;
        if self.l2.selector == self.l1.selector {
            return Err(RuntimeError::InvalidConfig(format!(
                "l2 and l1 share selector {}",
                self.l1.selector
            )));
        }
        if self.deployer.is_zero() || self.poll_engine.is_zero() || self.result_registry.is_zero() {
            return Err(RuntimeError::InvalidConfig(
                "deployer and contract addresses must be non-zero".into(),
            ));
        }
        if self.relay_interval_ms == 0 {
            return Err(RuntimeError::InvalidConfig("relay_interval_ms is zero".into()));
        }
        self.engine_config().validate()?;
        Ok(())
    }

    /// Engine configuration pointing at the configured L1 registry.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            treasury: self.treasury,
            success_fee_bps: self.success_fee_bps,
            failure_fee: self.failure_fee,
            executor_reward: self.executor_reward,
            destination_chain: self.l1.selector,
            destination_receiver: self.result_registry,
        }
    }
}

fn parse_u64(var: &'static str, value: String) -> Result<u64, RuntimeError> {
    value
        .trim()
        .parse()
        .map_err(|_| RuntimeError::InvalidOverride { var, value })
}

fn parse_amount(var: &'static str, value: String) -> Result<Amount, RuntimeError> {
    value
        .trim()
        .parse()
        .map_err(|_| RuntimeError::InvalidOverride { var, value })
}

fn parse_address(var: &'static str, value: String) -> Result<Address, RuntimeError> {
    let digits = value.trim().trim_start_matches("0x");
    match hex::decode(digits) {
        Ok(bytes) if bytes.len() == 20 => {
            let mut raw = [0u8; 20];
            raw.copy_from_slice(&bytes);
            Ok(Address::new(raw))
        }
        _ => {
            warn!("{var} must be 20 bytes (40 hex chars)");
            Err(RuntimeError::InvalidOverride { var, value })
        }
    }
}
