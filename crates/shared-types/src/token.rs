//! # Fee Token
//!
//! ERC-20 style fee token used for escrow, router fees and platform fees.
//! Pulls follow the approve-then-transferFrom pattern: a spender can only move
//! an owner's tokens up to the allowance the owner granted it.

use crate::primitives::{Address, Amount};
use parking_lot::RwLock;
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

/// Token errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Holder balance too low.
    #[error("insufficient balance for {account}: required {required}, available {available}")]
    InsufficientBalance {
        /// Debited account.
        account: Address,
        /// Requested amount.
        required: Amount,
        /// Current balance.
        available: Amount,
    },

    /// Spender allowance too low.
    #[error(
        "insufficient allowance from {owner} to {spender}: required {required}, available {available}"
    )]
    InsufficientAllowance {
        /// Token owner.
        owner: Address,
        /// Spender pulling funds.
        spender: Address,
        /// Requested amount.
        required: Amount,
        /// Current allowance.
        available: Amount,
    },

    /// Transfer to or from the zero address.
    #[error("zero address in token operation")]
    ZeroAddress,
}

#[derive(Default)]
struct TokenState {
    balances: HashMap<Address, Amount>,
    allowances: HashMap<(Address, Address), Amount>,
    total_supply: Amount,
}

/// In-memory fee token deployed on one chain.
pub struct FeeToken {
    address: Address,
    symbol: String,
    state: RwLock<TokenState>,
}

impl FeeToken {
    /// Deploys an empty token at `address`.
    #[must_use]
    pub fn new(address: Address, symbol: impl Into<String>) -> Self {
        Self {
            address,
            symbol: symbol.into(),
            state: RwLock::new(TokenState::default()),
        }
    }

    /// Token contract address.
    #[must_use]
    pub fn address(&self) -> Address {
        self.address
    }

    /// Ticker symbol.
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Balance of `account` (zero for unknown accounts).
    #[must_use]
    pub fn balance_of(&self, account: Address) -> Amount {
        self.state
            .read()
            .balances
            .get(&account)
            .copied()
            .unwrap_or(0)
    }

    /// Allowance granted by `owner` to `spender`.
    #[must_use]
    pub fn allowance(&self, owner: Address, spender: Address) -> Amount {
        self.state
            .read()
            .allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or(0)
    }

    /// Total minted supply.
    #[must_use]
    pub fn total_supply(&self) -> Amount {
        self.state.read().total_supply
    }

    /// Faucet mint (genesis allocation and tests).
    pub fn mint(&self, to: Address, amount: Amount) -> Result<(), TokenError> {
        if to.is_zero() {
            return Err(TokenError::ZeroAddress);
        }
        let mut state = self.state.write();
        *state.balances.entry(to).or_default() += amount;
        state.total_supply += amount;
        Ok(())
    }

    /// Sets the allowance `owner` grants `spender` (overwrites).
    pub fn approve(&self, owner: Address, spender: Address, amount: Amount) -> Result<(), TokenError> {
        if owner.is_zero() || spender.is_zero() {
            return Err(TokenError::ZeroAddress);
        }
        self.state.write().allowances.insert((owner, spender), amount);
        debug!(%owner, %spender, amount, "[token] approve");
        Ok(())
    }

    /// Moves `amount` from `from` (the calling account) to `to`.
    pub fn transfer(&self, from: Address, to: Address, amount: Amount) -> Result<(), TokenError> {
        let mut state = self.state.write();
        Self::move_balance(&mut state, from, to, amount)?;
        debug!(%from, %to, amount, "[token] transfer");
        Ok(())
    }

    /// `spender` pulls `amount` from `from` to `to` against its allowance.
    pub fn transfer_from(
        &self,
        spender: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<(), TokenError> {
        let mut state = self.state.write();
        let allowed = state
            .allowances
            .get(&(from, spender))
            .copied()
            .unwrap_or(0);
        if allowed < amount {
            return Err(TokenError::InsufficientAllowance {
                owner: from,
                spender,
                required: amount,
                available: allowed,
            });
        }
        Self::move_balance(&mut state, from, to, amount)?;
        state.allowances.insert((from, spender), allowed - amount);
        debug!(%spender, %from, %to, amount, "[token] transferFrom");
        Ok(())
    }

    fn move_balance(
        state: &mut TokenState,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<(), TokenError> {
        if from.is_zero() || to.is_zero() {
            return Err(TokenError::ZeroAddress);
        }
        let available = state.balances.get(&from).copied().unwrap_or(0);
        if available < amount {
            return Err(TokenError::InsufficientBalance {
                account: from,
                required: amount,
                available,
            });
        }
        state.balances.insert(from, available - amount);
        *state.balances.entry(to).or_default() += amount;
        Ok(())
    }
}

impl std::fmt::Debug for FeeToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeeToken")
            .field("address", &self.address)
            .field("symbol", &self.symbol)
            .finish_non_exhaustive()
    }
}
