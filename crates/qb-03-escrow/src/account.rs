//! # Escrow Account
//!
//! Per-poll fee-token balances held by the escrow contract address.
//!
//! Every operation validates first, then updates the per-poll bookkeeping,
//! and only then touches the token ledger. If the token call still fails the
//! bookkeeping is restored, mirroring a reverted transaction.

use crate::errors::EscrowError;
use shared_types::{Address, Amount, FeeToken, PollId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Fee-token escrow for every poll.
pub struct EscrowAccount {
    address: Address,
    token: Arc<FeeToken>,
    balances: HashMap<PollId, Amount>,
    reserved: HashMap<(PollId, Address), Amount>,
}

impl EscrowAccount {
    /// Creates an escrow holding tokens at `address`.
    pub fn new(address: Address, token: Arc<FeeToken>) -> Result<Self, EscrowError> {
        if address.is_zero() {
            return Err(EscrowError::ZeroAddress);
        }
        Ok(Self {
            address,
            token,
            balances: HashMap::new(),
            reserved: HashMap::new(),
        })
    }

    /// Address holding the escrowed tokens.
    #[must_use]
    pub fn address(&self) -> Address {
        self.address
    }

    /// Fee token.
    #[must_use]
    pub fn token(&self) -> &Arc<FeeToken> {
        &self.token
    }

    /// Opens an empty slot for `poll_id`.
    pub fn open(&mut self, poll_id: PollId) {
        self.balances.entry(poll_id).or_insert(0);
    }

    /// Checks that the escrow could pull `amount` from `payer` right now.
    pub fn check_pull(&self, payer: Address, amount: Amount) -> Result<(), EscrowError> {
        let allowance = self.token.allowance(payer, self.address);
        if allowance < amount {
            return Err(EscrowError::InsufficientAllowance {
                payer,
                required: amount,
                available: allowance,
            });
        }
        let balance = self.token.balance_of(payer);
        if balance < amount {
            return Err(EscrowError::InsufficientBalance {
                payer,
                required: amount,
                available: balance,
            });
        }
        Ok(())
    }

    /// Pulls `amount` from `payer` into the poll's escrow.
    ///
    /// The payer must have approved the escrow address beforehand.
    pub fn deposit(&mut self, poll_id: PollId, payer: Address, amount: Amount) -> Result<Amount, EscrowError> {
        if amount == 0 {
            return Err(EscrowError::ZeroAmount);
        }
        if !self.balances.contains_key(&poll_id) {
            return Err(EscrowError::UnknownPoll(poll_id));
        }
        self.check_pull(payer, amount)?;

        let new_balance = self.adjust(poll_id, |balance| balance + amount);
        if let Err(err) = self
            .token
            .transfer_from(self.address, payer, self.address, amount)
        {
            self.adjust(poll_id, |balance| balance - amount);
            return Err(err.into());
        }

        info!(poll_id, %payer, amount, balance = new_balance, "[qb-03] Escrow funded");
        Ok(new_balance)
    }

    /// Pays `amount` out of the poll's escrow to `recipient`.
    pub fn debit(&mut self, poll_id: PollId, amount: Amount, recipient: Address) -> Result<Amount, EscrowError> {
        self.reserve(poll_id, amount)?;
        if amount == 0 {
            return Ok(self.balance_of(poll_id));
        }
        if let Err(err) = self.token.transfer(self.address, recipient, amount) {
            self.adjust(poll_id, |balance| balance + amount);
            return Err(err.into());
        }

        let remaining = self.balance_of(poll_id);
        debug!(poll_id, amount, %recipient, remaining, "[qb-03] Escrow debited");
        Ok(remaining)
    }

    /// Moves `amount` out of the poll's escrow into an allowance for `spender`.
    ///
    /// Used to let a router pull its fee. Whatever the spender does not pull
    /// is returned by [`Self::reclaim_allowance`].
    pub fn authorize_spend(&mut self, poll_id: PollId, spender: Address, amount: Amount) -> Result<(), EscrowError> {
        self.reserve(poll_id, amount)?;
        if let Err(err) = self.token.approve(self.address, spender, amount) {
            self.adjust(poll_id, |balance| balance + amount);
            return Err(err.into());
        }
        self.reserved.insert((poll_id, spender), amount);
        debug!(poll_id, %spender, amount, "[qb-03] Escrow spend authorized");
        Ok(())
    }

    /// Returns the unspent part of an allowance to the poll and zeroes it.
    pub fn reclaim_allowance(&mut self, poll_id: PollId, spender: Address) -> Result<Amount, EscrowError> {
        let Some(reserved) = self.reserved.remove(&(poll_id, spender)) else {
            return Ok(0);
        };
        let unspent = self.token.allowance(self.address, spender).min(reserved);
        self.token.approve(self.address, spender, 0)?;
        if unspent > 0 {
            self.adjust(poll_id, |balance| balance + unspent);
        }
        debug!(poll_id, %spender, unspent, "[qb-03] Allowance reclaimed");
        Ok(unspent)
    }

    /// Checks that [`Self::settle`] would succeed for `payouts`.
    pub fn check_settle(&self, poll_id: PollId, payouts: &[(Address, Amount)]) -> Result<Amount, EscrowError> {
        let available = *self
            .balances
            .get(&poll_id)
            .ok_or(EscrowError::UnknownPoll(poll_id))?;
        let mut total: Amount = 0;
        for &(recipient, amount) in payouts {
            if amount > 0 && recipient.is_zero() {
                return Err(EscrowError::ZeroRecipient);
            }
            total = total.checked_add(amount).ok_or(EscrowError::InsufficientEscrow {
                poll_id,
                requested: Amount::MAX,
                available,
            })?;
        }
        if total > available {
            return Err(EscrowError::InsufficientEscrow {
                poll_id,
                requested: total,
                available,
            });
        }
        let held = self.token.balance_of(self.address);
        if held < total {
            return Err(EscrowError::InsufficientBalance {
                payer: self.address,
                required: total,
                available: held,
            });
        }
        Ok(total)
    }

    /// Pays out several shares of one poll's escrow.
    ///
    /// All bookkeeping commits before the first token transfer. Returns the
    /// balance left for the poll.
    pub fn settle(&mut self, poll_id: PollId, payouts: &[(Address, Amount)]) -> Result<Amount, EscrowError> {
        let total = self.check_settle(poll_id, payouts)?;
        let remaining = self.adjust(poll_id, |balance| balance - total);

        let mut outstanding = total;
        for &(recipient, amount) in payouts {
            if amount == 0 {
                continue;
            }
            if let Err(err) = self.token.transfer(self.address, recipient, amount) {
                self.adjust(poll_id, |balance| balance + outstanding);
                return Err(err.into());
            }
            outstanding -= amount;
        }

        info!(poll_id, total, remaining, "[qb-03] Escrow settled");
        Ok(remaining)
    }

    /// Escrowed balance of `poll_id` (0 if unknown).
    #[must_use]
    pub fn balance_of(&self, poll_id: PollId) -> Amount {
        self.balances.get(&poll_id).copied().unwrap_or(0)
    }

    /// Sum of all poll balances.
    #[must_use]
    pub fn total_held(&self) -> Amount {
        self.balances.values().sum()
    }

    fn reserve(&mut self, poll_id: PollId, amount: Amount) -> Result<(), EscrowError> {
        let available = *self
            .balances
            .get(&poll_id)
            .ok_or(EscrowError::UnknownPoll(poll_id))?;
        if amount > available {
            return Err(EscrowError::InsufficientEscrow {
                poll_id,
                requested: amount,
                available,
            });
        }
        self.adjust(poll_id, |balance| balance - amount);
        Ok(())
    }

    fn adjust(&mut self, poll_id: PollId, f: impl FnOnce(Amount) -> Amount) -> Amount {
        let slot = self.balances.entry(poll_id).or_insert(0);
        *slot = f(*slot);
        *slot
    }
}

impl std::fmt::Debug for EscrowAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EscrowAccount")
            .field("address", &self.address)
            .field("polls", &self.balances.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u64) -> Address {
        Address::from_low_u64(n)
    }

    fn setup() -> (EscrowAccount, Arc<FeeToken>) {
        let token = Arc::new(FeeToken::new(addr(0x70), "LINK"));
        token.mint(addr(1), 1_000).unwrap();
        let escrow = EscrowAccount::new(addr(0xE5), token.clone()).unwrap();
        (escrow, token)
    }

    #[test]
    fn test_deposit_requires_approval() {
        let (mut escrow, token) = setup();
        escrow.open(1);

        assert_eq!(
            escrow.deposit(1, addr(1), 100).unwrap_err(),
            EscrowError::InsufficientAllowance {
                payer: addr(1),
                required: 100,
                available: 0
            }
        );
        assert_eq!(escrow.balance_of(1), 0);

        token.approve(addr(1), escrow.address(), 100).unwrap();
        assert_eq!(escrow.deposit(1, addr(1), 100).unwrap(), 100);
        assert_eq!(token.balance_of(escrow.address()), 100);
        assert_eq!(token.balance_of(addr(1)), 900);
    }

    #[test]
    fn test_deposit_checks_balance() {
        let (mut escrow, token) = setup();
        escrow.open(1);
        token.approve(addr(2), escrow.address(), 50).unwrap();
        assert!(matches!(
            escrow.deposit(1, addr(2), 50),
            Err(EscrowError::InsufficientBalance { available: 0, .. })
        ));
    }

    #[test]
    fn test_deposit_unknown_poll_and_zero() {
        let (mut escrow, _) = setup();
        assert_eq!(escrow.deposit(3, addr(1), 1).unwrap_err(), EscrowError::UnknownPoll(3));
        escrow.open(3);
        assert_eq!(escrow.deposit(3, addr(1), 0).unwrap_err(), EscrowError::ZeroAmount);
    }

    #[test]
    fn test_debit_cannot_exceed_balance() {
        let (mut escrow, token) = setup();
        escrow.open(1);
        token.approve(addr(1), escrow.address(), 100).unwrap();
        escrow.deposit(1, addr(1), 100).unwrap();

        assert_eq!(
            escrow.debit(1, 101, addr(9)).unwrap_err(),
            EscrowError::InsufficientEscrow {
                poll_id: 1,
                requested: 101,
                available: 100
            }
        );
        assert_eq!(escrow.debit(1, 40, addr(9)).unwrap(), 60);
        assert_eq!(token.balance_of(addr(9)), 40);
    }

    #[test]
    fn test_balances_are_isolated_per_poll() {
        let (mut escrow, token) = setup();
        escrow.open(1);
        escrow.open(2);
        token.approve(addr(1), escrow.address(), 300).unwrap();
        escrow.deposit(1, addr(1), 100).unwrap();
        escrow.deposit(2, addr(1), 200).unwrap();

        assert!(escrow.debit(1, 150, addr(9)).is_err());
        assert_eq!(escrow.total_held(), 300);
        assert_eq!(escrow.debit(2, 200, addr(9)).unwrap(), 0);
        assert_eq!(escrow.balance_of(1), 100);
        assert_eq!(escrow.balance_of(2), 0);
    }

    #[test]
    fn test_authorized_spend_and_reclaim() {
        let (mut escrow, token) = setup();
        let router = addr(0x40);
        escrow.open(1);
        token.approve(addr(1), escrow.address(), 500).unwrap();
        escrow.deposit(1, addr(1), 500).unwrap();

        escrow.authorize_spend(1, router, 120).unwrap();
        assert_eq!(escrow.balance_of(1), 380);
        token
            .transfer_from(router, escrow.address(), addr(0x41), 100)
            .unwrap();

        assert_eq!(escrow.reclaim_allowance(1, router).unwrap(), 20);
        assert_eq!(escrow.balance_of(1), 400);
        assert_eq!(token.allowance(escrow.address(), router), 0);
        assert_eq!(token.balance_of(escrow.address()), 400);
        assert_eq!(escrow.reclaim_allowance(1, router).unwrap(), 0);
    }

    #[test]
    fn test_zero_address_rejected() {
        let token = Arc::new(FeeToken::new(addr(0x70), "LINK"));
        assert!(matches!(
            EscrowAccount::new(Address::ZERO, token),
            Err(EscrowError::ZeroAddress)
        ));
    }

    #[test]
    fn test_settle_pays_every_share() {
        let (mut escrow, token) = setup();
        escrow.open(1);
        token.approve(addr(1), escrow.address(), 600).unwrap();
        escrow.deposit(1, addr(1), 600).unwrap();

        let payouts = [(addr(5), 100), (addr(6), 0), (addr(1), 500)];
        assert_eq!(escrow.settle(1, &payouts).unwrap(), 0);
        assert_eq!(token.balance_of(addr(5)), 100);
        assert_eq!(token.balance_of(addr(1)), 900);
        assert_eq!(token.balance_of(escrow.address()), 0);
    }

    #[test]
    fn test_settle_rejects_without_effects() {
        let (mut escrow, token) = setup();
        escrow.open(1);
        token.approve(addr(1), escrow.address(), 300).unwrap();
        escrow.deposit(1, addr(1), 300).unwrap();

        assert!(matches!(
            escrow.settle(1, &[(addr(5), 200), (addr(6), 101)]),
            Err(EscrowError::InsufficientEscrow { requested: 301, .. })
        ));
        assert_eq!(
            escrow.settle(1, &[(addr(5), 10), (Address::ZERO, 1)]).unwrap_err(),
            EscrowError::ZeroRecipient
        );
        assert!(escrow
            .check_settle(1, &[(addr(5), Amount::MAX), (addr(6), 1)])
            .is_err());
        assert_eq!(escrow.balance_of(1), 300);
        assert_eq!(token.balance_of(addr(5)), 0);
    }
}
