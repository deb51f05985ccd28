//! # Access Control
//!
//! Owner role plus the process-wide emergency pause flag. Each contract owns
//! one `AccessControl` value and checks it first in every gated entrypoint.

use crate::primitives::Address;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Access-control errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    /// Caller is not the owner.
    #[error("unauthorized: caller {caller} is not the owner {owner}")]
    NotOwner {
        /// Offending caller.
        caller: Address,
        /// Expected owner.
        owner: Address,
    },

    /// Contract is paused.
    #[error("contract is paused")]
    Paused,

    /// Owner may not be the zero address.
    #[error("owner cannot be the zero address")]
    ZeroOwner,
}

/// Administrative changes recorded by the contract's event log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdminEvent {
    /// Pause flag set.
    Paused {
        /// Owner who paused.
        by: Address,
    },
    /// Pause flag cleared.
    Unpaused {
        /// Owner who unpaused.
        by: Address,
    },
    /// Owner role moved.
    OwnershipTransferred {
        /// Previous owner.
        from: Address,
        /// New owner.
        to: Address,
    },
}

/// Owner + pause state of one contract.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AccessControl {
    owner: Address,
    paused: bool,
}

impl AccessControl {
    /// Creates unpaused access control for `owner`.
    pub fn new(owner: Address) -> Result<Self, AccessError> {
        if owner.is_zero() {
            return Err(AccessError::ZeroOwner);
        }
        Ok(Self {
            owner,
            paused: false,
        })
    }

    /// Current owner.
    #[must_use]
    pub fn owner(&self) -> Address {
        self.owner
    }

    /// Pause flag.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Fails unless `caller` is the owner.
    pub fn ensure_owner(&self, caller: Address) -> Result<(), AccessError> {
        if caller != self.owner {
            return Err(AccessError::NotOwner {
                caller,
                owner: self.owner,
            });
        }
        Ok(())
    }

    /// Fails while paused.
    pub fn ensure_not_paused(&self) -> Result<(), AccessError> {
        if self.paused {
            return Err(AccessError::Paused);
        }
        Ok(())
    }

    /// Sets the pause flag (owner only).
    pub fn pause(&mut self, caller: Address) -> Result<AdminEvent, AccessError> {
        self.ensure_owner(caller)?;
        self.paused = true;
        info!(owner = %caller, "[access] paused");
        Ok(AdminEvent::Paused { by: caller })
    }

    /// Clears the pause flag (owner only).
    pub fn unpause(&mut self, caller: Address) -> Result<AdminEvent, AccessError> {
        self.ensure_owner(caller)?;
        self.paused = false;
        info!(owner = %caller, "[access] unpaused");
        Ok(AdminEvent::Unpaused { by: caller })
    }

    /// Moves the owner role (owner only).
    pub fn transfer_ownership(
        &mut self,
        caller: Address,
        new_owner: Address,
    ) -> Result<AdminEvent, AccessError> {
        self.ensure_owner(caller)?;
        if new_owner.is_zero() {
            return Err(AccessError::ZeroOwner);
        }
        self.owner = new_owner;
        Ok(AdminEvent::OwnershipTransferred {
            from: caller,
            to: new_owner,
        })
    }
}
