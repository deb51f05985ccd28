//! # Membership Registry
//!
//! Sequential groups, each resolving membership through its own variant.
//! All mutating calls take a `TxContext`; the caller is `ctx.sender`.

use crate::domain::{Group, Membership, MembershipError, MembershipStrategy, StrategyConfig};
use crate::events::MembershipEvent;
use crate::ports::NftBalanceSource;
use shared_types::{Address, EventLog, GroupId, Hash, LoggedEvent, TxContext};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Registry of voting groups.
pub struct MembershipRegistry {
    groups: BTreeMap<GroupId, Group>,
    next_group_id: GroupId,
    nft: Arc<dyn NftBalanceSource>,
    events: EventLog<MembershipEvent>,
}

impl MembershipRegistry {
    /// Creates an empty registry backed by `nft` for NFT-gated groups.
    pub fn new(nft: Arc<dyn NftBalanceSource>) -> Self {
        Self {
            groups: BTreeMap::new(),
            next_group_id: 1,
            nft,
            events: EventLog::new(),
        }
    }

    /// Creates a group owned by the caller and returns its id.
    pub fn create_group(
        &mut self,
        ctx: &TxContext,
        name: &str,
        description: &str,
        strategy: StrategyConfig,
    ) -> Result<GroupId, MembershipError> {
        if name.is_empty() {
            debug!("[qb-01] Rejected group with empty name from {}", ctx.sender);
            return Err(MembershipError::EmptyName);
        }
        match strategy {
            StrategyConfig::Nft {
                collection: Some(collection),
            } if collection.is_zero() => return Err(MembershipError::ZeroAddress),
            StrategyConfig::ClaimCode {
                code_hash: Some(code_hash),
            } if code_hash.is_zero() => return Err(MembershipError::ZeroCodeHash),
            _ => {}
        }

        let group_id = self.next_group_id;
        self.next_group_id += 1;

        let group = Group {
            id: group_id,
            owner: ctx.sender,
            name: name.to_string(),
            description: description.to_string(),
            created_at: ctx.timestamp,
            membership: Membership::from_config(strategy),
        };
        let strategy_tag = group.strategy();
        self.groups.insert(group_id, group);

        info!(
            group_id,
            owner = %ctx.sender,
            strategy = ?strategy_tag,
            "[qb-01] Group created"
        );
        self.events.emit(
            ctx,
            MembershipEvent::GroupCreated {
                group_id,
                owner: ctx.sender,
                name: name.to_string(),
                strategy: strategy_tag,
            },
        );
        if let StrategyConfig::ClaimCode {
            code_hash: Some(code_hash),
        } = strategy
        {
            self.events.emit(
                ctx,
                MembershipEvent::ClaimCodeCreated {
                    group_id,
                    code_hash,
                },
            );
        }
        Ok(group_id)
    }

    /// Adds or removes a member of a Manual group. Owner only.
    pub fn set_manual_member(
        &mut self,
        ctx: &TxContext,
        group_id: GroupId,
        member: Address,
        is_member: bool,
    ) -> Result<(), MembershipError> {
        if member.is_zero() {
            return Err(MembershipError::ZeroAddress);
        }
        let group = self.owned_group_mut(ctx, group_id)?;
        let actual = group.strategy();
        let Membership::Manual { members } = &mut group.membership else {
            return Err(MembershipError::StrategyMismatch {
                group_id,
                expected: MembershipStrategy::Manual,
                actual,
            });
        };
        if is_member {
            members.insert(member);
        } else {
            members.remove(&member);
        }

        info!(group_id, %member, is_member, "[qb-01] Manual member set");
        self.events.emit(
            ctx,
            MembershipEvent::ManualMemberSet {
                group_id,
                member,
                is_member,
            },
        );
        Ok(())
    }

    /// Points an NFT group at its collection contract. Owner only.
    pub fn set_group_nft_collection(
        &mut self,
        ctx: &TxContext,
        group_id: GroupId,
        collection: Address,
    ) -> Result<(), MembershipError> {
        if collection.is_zero() {
            return Err(MembershipError::ZeroAddress);
        }
        let group = self.owned_group_mut(ctx, group_id)?;
        let actual = group.strategy();
        let Membership::Nft { collection: slot } = &mut group.membership else {
            return Err(MembershipError::StrategyMismatch {
                group_id,
                expected: MembershipStrategy::Nft,
                actual,
            });
        };
        *slot = Some(collection);

        info!(group_id, %collection, "[qb-01] NFT collection set");
        self.events.emit(
            ctx,
            MembershipEvent::NftCollectionSet {
                group_id,
                collection,
            },
        );
        Ok(())
    }

    /// Registers the claim code of a ClaimCode group. Owner only, once.
    pub fn create_claim_code(
        &mut self,
        ctx: &TxContext,
        group_id: GroupId,
        code_hash: Hash,
    ) -> Result<(), MembershipError> {
        if code_hash.is_zero() {
            return Err(MembershipError::ZeroCodeHash);
        }
        let group = self.owned_group_mut(ctx, group_id)?;
        let actual = group.strategy();
        let Membership::ClaimCode {
            code_hash: slot, ..
        } = &mut group.membership
        else {
            return Err(MembershipError::StrategyMismatch {
                group_id,
                expected: MembershipStrategy::ClaimCode,
                actual,
            });
        };
        if slot.is_some() {
            return Err(MembershipError::ClaimCodeAlreadySet(group_id));
        }
        *slot = Some(code_hash);

        info!(group_id, "[qb-01] Claim code created");
        self.events.emit(
            ctx,
            MembershipEvent::ClaimCodeCreated {
                group_id,
                code_hash,
            },
        );
        Ok(())
    }

    /// Redeems the claim code for the caller.
    ///
    /// A second claim by the same address fails with `AlreadyClaimed`.
    pub fn claim_with_code(
        &mut self,
        ctx: &TxContext,
        group_id: GroupId,
        code_hash: Hash,
    ) -> Result<(), MembershipError> {
        let group = self
            .groups
            .get_mut(&group_id)
            .ok_or(MembershipError::GroupNotFound(group_id))?;
        let actual = group.strategy();
        let Membership::ClaimCode {
            code_hash: expected,
            claimed,
        } = &mut group.membership
        else {
            return Err(MembershipError::StrategyMismatch {
                group_id,
                expected: MembershipStrategy::ClaimCode,
                actual,
            });
        };
        let expected = expected.ok_or(MembershipError::ClaimCodeNotSet(group_id))?;
        if claimed.contains(&ctx.sender) {
            return Err(MembershipError::AlreadyClaimed {
                group_id,
                member: ctx.sender,
            });
        }
        if expected != code_hash {
            warn!(group_id, caller = %ctx.sender, "[qb-01] Invalid claim code");
            return Err(MembershipError::InvalidClaimCode { group_id });
        }
        claimed.insert(ctx.sender);

        info!(group_id, member = %ctx.sender, "[qb-01] Code claimed");
        self.events.emit(
            ctx,
            MembershipEvent::CodeClaimed {
                group_id,
                member: ctx.sender,
            },
        );
        Ok(())
    }

    /// Resolves membership under the group's strategy.
    pub fn is_member(&self, group_id: GroupId, account: Address) -> Result<bool, MembershipError> {
        let group = self.group(group_id)?;
        let member = match &group.membership {
            Membership::Manual { members } => members.contains(&account),
            Membership::Nft {
                collection: Some(collection),
            } => self.nft.balance_of(*collection, account) >= 1,
            Membership::Nft { collection: None } => false,
            Membership::ClaimCode { claimed, .. } => claimed.contains(&account),
        };
        Ok(member)
    }

    /// Current number of eligible members.
    ///
    /// For NFT groups this is the collection's holder count at call time.
    pub fn eligible_count(&self, group_id: GroupId) -> Result<u64, MembershipError> {
        let group = self.group(group_id)?;
        let count = match &group.membership {
            Membership::Manual { members } => members.len() as u64,
            Membership::Nft {
                collection: Some(collection),
            } => self.nft.holder_count(*collection),
            Membership::Nft { collection: None } => 0,
            Membership::ClaimCode { claimed, .. } => claimed.len() as u64,
        };
        Ok(count)
    }

    /// Group by id.
    pub fn group(&self, group_id: GroupId) -> Result<&Group, MembershipError> {
        self.groups
            .get(&group_id)
            .ok_or(MembershipError::GroupNotFound(group_id))
    }

    /// True once `group_id` has been allocated.
    #[must_use]
    pub fn group_exists(&self, group_id: GroupId) -> bool {
        self.groups.contains_key(&group_id)
    }

    /// Number of groups created.
    #[must_use]
    pub fn group_count(&self) -> u64 {
        self.next_group_id - 1
    }

    /// Emitted events.
    #[must_use]
    pub fn events(&self) -> &[LoggedEvent<MembershipEvent>] {
        self.events.all()
    }

    /// Event log, for block-range queries.
    #[must_use]
    pub fn event_log(&self) -> &EventLog<MembershipEvent> {
        &self.events
    }

    fn owned_group_mut(
        &mut self,
        ctx: &TxContext,
        group_id: GroupId,
    ) -> Result<&mut Group, MembershipError> {
        let group = self
            .groups
            .get_mut(&group_id)
            .ok_or(MembershipError::GroupNotFound(group_id))?;
        if group.owner != ctx.sender {
            warn!(
                group_id,
                caller = %ctx.sender,
                "[qb-01] Non-owner attempted group configuration"
            );
            return Err(MembershipError::NotGroupOwner {
                group_id,
                caller: ctx.sender,
                owner: group.owner,
            });
        }
        Ok(group)
    }
}

impl std::fmt::Debug for MembershipRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MembershipRegistry")
            .field("groups", &self.groups.len())
            .field("next_group_id", &self.next_group_id)
            .finish_non_exhaustive()
    }
}
