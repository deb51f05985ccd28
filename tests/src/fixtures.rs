//! Shared setup for the integration flows.

use qb_01_membership::StrategyConfig;
use qb_04_poll_engine::{FinalizationRecord, NewPoll, PollError, QuorumRule, Transmission};
use qb_runtime::{Devnet, RuntimeConfig};
use qb_telemetry::{init_tracing, TelemetryConfig};
use shared_types::{Address, Amount, GroupId, Hash, PollId};

pub const ALICE: Address = Address::new([0xA1; 20]);
pub const BOB: Address = Address::new([0xB0; 20]);
pub const CAROL: Address = Address::new([0xCA; 20]);
pub const DAVE: Address = Address::new([0xDA; 20]);
pub const EVE: Address = Address::new([0xEE; 20]);
pub const EXECUTOR: Address = Address::new([0xE8; 20]);

/// Voting window used by `open_poll`.
pub const VOTING_SECS: u64 = 3_600;

/// Default escrow, enough for the default fee schedule and reward.
pub const ESCROW: Amount = 200_000;

/// Devnet with default configuration and quiet logging.
pub fn devnet() -> Devnet {
    devnet_with(RuntimeConfig::default())
}

/// Devnet with a custom configuration.
pub fn devnet_with(config: RuntimeConfig) -> Devnet {
    let _ = init_tracing(&TelemetryConfig {
        log_level: "warn".into(),
        ..TelemetryConfig::default()
    });
    Devnet::new(config).expect("devnet wiring")
}

/// Manual group owned by `owner` with the given members.
pub fn manual_group(devnet: &Devnet, owner: Address, members: &[Address]) -> GroupId {
    devnet.l2.execute(owner, |ctx, engine| {
        let registry = engine.membership_mut();
        let group_id = registry
            .create_group(ctx, "test group", "", StrategyConfig::Manual)
            .expect("create group");
        for member in members {
            registry
                .set_manual_member(ctx, group_id, *member, true)
                .expect("add member");
        }
        group_id
    })
}

/// Poll that is active immediately, funded with `escrow` by `creator`.
pub fn open_poll(
    devnet: &Devnet,
    creator: Address,
    group_id: GroupId,
    escrow: Amount,
    quorum: QuorumRule,
) -> PollId {
    try_open_poll(devnet, creator, group_id, escrow, quorum).expect("create poll")
}

/// Same as `open_poll` but returns the engine's answer.
pub fn try_open_poll(
    devnet: &Devnet,
    creator: Address,
    group_id: GroupId,
    escrow: Amount,
    quorum: QuorumRule,
) -> Result<PollId, PollError> {
    if escrow > 0 {
        devnet
            .fund_l2_account(creator, escrow)
            .expect("fund creator");
    }
    let now = devnet.l2_ledger.timestamp();
    devnet.l2.execute(creator, |ctx, engine| {
        engine.create_poll(
            ctx,
            NewPoll {
                group_id,
                title: "proposal".into(),
                content_pointer: "bafy-test".into(),
                options: vec!["yes".into(), "no".into(), "abstain".into()],
                start_time: now,
                end_time: now + VOTING_SECS,
                quorum,
                initial_escrow: escrow,
            },
        )
    })
}

pub fn vote(devnet: &Devnet, voter: Address, poll_id: PollId, option: u32) -> Result<u64, PollError> {
    devnet
        .l2
        .execute(voter, |ctx, engine| engine.vote(ctx, poll_id, option))
}

pub fn delegate(devnet: &Devnet, from: Address, poll_id: PollId, to: Address) -> Result<(), PollError> {
    devnet
        .l2
        .execute(from, |ctx, engine| engine.delegate(ctx, poll_id, to))
}

/// Closes every open voting window.
pub fn end_voting(devnet: &Devnet) {
    devnet.advance_time(VOTING_SECS);
}

pub fn finalize(devnet: &Devnet, executor: Address, poll_id: PollId) -> Result<FinalizationRecord, PollError> {
    devnet
        .l2
        .execute(executor, |ctx, engine| engine.finalize(ctx, poll_id))
}

/// Bridge id of a transmitted finalize.
pub fn sent_message_id(record: &FinalizationRecord) -> Hash {
    match record.transmission {
        Transmission::Sent { message_id, .. } => message_id,
        ref other => panic!("finalize was not transmitted: {other:?}"),
    }
}

/// L2 router fee for one finalize message (three ABI words).
pub fn finalize_fee(devnet: &Devnet) -> Amount {
    devnet.config().l2.fee_schedule.quote(96)
}

/// L1 router fee for one acknowledgment (two ABI words).
pub fn ack_fee(devnet: &Devnet) -> Amount {
    devnet.config().l1.fee_schedule.quote(64)
}

/// `bps` of `amount`, rounded down.
pub fn bps_of(amount: Amount, bps: u64) -> Amount {
    amount * Amount::from(bps) / 10_000
}
