//! Scripted poll lifecycle used by `qb-devnet` and the runtime tests.
//!
//! One manual group, one poll with quorum, a delegation, finalize by a third
//! party, then a wait for the L1 record and the acknowledgment.

use crate::devnet::Devnet;
use crate::errors::RuntimeError;
use qb_01_membership::StrategyConfig;
use qb_04_poll_engine::{NewPoll, QuorumRule, Settlement, Transmission};
use serde::Serialize;
use shared_types::{Address, Amount, FinalizeKey, GroupId, PollId, PollOutcome};
use std::time::Duration;
use tracing::info;

/// Escrow the demo creator deposits.
pub const DEMO_ESCROW: Amount = 500_000;

/// What the demo observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DemoReport {
    /// Group created.
    pub group_id: GroupId,
    /// Poll created.
    pub poll_id: PollId,
    /// Correlation key.
    pub finalize_key: FinalizeKey,
    /// Final tallies.
    pub tallies: Vec<u64>,
    /// Local outcome.
    pub outcome: PollOutcome,
    /// Escrow distribution.
    pub settlement: Settlement,
    /// L1 recorded the result.
    pub recorded_on_l1: bool,
    /// L2 received the acknowledgment.
    pub acknowledged: bool,
}

/// Runs the demo. The relayer must already be running.
pub async fn run_demo(devnet: &Devnet, wait: Duration) -> Result<DemoReport, RuntimeError> {
    let alice = Address::from_low_u64(0xA11CE);
    let bob = Address::from_low_u64(0xB0B);
    let carol = Address::from_low_u64(0xCA401);
    let dave = Address::from_low_u64(0xDA7E);
    let executor = Address::from_low_u64(0xE8EC);

    let group_id = devnet.l2.execute(alice, |ctx, engine| {
        let registry = engine.membership_mut();
        let group_id =
            registry.create_group(ctx, "devnet", "scripted demo group", StrategyConfig::Manual)?;
        for member in [alice, bob, carol, dave] {
            registry.set_manual_member(ctx, group_id, member, true)?;
        }
        Ok::<_, RuntimeError>(group_id)
    })?;

    devnet.fund_l2_account(alice, DEMO_ESCROW)?;
    let start_time = devnet.l2_ledger.timestamp() + 60;
    let poll_id = devnet.l2.execute(alice, |ctx, engine| {
        engine.create_poll(
            ctx,
            NewPoll {
                group_id,
                title: "Ship the devnet?".into(),
                content_pointer: "bafy-demo".into(),
                options: vec!["yes".into(), "no".into()],
                start_time,
                end_time: start_time + 3_600,
                quorum: QuorumRule {
                    enabled: true,
                    threshold_bps: 5_000,
                },
                initial_escrow: DEMO_ESCROW,
            },
        )
    })?;
    info!(group_id, poll_id, "Demo poll created");

    devnet.advance_time(60);
    devnet.l2.execute(carol, |ctx, engine| engine.delegate(ctx, poll_id, dave))?;
    devnet.l2.execute(bob, |ctx, engine| engine.vote(ctx, poll_id, 0))?;
    devnet.l2.execute(dave, |ctx, engine| engine.vote(ctx, poll_id, 1))?;
    devnet.l2.execute(alice, |ctx, engine| engine.vote(ctx, poll_id, 0))?;

    devnet.advance_time(3_600);
    let record = devnet
        .l2
        .execute(executor, |ctx, engine| engine.finalize(ctx, poll_id))?;
    if let Transmission::Failed { reason } = &record.transmission {
        info!(poll_id, %reason, "Demo finalize could not reach L1");
    }

    let key = record.finalize_key;
    let acknowledged = wait_for_ack(devnet, poll_id, wait).await.is_ok();
    let recorded_on_l1 = devnet.l1.is_recorded(group_id, poll_id);
    let tallies = devnet.l2.view(|engine| engine.tallies(poll_id))?;

    let report = DemoReport {
        group_id,
        poll_id,
        finalize_key: key,
        tallies,
        outcome: record.outcome,
        settlement: record.settlement,
        recorded_on_l1,
        acknowledged,
    };
    info!(
        poll_id,
        outcome = ?report.outcome,
        recorded_on_l1,
        acknowledged,
        "Demo complete"
    );
    Ok(report)
}

async fn wait_for_ack(devnet: &Devnet, poll_id: PollId, wait: Duration) -> Result<(), RuntimeError> {
    let step = Duration::from_millis(devnet.config().relay_interval_ms);
    tokio::time::timeout(wait, async {
        while !devnet.l2.is_bridge_finalized(poll_id) {
            tokio::time::sleep(step).await;
        }
    })
    .await
    .map_err(|_| RuntimeError::Timeout("acknowledgment"))
}
