//! # End-to-End Flows
//!
//! Create → vote → finalize → record on L1 → acknowledge on L2, once per
//! membership strategy, plus the async relayer path.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use qb_01_membership::StrategyConfig;
    use qb_04_poll_engine::{PollEvent, PollStatus, QuorumRule};
    use qb_05_result_registry::RegistryEvent;
    use shared_types::{keccak256, Address, PollOutcome};
    use std::time::Duration;
    use tokio::sync::watch;
    use tokio::time::timeout;

    // =============================================================================
    // MANUAL GROUP
    // =============================================================================

    #[test]
    fn test_manual_group_full_lifecycle() {
        let net = devnet();
        let group = manual_group(&net, ALICE, &[ALICE, BOB, CAROL]);
        let poll = open_poll(&net, ALICE, group, ESCROW, QuorumRule::default());

        assert_eq!(vote(&net, BOB, poll, 1).unwrap(), 1);
        assert_eq!(vote(&net, CAROL, poll, 1).unwrap(), 1);
        assert_eq!(vote(&net, ALICE, poll, 0).unwrap(), 1);
        end_voting(&net);
        assert_eq!(net.l2.poll_status(poll).unwrap(), PollStatus::Ended);

        let record = finalize(&net, EXECUTOR, poll).unwrap();
        assert_eq!(record.outcome, PollOutcome::Winner(1));
        assert!(!net.l2.is_bridge_finalized(poll));

        // Finalize goes out, the registry records and acknowledges, the ack comes back.
        let outcomes = net.network.relay_all();
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| o.as_ref().unwrap().is_delivered()));

        let l1_record = net.l1.get_record(group, poll);
        assert!(l1_record.recorded);
        assert_eq!(l1_record.outcome, Some(PollOutcome::Winner(1)));
        assert_eq!(l1_record.origin_message_id, sent_message_id(&record));
        assert!(net.l2.is_bridge_finalized(poll));
        assert_eq!(net.l2.poll_status(poll).unwrap(), PollStatus::Finalized);

        let ack_event = net.l2.view(|engine| engine.event_log().last().cloned());
        assert_eq!(
            ack_event,
            Some(PollEvent::AckReceived {
                finalize_key: record.finalize_key,
                origin_message_id: l1_record.origin_message_id,
                poll_id: Some(poll),
            })
        );
    }

    #[test]
    fn test_settlement_balances_after_success() {
        let net = devnet();
        let config = net.config().clone();
        let group = manual_group(&net, ALICE, &[BOB]);
        let poll = open_poll(&net, ALICE, group, ESCROW, QuorumRule::default());
        vote(&net, BOB, poll, 0).unwrap();
        end_voting(&net);

        let record = finalize(&net, EXECUTOR, poll).unwrap();
        let fee = finalize_fee(&net);
        let remaining = ESCROW - fee - config.executor_reward;
        let platform = bps_of(remaining, config.success_fee_bps);

        assert_eq!(record.settlement.bridge_fee, fee);
        assert_eq!(record.settlement.platform_fee, platform);
        assert_eq!(record.settlement.refund, remaining - platform);
        assert_eq!(net.l2_token.balance_of(EXECUTOR), config.executor_reward);
        assert_eq!(net.l2_token.balance_of(config.treasury), platform);
        assert_eq!(net.l2_token.balance_of(ALICE), remaining - platform);
        assert_eq!(net.l2_token.balance_of(config.l2.fee_vault), fee);
        assert_eq!(net.l2_token.balance_of(config.poll_engine), 0);
        assert_eq!(net.l2.view(|engine| engine.escrow_balance(poll)), 0);

        net.network.relay_all();
        assert_eq!(
            net.l1_token.balance_of(config.result_registry),
            config.registry_funding - ack_fee(&net)
        );
    }

    // =============================================================================
    // CLAIM-CODE GROUP
    // =============================================================================

    #[test]
    fn test_claim_code_group_quorum_failure_is_mirrored() {
        let net = devnet();
        let code = keccak256(b"open-sesame");
        let group = net.l2.execute(ALICE, |ctx, engine| {
            engine
                .membership_mut()
                .create_group(ctx, "club", "code gated", StrategyConfig::ClaimCode { code_hash: Some(code) })
                .unwrap()
        });
        for member in [BOB, CAROL, DAVE, EVE] {
            net.l2
                .execute(member, |ctx, engine| {
                    engine.membership_mut().claim_with_code(ctx, group, code)
                })
                .unwrap();
        }
        let eligible = net.l2.view(|engine| engine.membership().eligible_count(group).unwrap());
        assert_eq!(eligible, 4);

        // 60% of 4 needs 3 votes; only one arrives.
        let poll = open_poll(
            &net,
            BOB,
            group,
            ESCROW,
            QuorumRule {
                enabled: true,
                threshold_bps: 6_000,
            },
        );
        vote(&net, CAROL, poll, 0).unwrap();
        end_voting(&net);

        let record = finalize(&net, EXECUTOR, poll).unwrap();
        assert_eq!(record.outcome, PollOutcome::QuorumFailed);
        net.network.relay_all();

        assert_eq!(
            net.l1.get_record(group, poll).outcome,
            Some(PollOutcome::QuorumFailed)
        );
        assert!(net.l2.is_bridge_finalized(poll));
    }

    // =============================================================================
    // NFT GROUP
    // =============================================================================

    #[test]
    fn test_nft_group_snapshot_and_live_membership() {
        let net = devnet();
        let collection = Address::from_low_u64(0x9F7);
        net.nft.mint(collection, BOB, 1);
        net.nft.mint(collection, CAROL, 3);

        let group = net.l2.execute(ALICE, |ctx, engine| {
            let registry = engine.membership_mut();
            let group = registry
                .create_group(ctx, "holders", "", StrategyConfig::Nft { collection: None })
                .unwrap();
            registry.set_group_nft_collection(ctx, group, collection).unwrap();
            group
        });

        let poll = open_poll(&net, BOB, group, ESCROW, QuorumRule::default());
        let snapshot = net.l2.view(|engine| engine.poll(poll).unwrap().eligible_snapshot);
        assert_eq!(snapshot, 2);

        // Minting after creation does not move the snapshot but grants a vote.
        net.nft.mint(collection, DAVE, 1);
        vote(&net, DAVE, poll, 2).unwrap();

        // Selling the NFT revokes membership for later calls.
        net.nft.burn_all(collection, CAROL);
        assert!(vote(&net, CAROL, poll, 0).is_err());

        end_voting(&net);
        let record = finalize(&net, EXECUTOR, poll).unwrap();
        assert_eq!(record.outcome, PollOutcome::Winner(2));
        assert_eq!(net.l2.view(|engine| engine.poll(poll).unwrap().eligible_snapshot), 2);
    }

    // =============================================================================
    // DELEGATION
    // =============================================================================

    #[test]
    fn test_delegated_weight_decides_outcome() {
        let net = devnet();
        let group = manual_group(&net, ALICE, &[ALICE, BOB, CAROL, DAVE]);
        let poll = open_poll(&net, ALICE, group, ESCROW, QuorumRule::default());

        delegate(&net, CAROL, poll, DAVE).unwrap();
        delegate(&net, BOB, poll, DAVE).unwrap();
        vote(&net, ALICE, poll, 0).unwrap();
        assert_eq!(vote(&net, DAVE, poll, 1).unwrap(), 3);
        assert!(vote(&net, CAROL, poll, 0).is_err());

        end_voting(&net);
        let record = finalize(&net, EXECUTOR, poll).unwrap();
        assert_eq!(record.outcome, PollOutcome::Winner(1));
        assert_eq!(net.l2.view(|engine| engine.tallies(poll).unwrap()), vec![1, 3, 0]);
    }

    // =============================================================================
    // EVENTS
    // =============================================================================

    #[test]
    fn test_registry_events_scan_by_block_range() {
        let net = devnet();
        let group = manual_group(&net, ALICE, &[BOB]);
        let first = open_poll(&net, ALICE, group, ESCROW, QuorumRule::default());
        let second = open_poll(&net, ALICE, group, ESCROW, QuorumRule::default());
        end_voting(&net);

        finalize(&net, EXECUTOR, first).unwrap();
        net.network.relay_all();
        let boundary = net.l1_ledger.block_number();
        net.l1_ledger.mine_block();
        finalize(&net, EXECUTOR, second).unwrap();
        net.network.relay_all();

        let (early, late) = net.l1.view(|registry| {
            (
                registry.event_log().in_block_range(0, boundary),
                registry.event_log().in_block_range(boundary + 1, u64::MAX),
            )
        });
        let recorded = |events: &[shared_types::LoggedEvent<RegistryEvent>]| {
            events
                .iter()
                .filter_map(|e| match e.event {
                    RegistryEvent::ResultRecorded { poll_id, .. } => Some(poll_id),
                    _ => None,
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(recorded(&early), vec![first]);
        assert_eq!(recorded(&late), vec![second]);
    }

    // =============================================================================
    // ASYNC RELAYER
    // =============================================================================

    #[tokio::test]
    async fn test_relayer_delivers_round_trip() {
        let net = devnet();
        let group = manual_group(&net, ALICE, &[BOB]);
        let poll = open_poll(&net, ALICE, group, ESCROW, QuorumRule::default());
        vote(&net, BOB, poll, 0).unwrap();
        end_voting(&net);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let relayer = net.spawn_relayer(shutdown_rx);
        finalize(&net, EXECUTOR, poll).unwrap();

        timeout(Duration::from_secs(5), async {
            while !net.l2.is_bridge_finalized(poll) {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("acknowledgment within 5s");
        assert!(net.l1.is_recorded(group, poll));

        shutdown_tx.send(true).unwrap();
        timeout(Duration::from_secs(1), relayer)
            .await
            .expect("relayer stops")
            .unwrap();
    }
}
