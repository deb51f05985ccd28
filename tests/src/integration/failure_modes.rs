//! # Failure Modes
//!
//! Emergency pause, transport outages, under-funded escrow and an L1 registry
//! that cannot pay for its acknowledgment.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use qb_04_poll_engine::{PollError, PollStatus, QuorumRule, Transmission};
    use qb_runtime::RuntimeConfig;
    use shared_types::{AccessError, ChainSelector, PollOutcome};

    // =============================================================================
    // PAUSE
    // =============================================================================

    #[test]
    fn test_pause_blocks_voting_and_finalize_not_acks() {
        let net = devnet();
        let owner = net.config().deployer;
        let group = manual_group(&net, ALICE, &[BOB, CAROL]);
        let early = open_poll(&net, ALICE, group, ESCROW, QuorumRule::default());
        let late = open_poll(&net, ALICE, group, ESCROW, QuorumRule::default());
        vote(&net, BOB, early, 0).unwrap();
        end_voting(&net);
        finalize(&net, EXECUTOR, early).unwrap();

        net.l2.execute(owner, |ctx, engine| engine.pause(ctx)).unwrap();

        let paused = PollError::Access(AccessError::Paused);
        assert_eq!(finalize(&net, EXECUTOR, late).unwrap_err(), paused);

        let fresh = open_poll(&net, ALICE, group, ESCROW, QuorumRule::default());
        assert_eq!(vote(&net, CAROL, fresh, 1).unwrap_err(), paused);
        assert_eq!(delegate(&net, CAROL, fresh, BOB).unwrap_err(), paused);

        // The acknowledgment of the earlier finalize still lands.
        net.network.relay_all();
        assert!(net.l2.is_bridge_finalized(early));

        net.l2.execute(owner, |ctx, engine| engine.unpause(ctx)).unwrap();
        vote(&net, CAROL, fresh, 1).unwrap();
        finalize(&net, EXECUTOR, late).unwrap();
    }

    #[test]
    fn test_pause_blocks_revoke_not_top_ups() {
        let net = devnet();
        let owner = net.config().deployer;
        let group = manual_group(&net, ALICE, &[BOB, CAROL]);
        let poll = open_poll(&net, ALICE, group, ESCROW, QuorumRule::default());
        delegate(&net, CAROL, poll, BOB).unwrap();

        net.l2.execute(owner, |ctx, engine| engine.pause(ctx)).unwrap();

        let err = net
            .l2
            .execute(CAROL, |ctx, engine| engine.revoke(ctx, poll))
            .unwrap_err();
        assert_eq!(err, PollError::Access(AccessError::Paused));

        net.fund_l2_account(DAVE, 1_000).unwrap();
        let balance = net
            .l2
            .execute(DAVE, |ctx, engine| engine.top_up_escrow(ctx, poll, 1_000))
            .unwrap();
        assert_eq!(balance, ESCROW + 1_000);

        net.l2.execute(owner, |ctx, engine| engine.unpause(ctx)).unwrap();
        net.l2
            .execute(CAROL, |ctx, engine| engine.revoke(ctx, poll))
            .unwrap();
        assert!(net
            .l2
            .view(|engine| engine.delegation_of(poll, CAROL))
            .is_none());
    }

    #[test]
    fn test_only_owner_may_pause() {
        let net = devnet();
        let err = net
            .l2
            .execute(EVE, |ctx, engine| engine.pause(ctx))
            .unwrap_err();
        assert!(matches!(err, PollError::Access(AccessError::NotOwner { .. })));
        assert!(!net.l2.view(|engine| engine.is_paused()));
    }

    // =============================================================================
    // TRANSPORT FAILURE
    // =============================================================================

    #[test]
    fn test_router_outage_refunds_creator() {
        let net = devnet();
        let config = net.config().clone();
        let group = manual_group(&net, ALICE, &[BOB]);
        let poll = open_poll(&net, ALICE, group, ESCROW, QuorumRule::default());
        vote(&net, BOB, poll, 0).unwrap();
        end_voting(&net);

        net.l2_router.set_halted(true);
        let record = finalize(&net, EXECUTOR, poll).unwrap();

        assert!(matches!(record.transmission, Transmission::Failed { .. }));
        assert_eq!(record.settlement.bridge_fee, 0);
        assert_eq!(record.settlement.executor_reward, config.executor_reward);
        assert_eq!(record.settlement.platform_fee, config.failure_fee);
        assert_eq!(
            record.settlement.refund,
            ESCROW - config.executor_reward - config.failure_fee
        );
        assert_eq!(net.l2_token.balance_of(EXECUTOR), config.executor_reward);
        assert_eq!(net.l2_token.balance_of(config.l2.fee_vault), 0);
        assert_eq!(net.l2_token.allowance(config.poll_engine, config.l2.router), 0);
        assert_eq!(net.network.pending_count(), 0);

        // No retry primitive: the poll stays Ended, not bridge-confirmed.
        net.l2_router.set_halted(false);
        assert!(matches!(
            finalize(&net, EXECUTOR, poll),
            Err(PollError::AlreadyFinalized(_))
        ));
        assert_eq!(net.l2.poll_status(poll).unwrap(), PollStatus::Ended);
        assert!(!net.l2.is_bridge_finalized(poll));
    }

    #[test]
    fn test_unsupported_destination_takes_failure_path() {
        let net = devnet();
        let config = net.config().clone();
        let group = manual_group(&net, ALICE, &[BOB]);
        // Only the reward is required when no fee can be quoted.
        let escrow = config.executor_reward + 1_000;
        let poll = open_poll(&net, ALICE, group, escrow, QuorumRule::default());
        end_voting(&net);

        net.l2
            .execute(config.deployer, |ctx, engine| {
                engine.set_destination(ctx, ChainSelector(999), config.result_registry)
            })
            .unwrap();
        let record = finalize(&net, EXECUTOR, poll).unwrap();

        assert!(matches!(record.transmission, Transmission::Failed { .. }));
        assert_eq!(record.settlement.platform_fee, 1_000);
        assert_eq!(record.settlement.refund, 0);
        assert_eq!(net.l2.view(|engine| engine.escrow_balance(poll)), 0);
    }

    // =============================================================================
    // ESCROW
    // =============================================================================

    #[test]
    fn test_underfunded_escrow_rejects_then_top_up_succeeds() {
        let net = devnet();
        let config = net.config().clone();
        let group = manual_group(&net, ALICE, &[BOB]);
        let poll = open_poll(&net, ALICE, group, 1_000, QuorumRule::default());
        vote(&net, BOB, poll, 1).unwrap();
        end_voting(&net);

        let required = finalize_fee(&net) + config.executor_reward;
        assert_eq!(
            finalize(&net, EXECUTOR, poll).unwrap_err(),
            PollError::InsufficientEscrow {
                poll_id: poll,
                required,
                available: 1_000,
            }
        );
        assert!(net.l2.view(|engine| engine.finalization(poll).is_none()));
        assert_eq!(net.l2_token.balance_of(EXECUTOR), 0);

        // Anyone may top up; the executor funds it and finalizes.
        net.fund_l2_account(EXECUTOR, required).unwrap();
        let balance = net
            .l2
            .execute(EXECUTOR, |ctx, engine| engine.top_up_escrow(ctx, poll, required))
            .unwrap();
        assert_eq!(balance, required + 1_000);

        let record = finalize(&net, EXECUTOR, poll).unwrap();
        assert_eq!(record.outcome, PollOutcome::Winner(1));
        assert!(matches!(record.transmission, Transmission::Sent { .. }));
    }

    // =============================================================================
    // L1 REJECTIONS AND MANUAL RE-EXECUTION
    // =============================================================================

    #[test]
    fn test_unfunded_registry_dead_letters_until_funded() {
        let net = devnet_with(RuntimeConfig {
            registry_funding: 0,
            ..RuntimeConfig::default()
        });
        let config = net.config().clone();
        let group = manual_group(&net, ALICE, &[BOB]);
        let poll = open_poll(&net, ALICE, group, ESCROW, QuorumRule::default());
        end_voting(&net);
        let record = finalize(&net, EXECUTOR, poll).unwrap();

        net.network.relay_all();
        let letters = net.network.dead_letters();
        assert_eq!(letters.len(), 1);
        assert!(letters[0].reason.contains("insufficient fee balance"));
        assert!(!net.l1.is_recorded(group, poll));

        net.l1_token
            .mint(config.result_registry, ack_fee(&net))
            .unwrap();
        let outcome = net
            .network
            .retry_dead_letter(sent_message_id(&record))
            .unwrap();
        assert!(outcome.is_delivered());
        assert!(net.l1.is_recorded(group, poll));

        net.network.relay_all();
        assert!(net.l2.is_bridge_finalized(poll));
        assert_eq!(net.l1_token.balance_of(config.result_registry), 0);
    }

    #[test]
    fn test_paused_registry_dead_letters_until_unpaused() {
        let net = devnet();
        let owner = net.config().deployer;
        let group = manual_group(&net, ALICE, &[BOB]);
        let poll = open_poll(&net, ALICE, group, ESCROW, QuorumRule::default());
        end_voting(&net);
        let record = finalize(&net, EXECUTOR, poll).unwrap();

        net.l1.execute(owner, |ctx, registry| registry.pause(ctx)).unwrap();
        net.network.relay_all();
        assert_eq!(net.network.dead_letters()[0].attempts, 1);

        // A retry while still paused goes back to the queue.
        let id = sent_message_id(&record);
        assert!(!net.network.retry_dead_letter(id).unwrap().is_delivered());
        assert_eq!(net.network.dead_letters()[0].attempts, 2);

        net.l1.execute(owner, |ctx, registry| registry.unpause(ctx)).unwrap();
        assert!(net.network.retry_dead_letter(id).unwrap().is_delivered());
        net.network.relay_all();
        assert_eq!(net.l2.poll_status(poll).unwrap(), PollStatus::Finalized);
        assert!(net.network.dead_letters().is_empty());
    }

    #[test]
    fn test_l1_router_outage_reverts_record() {
        let net = devnet();
        let group = manual_group(&net, ALICE, &[BOB]);
        let poll = open_poll(&net, ALICE, group, ESCROW, QuorumRule::default());
        end_voting(&net);
        let record = finalize(&net, EXECUTOR, poll).unwrap();

        net.l1_router.set_halted(true);
        net.network.relay_all();
        assert!(!net.l1.is_recorded(group, poll));
        assert_eq!(
            net.l1_token
                .allowance(net.config().result_registry, net.config().l1.router),
            0
        );

        net.l1_router.set_halted(false);
        assert!(net
            .network
            .retry_dead_letter(sent_message_id(&record))
            .unwrap()
            .is_delivered());
        net.network.relay_all();
        assert!(net.l2.is_bridge_finalized(poll));
    }
}
