//! # Adversarial Provenance
//!
//! The bridge does not authenticate payloads; only `(source_chain, sender)`
//! stamped by the source router is trusted. Forged, misrouted and malformed
//! messages must be rejected without recording anything.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use qb_04_poll_engine::{PollError, PollStatus, QuorumRule};
    use qb_05_result_registry::RegistryError;
    use shared_bus::{CrossChainMessage, DeliveryOutcome};
    use shared_types::{
        keccak256, AccessError, AckPayload, Address, ChainSelector, FinalizeKey, FinalizePayload,
        Hash, PollOutcome,
    };

    fn forged(
        source_chain: ChainSelector,
        sender: Address,
        dest_chain: ChainSelector,
        receiver: Address,
        data: Vec<u8>,
    ) -> CrossChainMessage {
        CrossChainMessage {
            message_id: keccak256(&data),
            source_chain,
            sender,
            dest_chain,
            receiver,
            data,
            fee_paid: 0,
            sent_at_block: 1,
        }
    }

    fn finalize_payload(group_id: u64, poll_id: u64, outcome: PollOutcome) -> Vec<u8> {
        FinalizePayload {
            group_id,
            poll_id,
            outcome,
        }
        .encode()
    }

    fn assert_dead_lettered(outcome: Option<Result<DeliveryOutcome, shared_bus::BridgeError>>) -> String {
        match outcome {
            Some(Ok(DeliveryOutcome::DeadLettered { reason, .. })) => reason,
            other => panic!("expected a dead letter, got {other:?}"),
        }
    }

    // =============================================================================
    // L1 INBOUND
    // =============================================================================

    #[test]
    fn test_finalize_from_unknown_sender_rejected() {
        let net = devnet();
        let config = net.config().clone();
        let attacker = Address::from_low_u64(0xBAD);

        net.network.inject(forged(
            config.l2.selector,
            attacker,
            config.l1.selector,
            config.result_registry,
            finalize_payload(1, 1, PollOutcome::Winner(0)),
        ));
        let reason = assert_dead_lettered(net.network.relay_next());

        assert!(reason.contains("disallowed source"));
        assert!(!net.l1.is_recorded(1, 1));
        assert_eq!(net.network.pending_count(), 0);
        assert_eq!(net.l1.view(|registry| registry.record_count()), 0);
    }

    #[test]
    fn test_finalize_with_right_sender_wrong_chain_rejected() {
        let net = devnet();
        let config = net.config().clone();

        net.network.inject(forged(
            ChainSelector(4242),
            config.poll_engine,
            config.l1.selector,
            config.result_registry,
            finalize_payload(1, 1, PollOutcome::Winner(1)),
        ));
        assert_dead_lettered(net.network.relay_next());
        assert!(!net.l1.is_recorded(1, 1));
    }

    #[test]
    fn test_forged_finalize_cannot_preempt_real_result() {
        let net = devnet();
        let config = net.config().clone();
        let group = manual_group(&net, ALICE, &[BOB]);
        let poll = open_poll(&net, ALICE, group, ESCROW, QuorumRule::default());
        vote(&net, BOB, poll, 2).unwrap();
        end_voting(&net);

        net.network.inject(forged(
            config.l2.selector,
            Address::from_low_u64(0xBAD),
            config.l1.selector,
            config.result_registry,
            finalize_payload(group, poll, PollOutcome::Winner(0)),
        ));
        assert_dead_lettered(net.network.relay_next());

        finalize(&net, EXECUTOR, poll).unwrap();
        net.network.relay_all();
        assert_eq!(
            net.l1.get_record(group, poll).outcome,
            Some(PollOutcome::Winner(2))
        );
    }

    #[test]
    fn test_malformed_payload_from_allowed_source_rejected() {
        let net = devnet();
        let config = net.config().clone();
        let mut data = finalize_payload(1, 1, PollOutcome::Winner(0));
        data.truncate(70);

        net.network.inject(forged(
            config.l2.selector,
            config.poll_engine,
            config.l1.selector,
            config.result_registry,
            data,
        ));
        let reason = assert_dead_lettered(net.network.relay_next());
        assert!(reason.contains("malformed payload"));
        assert_eq!(net.l1.view(|registry| registry.record_count()), 0);
    }

    #[test]
    fn test_direct_call_bypassing_router_rejected() {
        let net = devnet();
        let config = net.config().clone();
        let attacker = Address::from_low_u64(0xBAD);
        let message = forged(
            config.l2.selector,
            config.poll_engine,
            config.l1.selector,
            config.result_registry,
            finalize_payload(1, 1, PollOutcome::Winner(0)),
        );

        let err = net
            .l1
            .execute(attacker, |ctx, registry| registry.receive(ctx, &message))
            .unwrap_err();
        assert!(matches!(err, RegistryError::UnauthorizedRouter { caller, .. } if caller == attacker));
        assert!(!net.l1.is_recorded(1, 1));
    }

    // =============================================================================
    // L2 INBOUND
    // =============================================================================

    #[test]
    fn test_forged_ack_does_not_finalize() {
        let net = devnet();
        let config = net.config().clone();
        let group = manual_group(&net, ALICE, &[BOB]);
        let poll = open_poll(&net, ALICE, group, ESCROW, QuorumRule::default());
        end_voting(&net);
        finalize(&net, EXECUTOR, poll).unwrap();

        // Forged ack races ahead of the real finalize delivery.
        let ack = AckPayload {
            finalize_key: FinalizeKey::derive(group, poll),
            origin_message_id: Hash([9; 32]),
        }
        .encode();
        net.network.reorder_pending(|pending| {
            pending.insert(
                0,
                forged(
                    config.l1.selector,
                    Address::from_low_u64(0xBAD),
                    config.l2.selector,
                    config.poll_engine,
                    ack,
                ),
            )
        });
        assert_dead_lettered(net.network.relay_next());
        assert_eq!(net.l2.poll_status(poll).unwrap(), PollStatus::Ended);

        // The genuine round trip still completes.
        net.network.relay_all();
        assert_eq!(net.l2.poll_status(poll).unwrap(), PollStatus::Finalized);
        assert_eq!(net.network.dead_letters().len(), 1);
    }

    #[test]
    fn test_direct_ack_call_rejected() {
        let net = devnet();
        let config = net.config().clone();
        let message = forged(
            config.l1.selector,
            config.result_registry,
            config.l2.selector,
            config.poll_engine,
            AckPayload {
                finalize_key: FinalizeKey::derive(1, 1),
                origin_message_id: Hash::ZERO,
            }
            .encode(),
        );
        let err = net
            .l2
            .execute(EVE, |ctx, engine| engine.receive_ack(ctx, &message))
            .unwrap_err();
        assert!(matches!(err, PollError::UnauthorizedRouter { .. }));
        assert!(!net.l2.view(|engine| engine.ack_received(&FinalizeKey::derive(1, 1))));
    }

    // =============================================================================
    // ALLOW-LIST ADMINISTRATION
    // =============================================================================

    #[test]
    fn test_allow_lists_are_owner_gated() {
        let net = devnet();
        let config = net.config().clone();

        let err = net
            .l1
            .execute(EVE, |ctx, registry| {
                registry.set_allowed_source(ctx, config.l2.selector, EVE)
            })
            .unwrap_err();
        assert!(matches!(err, RegistryError::Access(AccessError::NotOwner { .. })));

        let err = net
            .l2
            .execute(EVE, |ctx, engine| {
                engine.set_ack_source(ctx, config.l1.selector, EVE)
            })
            .unwrap_err();
        assert!(matches!(err, PollError::Access(AccessError::NotOwner { .. })));

        assert_eq!(
            net.l1.view(|registry| registry.allowed_source()),
            Some((config.l2.selector, config.poll_engine))
        );
    }

    #[test]
    fn test_repointed_allow_list_rejects_old_sender() {
        let net = devnet();
        let config = net.config().clone();
        let group = manual_group(&net, ALICE, &[BOB]);
        let poll = open_poll(&net, ALICE, group, ESCROW, QuorumRule::default());
        end_voting(&net);

        let replacement = Address::from_low_u64(0xE1);
        net.l1
            .execute(config.deployer, |ctx, registry| {
                registry.set_allowed_source(ctx, config.l2.selector, replacement)
            })
            .unwrap();

        finalize(&net, EXECUTOR, poll).unwrap();
        assert_dead_lettered(net.network.relay_next());
        assert!(!net.l1.is_recorded(group, poll));
        assert_eq!(net.l2.poll_status(poll).unwrap(), PollStatus::Ended);
    }
}
