//! # Idempotency Under At-Least-Once Delivery
//!
//! The bridge may redeliver and reorder. Each finalize key is recorded once on
//! L1 and acknowledged once on L2, whatever the delivery pattern.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use qb_04_poll_engine::{PollError, PollEvent, QuorumRule};
    use qb_05_result_registry::RegistryEvent;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};
    use shared_bus::DeliveryOutcome;
    use shared_types::{PollId, PollOutcome};

    fn count_l1<F: Fn(&RegistryEvent) -> bool>(net: &qb_runtime::Devnet, pred: F) -> usize {
        net.l1
            .view(|registry| registry.events().iter().filter(|e| pred(&e.event)).count())
    }

    fn count_l2<F: Fn(&PollEvent) -> bool>(net: &qb_runtime::Devnet, pred: F) -> usize {
        net.l2
            .view(|engine| engine.events().iter().filter(|e| pred(&e.event)).count())
    }

    #[test]
    fn test_redelivered_finalize_is_a_noop() {
        let net = devnet();
        let group = manual_group(&net, ALICE, &[BOB]);
        let poll = open_poll(&net, ALICE, group, ESCROW, QuorumRule::default());
        vote(&net, BOB, poll, 0).unwrap();
        end_voting(&net);
        let record = finalize(&net, EXECUTOR, poll).unwrap();
        net.network.relay_all();

        let before = net.l1.get_record(group, poll);
        let l1_balance = net.l1_token.balance_of(net.config().result_registry);

        net.network.redeliver(sent_message_id(&record)).unwrap();
        net.network.redeliver(sent_message_id(&record)).unwrap();
        let outcomes = net.network.relay_all();

        // Accepted as no-ops: delivered, no new acknowledgment emitted.
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| o.as_ref().unwrap().is_delivered()));
        assert_eq!(net.network.pending_count(), 0);
        assert_eq!(net.l1.get_record(group, poll), before);
        assert_eq!(net.l1_token.balance_of(net.config().result_registry), l1_balance);
        assert_eq!(
            count_l1(&net, |e| matches!(e, RegistryEvent::DuplicateIgnored { .. })),
            2
        );
        assert_eq!(count_l1(&net, |e| matches!(e, RegistryEvent::AckSent { .. })), 1);
    }

    #[test]
    fn test_redelivered_ack_is_a_noop() {
        let net = devnet();
        let group = manual_group(&net, ALICE, &[BOB]);
        let poll = open_poll(&net, ALICE, group, ESCROW, QuorumRule::default());
        end_voting(&net);
        finalize(&net, EXECUTOR, poll).unwrap();
        net.network.relay_all();

        let ack_id = net.l1.get_record(group, poll).ack_message_id;
        net.network.redeliver(ack_id).unwrap();
        let outcomes = net.network.relay_all();

        assert!(outcomes[0].as_ref().unwrap().is_delivered());
        assert!(net.l2.is_bridge_finalized(poll));
        assert_eq!(
            count_l2(&net, |e| matches!(e, PollEvent::AckReceived { .. })),
            1
        );
    }

    #[test]
    fn test_finalize_twice_rejected() {
        let net = devnet();
        let group = manual_group(&net, ALICE, &[BOB]);
        let poll = open_poll(&net, ALICE, group, ESCROW * 2, QuorumRule::default());
        end_voting(&net);

        let record = finalize(&net, EXECUTOR, poll).unwrap();
        assert_eq!(record.outcome, PollOutcome::NoVotes);
        assert_eq!(
            finalize(&net, BOB, poll).unwrap_err(),
            PollError::AlreadyFinalized(poll)
        );
        net.network.relay_all();
        assert!(matches!(
            finalize(&net, BOB, poll),
            Err(PollError::AlreadyFinalized(_))
        ));
        assert_eq!(net.network.pending_count(), 0);
    }

    #[test]
    fn test_shuffled_delivery_with_redelivery_converges() {
        let mut rng = StdRng::seed_from_u64(0xB411_07);
        let net = devnet();
        let group = manual_group(&net, ALICE, &[BOB, CAROL]);

        let polls: Vec<PollId> = (0..6)
            .map(|_| open_poll(&net, ALICE, group, ESCROW, QuorumRule::default()))
            .collect();
        for (i, poll) in polls.iter().enumerate() {
            vote(&net, BOB, *poll, (i % 3) as u32).unwrap();
        }
        end_voting(&net);

        let mut finalize_ids = Vec::new();
        for poll in &polls {
            finalize_ids.push(sent_message_id(&finalize(&net, EXECUTOR, *poll).unwrap()));
        }

        // Deliver finalize messages in a random order, one by one, and
        // duplicate some of them before their first delivery completes.
        net.network.reorder_pending(|pending| pending.shuffle(&mut rng));
        while let Some(outcome) = net.network.relay_next() {
            let delivered = outcome.unwrap();
            assert!(delivered.is_delivered());
            if rng.gen_bool(0.3) {
                if let DeliveryOutcome::Delivered { message_id } = delivered {
                    net.network.redeliver(message_id).unwrap();
                }
            }
            net.network.reorder_pending(|pending| pending.shuffle(&mut rng));
        }

        // Replay every finalize once more, in yet another order.
        finalize_ids.shuffle(&mut rng);
        for id in &finalize_ids {
            net.network.redeliver(*id).unwrap();
        }
        for outcome in net.network.relay_all() {
            assert!(outcome.unwrap().is_delivered());
        }

        for (i, poll) in polls.iter().enumerate() {
            let record = net.l1.get_record(group, *poll);
            assert!(record.recorded);
            assert_eq!(record.outcome, Some(PollOutcome::Winner((i % 3) as u32)));
            assert!(net.l2.is_bridge_finalized(*poll));
        }
        assert_eq!(
            count_l1(&net, |e| matches!(e, RegistryEvent::ResultRecorded { .. })),
            polls.len()
        );
        assert_eq!(
            count_l2(&net, |e| matches!(e, PollEvent::AckReceived { .. })),
            polls.len()
        );
        assert!(net.network.dead_letters().is_empty());
    }
}
