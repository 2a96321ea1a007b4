//! # Lifecycle Flows
//!
//! Validator: register → join → active → rewarded → leave → inactive → exit.
//! Delegator: delegate → rewarded → redelegate (fee) → undelegate → claim.

#[cfg(test)]
mod tests {
    use crate::fixtures::{account, pause_authority, StakingStack};
    use qc_18_staking::{StakingError, StakingEvent, ValidatorStatus};
    use shared_types::{Address, Amount};

    #[test]
    fn test_validator_full_lifecycle() {
        let stack = StakingStack::new();
        let v1 = stack.activate(1, 5_010, 1_000);
        let v2 = stack.register(2, 2_010, 2_000);
        stack.manager.join_validator_set(v2, v2).unwrap();
        stack.manager.on_new_epoch().unwrap();
        assert_eq!(stack.manager.active_set(), vec![v1, v2]);
        assert_eq!(stack.manager.total_voting_power(), 7_020);

        // 700 split by weight 5010 : 2010, one unit of dust carried
        stack.rewarded_epoch(700);
        assert_eq!(stack.manager.voting_power(&v1), 5_509);
        assert_eq!(stack.manager.voting_power(&v2), 2_210);
        assert_eq!(stack.manager.total_voting_power(), 7_719);
        assert_eq!(stack.manager.reward_pool(), 1);
        assert_eq!(stack.pool(&v1).reward_record(2).unwrap().commission, 49);

        // Leaving takes effect at the boundary; the dust goes to the sink
        // because no one proposed in the new epoch
        stack.manager.leave_validator_set(v2, v2).unwrap();
        assert_eq!(
            stack.manager.validator_status(&v2),
            Some(ValidatorStatus::PendingInactive)
        );
        let report = stack.manager.on_new_epoch().unwrap();
        assert_eq!(report.demoted, vec![v2]);
        assert_eq!(report.forwarded_to_sink, 1);
        assert_eq!(stack.sink.total(), 1);
        assert_eq!(stack.manager.voting_power(&v2), 0);
        assert_eq!(stack.manager.total_voting_power(), 5_509);
        assert_eq!(stack.manager.validator(&v2).unwrap().validator_index, None);

        // Operator withdraws every share it holds, the lock stays
        let pool = stack.pool(&v2);
        let shares = pool.shares_of(&v2);
        let value = pool.pooled_by_shares(shares).unwrap();
        assert_eq!(stack.router.undelegate(v2, v2, shares).unwrap(), value);
        stack.manager.on_new_epoch().unwrap();
        assert_eq!(stack.router.claim(v2, v2).unwrap(), value);
        assert_eq!(stack.ledger.balance_of(&v2), value);

        let pool = stack.pool(&v2);
        assert_eq!(pool.shares_of(&Address::DEAD), 10);
        assert!(pool.bonded() >= 10);
        stack.assert_conserved(&[v1, v2]);
        stack.assert_voting_power_consistent();
    }

    #[test]
    fn test_delegator_journey_with_redelegation() {
        let stack = StakingStack::new();
        let v1 = stack.activate(1, 10_000, 0);
        let v2 = stack.activate(2, 5_000, 0);
        let alice = account(0xA1);

        assert_eq!(stack.router.delegate(alice, v1, 2_000).unwrap(), 2_000);
        stack.manager.on_new_epoch().unwrap();
        assert_eq!(stack.manager.voting_power(&v1), 12_000);

        stack.rewarded_epoch(1_500);
        let staked = stack.pool(&v1).stake_of(&alice);
        assert!(staked > 2_000);

        let outcome = stack.router.redelegate(alice, v1, v2, 2_000, true).unwrap();
        assert_eq!(outcome.amount, staked);
        assert_eq!(outcome.fee, staked / 100);
        assert_eq!(stack.pool(&v1).shares_of(&alice), 0);
        assert_eq!(stack.pool(&v2).shares_of(&alice), outcome.shares);
        assert_eq!(stack.mirror.delegatee_of(&alice), Some(v2));

        let unlocked = stack.router.undelegate(alice, v2, outcome.shares).unwrap();
        assert!(unlocked < outcome.amount);
        stack.manager.on_new_epoch().unwrap();
        assert_eq!(stack.router.claim_batch(alice, &[v1, v2]).unwrap(), unlocked);

        let events = stack.manager.take_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, StakingEvent::Redelegated { fee, .. } if *fee == outcome.fee)));

        let pooled: Amount = [v1, v2].iter().map(|v| stack.pool(v).total_pooled()).sum();
        let distributed = 1_500 - stack.manager.reward_pool() - stack.sink.total();
        assert_eq!(
            pooled + stack.ledger.total_paid(),
            10_000 + 5_000 + 2_000 + distributed
        );
        stack.assert_conserved(&[v1, v2]);
    }

    #[test]
    fn test_reactivated_unlock_keeps_earning() {
        let stack = StakingStack::new();
        let v1 = stack.activate(1, 10_000, 0);
        let bob = account(0xB0);

        stack.router.delegate(bob, v1, 1_000).unwrap();
        stack.manager.on_new_epoch().unwrap();
        stack.router.undelegate(bob, v1, 1_000).unwrap();
        assert_eq!(stack.router.reactivate(bob, v1, 400).unwrap(), 400);
        assert_eq!(stack.pool(&v1).pending_inactive_of(&bob), 600);

        stack.rewarded_epoch(1_100);
        let pool = stack.pool(&v1);
        // 400 reactivated shared the reward; the 600 unlock did not
        assert!(pool.stake_of(&bob) > 400);
        assert_eq!(pool.claimable_of(&bob), 600);
        assert_eq!(stack.router.claim(bob, v1).unwrap(), 600);
        stack.assert_conserved(&[v1]);
    }

    #[test]
    fn test_set_ceiling_and_indexes_under_churn() {
        let mut config = crate::fixtures::suite_config();
        config.max_validator_count = 3;
        let stack = StakingStack::with_config(config);

        let a = stack.activate(1, 10_000, 0);
        let b = stack.activate(2, 4_000, 0);
        let c = stack.activate(3, 4_000, 0);
        let d = stack.register(4, 4_000, 0);
        assert_eq!(
            stack.manager.join_validator_set(d, d),
            Err(StakingError::ValidatorSetFull { current: 3, max: 3 })
        );

        stack.manager.leave_validator_set(b, b).unwrap();
        stack.manager.on_new_epoch().unwrap();
        stack.manager.join_validator_set(d, d).unwrap();
        stack.manager.on_new_epoch().unwrap();

        assert_eq!(stack.manager.active_set(), vec![a, c, d]);
        for (index, validator) in [a, c, d].iter().enumerate() {
            let record = stack.manager.validator(validator).unwrap();
            assert_eq!(record.validator_index, Some(index as u64));
        }
        stack.assert_voting_power_consistent();
    }

    #[test]
    fn test_pause_blocks_users_not_epochs() {
        let stack = StakingStack::new();
        let v1 = stack.activate(1, 10_000, 0);
        let alice = account(0xA1);

        assert_eq!(
            stack.router.pause(alice),
            Err(StakingError::Unauthorized(alice))
        );
        stack.router.pause(pause_authority()).unwrap();
        assert_eq!(
            stack.router.delegate(alice, v1, 100),
            Err(StakingError::Paused)
        );
        stack.rewarded_epoch(100);
        assert_eq!(stack.manager.epoch_info().epoch, 2);

        stack.router.unpause(pause_authority()).unwrap();
        assert!(stack.router.delegate(alice, v1, 100).is_ok());
    }
}
