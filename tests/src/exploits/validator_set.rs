//! # Validator Set Attacks
//!
//! - Flooding the set with new power in one epoch
//! - Commission rug pulls against existing delegators
//! - Squatting another validator's identity (key, moniker, operator)
//! - Driving lifecycle calls for a validator the caller does not control

#[cfg(test)]
mod tests {
    use crate::fixtures::{account, registration, suite_config, StakingStack, START_TIME};
    use qc_18_staking::StakingError;

    #[test]
    fn test_joining_power_flood_is_capped_per_epoch() {
        let stack = StakingStack::new();
        let honest = stack.activate(1, 10_000, 0);
        let sybils: Vec<_> = (0xE1..=0xE3).map(|b| stack.register(b, 2_010, 0)).collect();

        stack.manager.join_validator_set(sybils[0], sybils[0]).unwrap();
        stack.manager.join_validator_set(sybils[1], sybils[1]).unwrap();
        assert_eq!(
            stack.manager.join_validator_set(sybils[2], sybils[2]),
            Err(StakingError::VotingPowerIncreaseExceeded {
                joining: 4_020,
                increase: 2_010,
                total: 10_000,
                limit_percent: 50,
            })
        );

        // Delegating into a joining validator draws on the same budget
        let backer = account(0xB0);
        assert!(matches!(
            stack.router.delegate(backer, sybils[0], 981),
            Err(StakingError::VotingPowerIncreaseExceeded { .. })
        ));
        stack.router.delegate(backer, sybils[0], 980).unwrap();
        assert_eq!(stack.manager.total_joining_power(), 5_000);

        stack.manager.on_new_epoch().unwrap();
        assert_eq!(stack.manager.total_joining_power(), 0);
        assert_eq!(stack.manager.total_voting_power(), 15_000);
        stack.manager.join_validator_set(sybils[2], sybils[2]).unwrap();

        stack.manager.on_new_epoch().unwrap();
        let sybil_power: u128 = sybils.iter().map(|v| stack.manager.voting_power(v)).sum();
        assert!(sybil_power < stack.manager.voting_power(&honest));
        stack.assert_voting_power_consistent();
    }

    #[test]
    fn test_commission_rug_pull_is_bounded() {
        let stack = StakingStack::new();
        let v1 = stack.activate(1, 10_000, 1_000);

        assert_eq!(
            stack.manager.update_commission_rate(v1, v1, 3_000),
            Err(StakingError::CommissionChangeTooLarge {
                delta: 2_000,
                max_change_rate: 1_000,
            })
        );
        stack.manager.update_commission_rate(v1, v1, 2_000).unwrap();
        assert_eq!(
            stack.manager.update_commission_rate(v1, v1, 3_000),
            Err(StakingError::CommissionUpdateTooFrequent {
                next_allowed: START_TIME + 3_600,
            })
        );

        stack.clock.advance(3_600);
        stack.manager.update_commission_rate(v1, v1, 3_000).unwrap();
        stack.clock.advance(3_600);
        assert_eq!(
            stack.manager.update_commission_rate(v1, v1, 3_100),
            Err(StakingError::CommissionRateTooHigh {
                rate: 3_100,
                max_rate: 3_000,
            })
        );

        // Delegators keep at least 70% of the growth
        let alice = account(0xA1);
        stack.router.delegate(alice, v1, 4_000).unwrap();
        stack.manager.on_new_epoch().unwrap();
        let before = stack.pool(&v1).stake_of(&alice);
        stack.rewarded_epoch(14_010);
        let gained = stack.pool(&v1).stake_of(&alice) - before;
        assert!(gained * 10 >= 4_000 * 7 - 10, "gained {gained}");
    }

    #[test]
    fn test_identity_squatting_rejected() {
        let stack = StakingStack::new();
        let v1 = stack.register(1, 5_000, 0);
        let attacker = account(0xE1);

        let mut stolen_key = registration(0xE1, 0);
        stolen_key.consensus_public_key = registration(1, 0).consensus_public_key;
        assert_eq!(
            stack.manager.register_validator(attacker, stolen_key, 5_000),
            Err(StakingError::DuplicateConsensusKey(v1))
        );

        let mut stolen_moniker = registration(0xE1, 0);
        stolen_moniker.moniker = "node-01".into();
        assert!(matches!(
            stack.manager.register_validator(attacker, stolen_moniker, 5_000),
            Err(StakingError::DuplicateMoniker(_))
        ));

        let mut stolen_operator = registration(0xE1, 0);
        stolen_operator.operator = Some(v1);
        assert_eq!(
            stack.manager.register_validator(attacker, stolen_operator, 5_000),
            Err(StakingError::DuplicateOperator(v1))
        );

        stack.register(0xE1, 5_000, 0);
        assert_eq!(
            stack.manager.update_consensus_key(attacker, attacker, vec![1; 48]),
            Err(StakingError::DuplicateConsensusKey(v1))
        );
        assert_eq!(
            stack.manager.update_operator(attacker, attacker, v1),
            Err(StakingError::DuplicateOperator(v1))
        );
        assert_eq!(
            stack.manager.register_validator(attacker, registration(0xE2, 0), 5_000),
            Err(StakingError::ValidatorAlreadyRegistered(attacker))
        );
    }

    #[test]
    fn test_foreign_validator_control_rejected() {
        let stack = StakingStack::new();
        let v1 = stack.register(1, 5_000, 500);
        let attacker = account(0xE1);
        let not_operator = Err(StakingError::NotOperator {
            caller: attacker,
            validator: v1,
        });
        let not_validator = Err(StakingError::NotValidator {
            caller: attacker,
            validator: v1,
        });

        assert_eq!(stack.manager.join_validator_set(attacker, v1), not_operator);
        assert_eq!(stack.manager.leave_validator_set(attacker, v1), not_operator);
        assert_eq!(stack.manager.update_commission_rate(attacker, v1, 0), not_operator);
        assert_eq!(
            stack.manager.update_consensus_key(attacker, v1, vec![0xEE; 48]),
            not_operator
        );
        assert_eq!(
            stack.manager.update_network_addresses(attacker, v1, Vec::new(), Vec::new()),
            not_operator
        );
        assert_eq!(stack.manager.update_operator(attacker, v1, attacker), not_validator);
        assert_eq!(
            stack.manager.update_commission_beneficiary(attacker, v1, attacker),
            not_validator
        );

        // After handing over the operator role the validator itself loses it
        let operator = account(0x0F);
        stack.manager.update_operator(v1, v1, operator).unwrap();
        assert!(matches!(
            stack.manager.join_validator_set(v1, v1),
            Err(StakingError::NotOperator { .. })
        ));
        stack.manager.join_validator_set(operator, v1).unwrap();
        assert_eq!(stack.manager.validator(&v1).unwrap().commission_beneficiary, v1);
    }

    #[test]
    fn test_pending_joins_count_toward_set_cap() {
        let mut config = suite_config();
        config.max_validator_count = 2;
        let stack = StakingStack::with_config(config);
        stack.activate(1, 10_000, 0);

        let b = stack.register(2, 2_010, 0);
        let c = stack.register(3, 2_010, 0);
        stack.manager.join_validator_set(b, b).unwrap();
        assert_eq!(
            stack.manager.join_validator_set(c, c),
            Err(StakingError::ValidatorSetFull { current: 2, max: 2 })
        );

        stack.manager.leave_validator_set(b, b).unwrap();
        stack.manager.join_validator_set(c, c).unwrap();
    }
}
