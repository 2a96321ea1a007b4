//! # Share Inflation
//!
//! Attacks on the share price: dust deposits after a price jump, rounding
//! harvest through deposit/withdraw cycles, and fee donations used to
//! dilute existing holders. Rounding must always favor the pool.

#[cfg(test)]
mod tests {
    use crate::fixtures::{account, StakingStack};
    use proptest::prelude::*;
    use qc_18_staking::{StakePool, StakingError};
    use shared_types::{Address, Amount};

    #[test]
    fn test_dust_deposit_after_price_jump_mints_nothing() {
        let stack = StakingStack::new();
        let v1 = stack.activate(1, 1_010, 0);
        stack.rewarded_epoch(9_090);

        let pool = stack.pool(&v1);
        assert_eq!(pool.bonded(), 10_100);
        assert_eq!(pool.total_shares(), 1_010);

        let attacker = account(0xE1);
        assert_eq!(
            stack.router.delegate(attacker, v1, 9),
            Err(StakingError::ZeroSharesMinted(9))
        );
        assert_eq!(stack.pool(&v1), pool);
        assert_eq!(stack.router.delegate(attacker, v1, 10), Ok(1));
    }

    #[test]
    fn test_deposit_withdraw_cycles_never_profit() {
        let stack = StakingStack::new();
        let v1 = stack.activate(1, 1_010, 0);
        stack.rewarded_epoch(2_525);
        let attacker = account(0xE1);
        let honest = stack.pool(&v1).stake_of(&v1);

        let mut spent: Amount = 0;
        let mut unlocked: Amount = 0;
        for _ in 0..20 {
            // 5 units buy one share worth 3.5 at this price
            let shares = stack.router.delegate(attacker, v1, 5).unwrap();
            spent += 5;
            unlocked += stack.router.undelegate(attacker, v1, shares).unwrap();
        }
        assert!(unlocked < spent);
        assert!(stack.pool(&v1).stake_of(&v1) >= honest);
        stack.assert_conserved(&[v1]);
    }

    #[test]
    fn test_redelegation_fee_rewards_existing_holders() {
        let stack = StakingStack::new();
        let v1 = stack.activate(1, 10_000, 0);
        let v2 = stack.activate(2, 5_000, 0);
        let (alice, whale) = (account(0xA1), account(0xE1));

        stack.router.delegate(alice, v2, 1_000).unwrap();
        stack.router.delegate(whale, v1, 3_000).unwrap();
        stack.manager.on_new_epoch().unwrap();

        let alice_before = stack.pool(&v2).stake_of(&alice);
        let operator_before = stack.pool(&v2).stake_of(&v2);
        let outcome = stack.router.redelegate(whale, v1, v2, 3_000, false).unwrap();
        assert_eq!(outcome.fee, 30);

        let pool = stack.pool(&v2);
        assert!(pool.stake_of(&alice) >= alice_before);
        assert!(pool.stake_of(&v2) >= operator_before);
        // The whale paid for entry and cannot walk out with the fee
        assert!(pool.stake_of(&whale) <= outcome.amount - outcome.fee);
        assert_eq!(pool.reward_record(3).unwrap().fees, 30);
        stack.assert_conserved(&[v1, v2]);
    }

    fn seeded_pool(seed: Amount, reward: Amount) -> StakePool {
        let validator = Address::repeat_byte(1);
        let mut pool = StakePool::new(validator);
        pool.delegate(Address::DEAD, 10, false).unwrap();
        pool.delegate(validator, seed, false).unwrap();
        pool.distribute_reward(reward, 0, validator, 1).unwrap();
        pool
    }

    proptest! {
        #[test]
        fn prop_round_trip_never_gains(
            seed in 1u128..1_000_000,
            reward in 0u128..1_000_000_000,
            amount in 1u128..1_000_000,
        ) {
            let mut pool = seeded_pool(seed, reward);
            let victim = Address::repeat_byte(1);
            let attacker = Address::repeat_byte(0xE1);
            let victim_before = pool.stake_of(&victim);

            match pool.delegate(attacker, amount, false) {
                Err(StakingError::ZeroSharesMinted(_)) => {}
                Err(other) => prop_assert!(false, "unexpected error {other:?}"),
                Ok(shares) => {
                    let value = pool.unlock(&attacker, shares).unwrap();
                    prop_assert!(value <= amount);
                    prop_assert!(pool.stake_of(&victim) >= victim_before);
                }
            }
            prop_assert!(pool.is_conserved());
        }
    }
}
