//! # Conservation Under Random Operations
//!
//! Arbitrary interleavings of delegator operations, reward deposits and
//! epoch passes. After every step:
//!
//! - each pool conserves value (buckets == inflow - outflow)
//! - pooled value plus payouts equals everything ever put in
//! - a rejected operation leaves every pool untouched
//! - after an epoch pass, voting power mirrors bonded stake

#[cfg(test)]
mod tests {
    use crate::fixtures::{account, StakingStack};
    use proptest::prelude::*;
    use qc_18_staking::{StakePool, StakingResult};
    use shared_types::{Address, Amount};

    const REGISTERED: Amount = 10_000 + 5_000 + 5_000;

    #[derive(Debug, Clone)]
    enum Op {
        Delegate { holder: u8, validator: u8, amount: Amount },
        Undelegate { holder: u8, validator: u8, percent: u8 },
        Reactivate { holder: u8, validator: u8, amount: Amount },
        Redelegate { holder: u8, src: u8, dst: u8, percent: u8 },
        Claim { holder: u8, validator: u8 },
        ClaimAll { holder: u8 },
        Epoch { reward: Amount },
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => (0..3u8, 0..3u8, 1..4_000u128)
                .prop_map(|(holder, validator, amount)| Op::Delegate { holder, validator, amount }),
            2 => (0..3u8, 0..3u8, 1..=100u8)
                .prop_map(|(holder, validator, percent)| Op::Undelegate { holder, validator, percent }),
            1 => (0..3u8, 0..3u8, 1..2_000u128)
                .prop_map(|(holder, validator, amount)| Op::Reactivate { holder, validator, amount }),
            2 => (0..3u8, 0..3u8, 0..3u8, 1..=100u8)
                .prop_map(|(holder, src, dst, percent)| Op::Redelegate { holder, src, dst, percent }),
            1 => (0..3u8, 0..3u8).prop_map(|(holder, validator)| Op::Claim { holder, validator }),
            1 => (0..3u8).prop_map(|holder| Op::ClaimAll { holder }),
            2 => (0..3_000u128).prop_map(|reward| Op::Epoch { reward }),
        ]
    }

    struct Harness {
        stack: StakingStack,
        validators: Vec<Address>,
        delegated: Amount,
        deposited: Amount,
    }

    impl Harness {
        fn new() -> Self {
            let stack = StakingStack::new();
            let validators = vec![
                stack.activate(1, 10_000, 1_000),
                stack.activate(2, 5_000, 0),
                stack.activate(3, 5_000, 2_500),
            ];
            Self {
                stack,
                validators,
                delegated: 0,
                deposited: 0,
            }
        }

        fn holder(byte: u8) -> Address {
            account(0xA0 + byte)
        }

        fn snapshot(&self) -> Vec<StakePool> {
            self.validators.iter().map(|v| self.stack.pool(v)).collect()
        }

        fn shares_fraction(&self, holder: &Address, validator: &Address, percent: u8) -> Amount {
            self.stack.pool(validator).shares_of(holder) * Amount::from(percent) / 100
        }

        fn apply(&mut self, op: &Op) -> StakingResult<()> {
            let router = &self.stack.router;
            match *op {
                Op::Delegate { holder, validator, amount } => {
                    router.delegate(Self::holder(holder), self.validators[validator as usize], amount)?;
                    self.delegated += amount;
                }
                Op::Undelegate { holder, validator, percent } => {
                    let (holder, validator) = (Self::holder(holder), self.validators[validator as usize]);
                    let shares = self.shares_fraction(&holder, &validator, percent);
                    router.undelegate(holder, validator, shares)?;
                }
                Op::Reactivate { holder, validator, amount } => {
                    router.reactivate(Self::holder(holder), self.validators[validator as usize], amount)?;
                }
                Op::Redelegate { holder, src, dst, percent } => {
                    let holder = Self::holder(holder);
                    let (src, dst) = (self.validators[src as usize], self.validators[dst as usize]);
                    let shares = self.shares_fraction(&holder, &src, percent);
                    router.redelegate(holder, src, dst, shares, false)?;
                }
                Op::Claim { holder, validator } => {
                    router.claim(Self::holder(holder), self.validators[validator as usize])?;
                }
                Op::ClaimAll { holder } => {
                    router.claim_batch(Self::holder(holder), &self.validators)?;
                }
                Op::Epoch { reward } => {
                    self.stack.even_performance();
                    if reward > 0 {
                        self.stack.manager.deposit_block_reward(reward)?;
                        self.deposited += reward;
                    }
                    self.stack.manager.on_new_epoch()?;
                }
            }
            Ok(())
        }

        fn assert_global_conservation(&self) {
            let pooled: Amount = self
                .validators
                .iter()
                .map(|v| self.stack.pool(v).total_pooled())
                .sum();
            let distributed =
                self.deposited - self.stack.manager.reward_pool() - self.stack.sink.total();
            assert_eq!(
                pooled + self.stack.ledger.total_paid(),
                REGISTERED + self.delegated + distributed
            );
        }

        fn assert_voting_power_tracks_stake(&self) {
            let maximum = self.stack.manager.stake_config().maximum_stake;
            for validator in self.stack.manager.active_set() {
                let bonded = self.stack.pool(&validator).bonded();
                assert_eq!(self.stack.manager.voting_power(&validator), bonded.min(maximum));
            }
            self.stack.assert_voting_power_consistent();
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        #[test]
        fn prop_value_is_conserved(ops in proptest::collection::vec(op_strategy(), 1..40)) {
            let mut harness = Harness::new();
            for op in &ops {
                let before = harness.snapshot();
                let paid_before = harness.stack.ledger.total_paid();
                let result = harness.apply(op);

                harness.stack.assert_conserved(&harness.validators);
                harness.assert_global_conservation();
                match result {
                    Ok(()) => {
                        if matches!(op, Op::Epoch { .. }) {
                            harness.assert_voting_power_tracks_stake();
                        }
                    }
                    Err(_) => {
                        prop_assert_eq!(harness.snapshot(), before);
                        prop_assert_eq!(harness.stack.ledger.total_paid(), paid_before);
                    }
                }
            }
        }
    }
}
