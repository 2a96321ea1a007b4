//! # Reentrancy
//!
//! A payout recipient controls code that runs while value leaves a pool.
//! Every staking entry point must refuse to run until that payout returns.
//! Callbacks fired after commit (the vote mirror) may call back freely.

#[cfg(test)]
mod tests {
    use crate::fixtures::{account, init_test_logging, registration, suite_config, Manager, START_TIME};
    use parking_lot::{Mutex, RwLock};
    use qc_18_staking::adapters::{
        InMemoryLedger, InMemoryPerformanceTracker, InMemoryRewardSink, InMemoryVoteMirror,
        ManualTimeSource, StaticStakeConfig,
    };
    use qc_18_staking::{
        ManagerDependencies, PoolId, RouterDependencies, StakeRouter, StakingError,
        StakingResult, ValidatorManager, ValueTransfer, VoteMirror,
    };
    use shared_types::{Address, Amount};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Weak};

    type AttackRouter<V, T> = StakeRouter<
        StaticStakeConfig,
        InMemoryPerformanceTracker,
        InMemoryRewardSink,
        V,
        T,
    >;
    type PayoutRouter = AttackRouter<InMemoryVoteMirror, ReentrantLedger>;

    fn victim() -> Address {
        account(1)
    }

    fn attacker() -> Address {
        account(0xE1)
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    enum Attack {
        #[default]
        Disarmed,
        Delegate,
        Undelegate,
        Reactivate,
        Claim,
        ClaimBatch,
        Redelegate,
        EpochPass,
        Register,
        DepositReward,
    }

    impl Attack {
        const ALL: [Attack; 9] = [
            Attack::Delegate,
            Attack::Undelegate,
            Attack::Reactivate,
            Attack::Claim,
            Attack::ClaimBatch,
            Attack::Redelegate,
            Attack::EpochPass,
            Attack::Register,
            Attack::DepositReward,
        ];

        fn launch(self, router: &PayoutRouter) -> Option<StakingResult<()>> {
            let (who, target) = (attacker(), victim());
            let result = match self {
                Attack::Disarmed => return None,
                Attack::Delegate => router.delegate(who, target, 100).map(drop),
                Attack::Undelegate => router.undelegate(who, target, 1).map(drop),
                Attack::Reactivate => router.reactivate(who, target, 1).map(drop),
                Attack::Claim => router.claim(who, target).map(drop),
                Attack::ClaimBatch => router.claim_batch(who, &[target]).map(drop),
                Attack::Redelegate => router.redelegate(who, target, account(2), 1, false).map(drop),
                Attack::EpochPass => router.manager().on_new_epoch().map(drop),
                Attack::Register => router
                    .manager()
                    .register_validator(who, registration(0xE1, 0), 5_000)
                    .map(drop),
                Attack::DepositReward => router.manager().deposit_block_reward(1).map(drop),
            };
            Some(result)
        }
    }

    /// Pays out, but first runs the armed attack from inside the transfer.
    #[derive(Default)]
    struct ReentrantLedger {
        router: RwLock<Weak<PayoutRouter>>,
        armed: Mutex<Attack>,
        outcomes: Mutex<Vec<StakingResult<()>>>,
        paid: Mutex<Amount>,
    }

    impl ReentrantLedger {
        fn arm(&self, attack: Attack) {
            *self.armed.lock() = attack;
        }
    }

    impl ValueTransfer for ReentrantLedger {
        fn transfer(&self, _recipient: &Address, amount: Amount) -> Result<(), String> {
            let attack = std::mem::take(&mut *self.armed.lock());
            let router = self.router.read().upgrade();
            if let Some(outcome) = router.and_then(|router| attack.launch(&router)) {
                self.outcomes.lock().push(outcome);
            }
            *self.paid.lock() += amount;
            Ok(())
        }
    }

    /// Deposits a block reward from inside the first share-change callback.
    #[derive(Default)]
    struct ReentrantMirror {
        manager: RwLock<Weak<Manager>>,
        armed: AtomicBool,
        outcome: Mutex<Option<StakingResult<Amount>>>,
    }

    impl VoteMirror for ReentrantMirror {
        fn on_shares_changed(&self, _holder: &Address, _pool: &PoolId, _shares: Amount) -> Result<(), String> {
            if self.armed.swap(false, Ordering::SeqCst) {
                if let Some(manager) = self.manager.read().upgrade() {
                    *self.outcome.lock() = Some(manager.deposit_block_reward(7));
                }
            }
            Ok(())
        }

        fn delegate_votes(&self, _holder: &Address, _delegatee: &Address) -> Result<(), String> {
            Ok(())
        }
    }

    fn build<V: VoteMirror, T: ValueTransfer>(
        vote_mirror: Arc<V>,
        transfer: Arc<T>,
    ) -> (Arc<Manager>, Arc<AttackRouter<V, T>>) {
        init_test_logging();
        let manager = Arc::new(
            ValidatorManager::new(ManagerDependencies {
                config: Arc::new(StaticStakeConfig::new(suite_config()).expect("valid config")),
                performance: Arc::new(InMemoryPerformanceTracker::new()),
                reward_sink: Arc::new(InMemoryRewardSink::new()),
            })
            .with_time_source(Box::new(ManualTimeSource::new(START_TIME))),
        );
        let router = Arc::new(StakeRouter::new(RouterDependencies {
            manager: manager.clone(),
            vote_mirror,
            transfer,
            pause_authority: account(0xAD),
        }));

        manager
            .register_validator(victim(), registration(1, 0), 10_000)
            .expect("register");
        manager.join_validator_set(victim(), victim()).expect("join");
        manager.on_new_epoch().expect("epoch");
        (manager, router)
    }

    /// The attacker holds a matured unlock of 1_000 at the victim's pool.
    fn payout_setup() -> (Arc<Manager>, Arc<PayoutRouter>, Arc<ReentrantLedger>) {
        let ledger = Arc::new(ReentrantLedger::default());
        let (manager, router) = build(Arc::new(InMemoryVoteMirror::new()), ledger.clone());
        *ledger.router.write() = Arc::downgrade(&router);

        router.delegate(attacker(), victim(), 2_000).expect("delegate");
        manager.on_new_epoch().expect("epoch");
        router.undelegate(attacker(), victim(), 1_000).expect("undelegate");
        manager.on_new_epoch().expect("epoch");
        router.undelegate(attacker(), victim(), 500).expect("undelegate");
        (manager, router, ledger)
    }

    #[test]
    fn test_every_entry_point_rejects_reentry_during_claim() {
        for attack in Attack::ALL {
            let (manager, router, ledger) = payout_setup();
            let before = manager.pool(&victim()).expect("pool");
            let epoch = manager.epoch_info().epoch;

            ledger.arm(attack);
            assert_eq!(router.claim(attacker(), victim()), Ok(1_000), "{attack:?}");

            assert_eq!(
                ledger.outcomes.lock().as_slice(),
                &[Err(StakingError::ReentrantCall)],
                "{attack:?}"
            );
            assert_eq!(*ledger.paid.lock(), 1_000, "{attack:?}");
            assert_eq!(manager.epoch_info().epoch, epoch, "{attack:?}");
            assert_eq!(manager.reward_pool(), 0, "{attack:?}");

            let after = manager.pool(&victim()).expect("pool");
            assert!(after.is_conserved(), "{attack:?}");
            assert_eq!(after.claimable_of(&attacker()), 0);
            assert_eq!(after.pending_inactive_of(&attacker()), 500);
            assert_eq!(after.shares_of(&attacker()), before.shares_of(&attacker()));
            assert_eq!(after.total_pooled(), before.total_pooled() - 1_000);
            assert!(manager.validator(&attacker()).is_none());
        }
    }

    #[test]
    fn test_reentry_during_batch_claim_is_rejected() {
        let (manager, router, ledger) = payout_setup();
        ledger.arm(Attack::ClaimBatch);

        assert_eq!(router.claim_batch(attacker(), &[victim()]), Ok(1_000));
        assert_eq!(
            ledger.outcomes.lock().as_slice(),
            &[Err(StakingError::ReentrantCall)]
        );
        // The nested batch claim did not pay twice
        assert_eq!(*ledger.paid.lock(), 1_000);
        assert!(manager.pool(&victim()).expect("pool").is_conserved());
    }

    #[test]
    fn test_guard_released_after_payout() {
        let (manager, router, ledger) = payout_setup();
        ledger.arm(Attack::Delegate);
        router.claim(attacker(), victim()).expect("claim");

        assert!(router.delegate(attacker(), victim(), 100).is_ok());
        assert!(manager.on_new_epoch().is_ok());
        assert_eq!(router.claim(attacker(), victim()), Ok(500));
    }

    #[test]
    fn test_failed_payout_rolls_back_claim() {
        let ledger = Arc::new(InMemoryLedger::new());
        let (manager, router) = build(Arc::new(InMemoryVoteMirror::new()), ledger.clone());
        router.delegate(attacker(), victim(), 1_000).expect("delegate");
        manager.on_new_epoch().expect("epoch");
        router.undelegate(attacker(), victim(), 1_000).expect("undelegate");
        manager.on_new_epoch().expect("epoch");

        ledger.reject(attacker());
        let before = manager.pool(&victim()).expect("pool");
        assert!(matches!(
            router.claim(attacker(), victim()),
            Err(StakingError::TransferFailed { amount: 1_000, .. })
        ));
        assert_eq!(manager.pool(&victim()).expect("pool"), before);

        ledger.accept(&attacker());
        assert_eq!(router.claim(attacker(), victim()), Ok(1_000));
        assert_eq!(ledger.balance_of(&attacker()), 1_000);
    }

    #[test]
    fn test_mirror_callback_runs_after_commit() {
        let mirror = Arc::new(ReentrantMirror::default());
        let (manager, router) = build(mirror.clone(), Arc::new(InMemoryLedger::new()));
        *mirror.manager.write() = Arc::downgrade(&manager);

        mirror.armed.store(true, Ordering::SeqCst);
        assert_eq!(router.delegate(attacker(), victim(), 1_000), Ok(1_000));

        assert_eq!(mirror.outcome.lock().clone(), Some(Ok(7)));
        assert_eq!(manager.reward_pool(), 7);
        let pool = manager.pool(&victim()).expect("pool");
        assert_eq!(pool.shares_of(&attacker()), 1_000);
        assert!(pool.is_conserved());
    }
}
