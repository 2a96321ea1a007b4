//! # Test Fixtures
//!
//! A fully wired staking stack over the in-memory adapters, with small
//! round numbers instead of token-denominated defaults.

use std::sync::{Arc, Once};

use qc_18_staking::adapters::{
    InMemoryLedger, InMemoryPerformanceTracker, InMemoryRewardSink, InMemoryVoteMirror,
    ManualTimeSource, StaticStakeConfig,
};
use qc_18_staking::{
    Commission, ManagerDependencies, RegistrationParams, RouterDependencies, StakeConfig,
    StakePool, StakeRouter, ValidatorManager,
};
use quantum_telemetry::{init_logging, TelemetryConfig};
use shared_types::{Address, Amount};

pub type Manager =
    ValidatorManager<StaticStakeConfig, InMemoryPerformanceTracker, InMemoryRewardSink>;
pub type Router = StakeRouter<
    StaticStakeConfig,
    InMemoryPerformanceTracker,
    InMemoryRewardSink,
    InMemoryVoteMirror,
    InMemoryLedger,
>;

pub const START_TIME: u64 = 1_700_000_000;

static LOGGING: Once = Once::new();

/// Route test logs through the structured logger once per process.
/// Quiet unless `QC_LOG_LEVEL` is set.
pub fn init_test_logging() {
    LOGGING.call_once(|| {
        let mut config = TelemetryConfig::for_subsystem("18", "staking-tests");
        if std::env::var("QC_LOG_LEVEL").is_err() {
            config.log_level = "warn".to_string();
        }
        let _ = init_logging(&config);
    });
}

pub fn suite_config() -> StakeConfig {
    StakeConfig {
        min_validator_stake: 1_000,
        maximum_stake: 1_000_000,
        min_delegation_change: 1,
        max_validator_count: 10,
        voting_power_increase_limit: 50,
        max_commission_rate: 5_000,
        redelegate_fee_rate: 100,
        lock_amount: 10,
        commission_update_cooldown_secs: 3_600,
        allow_validator_set_change: true,
    }
}

pub fn account(byte: u8) -> Address {
    Address::repeat_byte(byte)
}

pub fn pause_authority() -> Address {
    account(0xAD)
}

pub fn registration(byte: u8, rate: u64) -> RegistrationParams {
    RegistrationParams {
        consensus_public_key: vec![byte; 48],
        moniker: format!("node-{byte:02x}"),
        commission: Commission {
            rate,
            max_rate: 3_000,
            max_change_rate: 1_000,
        },
        operator: None,
        commission_beneficiary: None,
        validator_network_addresses: format!("/ip4/10.0.0.{byte}/tcp/6180").into_bytes(),
        fullnode_network_addresses: Vec::new(),
        aux_address: Vec::new(),
    }
}

/// Staking manager, router and every collaborator they talk to.
pub struct StakingStack {
    pub config: Arc<StaticStakeConfig>,
    pub tracker: Arc<InMemoryPerformanceTracker>,
    pub sink: Arc<InMemoryRewardSink>,
    pub mirror: Arc<InMemoryVoteMirror>,
    pub ledger: Arc<InMemoryLedger>,
    pub clock: ManualTimeSource,
    pub manager: Arc<Manager>,
    pub router: Arc<Router>,
}

impl StakingStack {
    pub fn new() -> Self {
        Self::with_config(suite_config())
    }

    pub fn with_config(config: StakeConfig) -> Self {
        init_test_logging();
        let config = Arc::new(StaticStakeConfig::new(config).expect("valid suite config"));
        let tracker = Arc::new(InMemoryPerformanceTracker::new());
        let sink = Arc::new(InMemoryRewardSink::new());
        let mirror = Arc::new(InMemoryVoteMirror::new());
        let ledger = Arc::new(InMemoryLedger::new());
        let clock = ManualTimeSource::new(START_TIME);

        let manager = Arc::new(
            ValidatorManager::new(ManagerDependencies {
                config: config.clone(),
                performance: tracker.clone(),
                reward_sink: sink.clone(),
            })
            .with_time_source(Box::new(clock.clone())),
        );
        let router = Arc::new(StakeRouter::new(RouterDependencies {
            manager: manager.clone(),
            vote_mirror: mirror.clone(),
            transfer: ledger.clone(),
            pause_authority: pause_authority(),
        }));

        Self {
            config,
            tracker,
            sink,
            mirror,
            ledger,
            clock,
            manager,
            router,
        }
    }

    pub fn register(&self, byte: u8, value: Amount, rate: u64) -> Address {
        let validator = account(byte);
        self.manager
            .register_validator(validator, registration(byte, rate), value)
            .expect("registration succeeds");
        validator
    }

    /// Register, join and run one epoch so the validator is active.
    pub fn activate(&self, byte: u8, value: Amount, rate: u64) -> Address {
        let validator = self.register(byte, value, rate);
        self.manager
            .join_validator_set(validator, validator)
            .expect("join succeeds");
        self.manager.on_new_epoch().expect("epoch pass succeeds");
        validator
    }

    pub fn pool(&self, validator: &Address) -> StakePool {
        self.manager.pool(validator).expect("pool exists")
    }

    /// Give every active validator the same successful proposal count.
    pub fn even_performance(&self) {
        for validator in self.manager.active_set() {
            self.tracker.set_counts(validator, 10, 0);
        }
    }

    /// Deposit `reward`, spread it by performance and run the epoch.
    pub fn rewarded_epoch(&self, reward: Amount) {
        self.even_performance();
        self.manager
            .deposit_block_reward(reward)
            .expect("deposit succeeds");
        self.manager.on_new_epoch().expect("epoch pass succeeds");
    }

    pub fn assert_conserved(&self, validators: &[Address]) {
        for validator in validators {
            assert!(
                self.pool(validator).is_conserved(),
                "pool of {validator} does not conserve value"
            );
        }
    }

    /// Total voting power equals the sum over the active set.
    pub fn assert_voting_power_consistent(&self) {
        let sum: Amount = self
            .manager
            .active_set()
            .iter()
            .map(|v| self.manager.voting_power(v))
            .sum();
        assert_eq!(self.manager.total_voting_power(), sum);
    }
}

impl Default for StakingStack {
    fn default() -> Self {
        Self::new()
    }
}
