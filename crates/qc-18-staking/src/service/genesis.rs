//! Genesis: seed the active set before the first epoch and check it later.

use super::manager::ValidatorManager;
use crate::domain::{
    GenesisMismatch, GenesisValidator, PoolId, RegistrationParams, StakingError, StakingResult,
    ValidatorStatus,
};
use crate::ports::{PerformanceTracker, RewardSink, StakeConfigProvider};
use shared_types::Amount;
use tracing::{info, warn};

impl<C, P, S> ValidatorManager<C, P, S>
where
    C: StakeConfigProvider,
    P: PerformanceTracker,
    S: RewardSink,
{
    /// Register every genesis validator and make it `Active` at once,
    /// skipping the join queue and the joining-power limit.
    ///
    /// Only allowed on an empty registry at epoch 0.
    pub fn initialize_genesis(&self, validators: &[GenesisValidator]) -> StakingResult<Vec<PoolId>> {
        let now = self.time_source.now();
        let pools = self.transact("initialize_genesis", |state, config| {
            if state.epoch != 0 || !state.validators.is_empty() {
                return Err(StakingError::InvalidGenesis(
                    "validator registry is not empty".into(),
                ));
            }
            if validators.is_empty() {
                return Err(StakingError::InvalidGenesis("no validators".into()));
            }
            if validators.len() as u64 > config.max_validator_count {
                return Err(StakingError::ValidatorSetFull {
                    current: validators.len(),
                    max: config.max_validator_count,
                });
            }

            // The stake includes the permanent lock, like any registration.
            let min_stake = config.registration_minimum();
            let mut pools = Vec::with_capacity(validators.len());
            for (index, genesis) in validators.iter().enumerate() {
                if genesis.stake < min_stake || genesis.stake > config.maximum_stake {
                    return Err(StakingError::StakeOutOfBounds {
                        stake: genesis.stake,
                        min: min_stake,
                        max: config.maximum_stake,
                    });
                }
                let params = RegistrationParams {
                    consensus_public_key: genesis.consensus_public_key.clone(),
                    moniker: GenesisValidator::moniker(index),
                    commission: GenesisValidator::commission(config.max_commission_rate),
                    operator: None,
                    commission_beneficiary: None,
                    validator_network_addresses: genesis.validator_network_addresses.clone(),
                    fullnode_network_addresses: genesis.fullnode_network_addresses.clone(),
                    aux_address: genesis.aux_address.clone(),
                };
                let (pool_id, _) =
                    state.register(genesis.validator, params, genesis.stake, config, now)?;
                state.set_status(&genesis.validator, ValidatorStatus::Active, now)?;
                state.active_set.push(genesis.validator);
                pools.push(pool_id);
            }

            state.recompute_voting_power(config, now)?;
            state.last_transition_time = now;
            Ok(pools)
        })?;

        info!(
            validators = pools.len(),
            total_voting_power = self.total_voting_power(),
            "Genesis validator set initialized"
        );
        Ok(pools)
    }

    /// Compare the live active set with `validators`. An empty result means
    /// the set still matches genesis.
    pub fn verify_genesis(&self, validators: &[GenesisValidator]) -> Vec<GenesisMismatch> {
        let config = self.stake_config();
        let view = self.validator_set();
        let mut mismatches = Vec::new();

        if view.active_validators.len() != validators.len() {
            mismatches.push(GenesisMismatch::ValidatorCount {
                expected: validators.len(),
                actual: view.active_validators.len(),
            });
        }

        for genesis in validators {
            let Some(record) = view
                .active_validators
                .iter()
                .find(|r| r.validator == genesis.validator)
            else {
                mismatches.push(GenesisMismatch::NotActive(genesis.validator));
                continue;
            };

            if record.operator != genesis.validator {
                mismatches.push(GenesisMismatch::Operator {
                    validator: genesis.validator,
                    operator: record.operator,
                });
            }
            if record.consensus_public_key != genesis.consensus_public_key {
                mismatches.push(GenesisMismatch::ConsensusKey(genesis.validator));
            }
            let expected: Amount = genesis.stake.min(config.maximum_stake);
            if record.voting_power != expected {
                mismatches.push(GenesisMismatch::VotingPower {
                    validator: genesis.validator,
                    expected,
                    actual: record.voting_power,
                });
            }
            if record.validator_network_addresses != genesis.validator_network_addresses
                || record.fullnode_network_addresses != genesis.fullnode_network_addresses
            {
                mismatches.push(GenesisMismatch::NetworkAddresses(genesis.validator));
            }
            if record.aux_address != genesis.aux_address {
                mismatches.push(GenesisMismatch::AuxAddress(genesis.validator));
            }
        }

        for mismatch in &mismatches {
            warn!(%mismatch, "Genesis mismatch");
        }
        mismatches
    }
}
