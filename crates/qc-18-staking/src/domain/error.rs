//! Error types for the staking subsystem

use super::{BucketRole, ValidatorStatus};
use shared_types::{Address, Amount, BasisPoints, Timestamp};

/// Broad classification of a [`StakingError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or out-of-range input
    Validation,
    /// Caller lacks the right to perform the operation
    Authorization,
    /// The operation would break an accounting invariant
    InvariantViolation,
    /// A configured limit would be exceeded
    LimitExceeded,
    /// An outbound value movement failed
    TransferFailure,
    /// The emergency pause switch is engaged
    Paused,
    /// A guarded operation was re-entered
    Reentrancy,
}

/// Staking error types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StakingError {
    // --- validation ---
    #[error("Amount must be greater than zero")]
    ZeroAmount,

    #[error("Share amount must be greater than zero")]
    ZeroShares,

    #[error("Amount {amount} below minimum delegation change {minimum}")]
    BelowMinimumDelegation { amount: Amount, minimum: Amount },

    #[error("Source and destination validator are the same: {0}")]
    SameValidator(Address),

    #[error("Validator not registered: {0}")]
    ValidatorNotRegistered(Address),

    #[error("Validator already registered: {0}")]
    ValidatorAlreadyRegistered(Address),

    #[error("Invalid moniker: {0:?}")]
    InvalidMoniker(String),

    #[error("Moniker already taken: {0:?}")]
    DuplicateMoniker(String),

    #[error("Invalid consensus public key: {0}")]
    InvalidConsensusKey(String),

    #[error("Consensus public key already bound to validator {0}")]
    DuplicateConsensusKey(Address),

    #[error("Operator {0} already manages another validator")]
    DuplicateOperator(Address),

    #[error("Invalid commission: {0}")]
    InvalidCommission(String),

    #[error("Cannot {operation} while validator is {status:?}")]
    InvalidStatus {
        operation: &'static str,
        status: ValidatorStatus,
    },

    #[error("Validator {0} is not active")]
    ValidatorNotActive(Address),

    #[error("Nothing to claim from validator {0}")]
    NothingToClaim(Address),

    #[error("No pending-inactive stake to reactivate at validator {0}")]
    NothingPending(Address),

    #[error("Registration value {provided} below required {required}")]
    InsufficientRegistrationStake { provided: Amount, required: Amount },

    #[error("Reserved address {0} cannot take part in staking operations")]
    ReservedAddress(Address),

    // --- authorization ---
    #[error("Caller {caller} is not the operator of validator {validator}")]
    NotOperator { caller: Address, validator: Address },

    #[error("Caller {caller} is not validator {validator}")]
    NotValidator { caller: Address, validator: Address },

    #[error("Caller {0} is not authorized")]
    Unauthorized(Address),

    // --- invariants ---
    #[error("Insufficient shares: requested {requested}, available {available}")]
    InsufficientShares { requested: Amount, available: Amount },

    #[error("Insufficient {bucket:?} balance: required {required}, available {available}")]
    InsufficientBucket {
        bucket: BucketRole,
        required: Amount,
        available: Amount,
    },

    #[error("Pool has no outstanding shares")]
    ZeroTotalShares,

    #[error("Amount {0} converts to zero shares")]
    ZeroSharesMinted(Amount),

    #[error("Arithmetic overflow in {0}")]
    ArithmeticOverflow(&'static str),

    #[error("Division by zero in {0}")]
    DivisionByZero(&'static str),

    // --- limits ---
    #[error("Validator set full: {current} of {max}")]
    ValidatorSetFull { current: usize, max: u64 },

    #[error(
        "Voting power increase exceeded: joining {joining} + {increase} over {limit_percent}% of {total}"
    )]
    VotingPowerIncreaseExceeded {
        joining: Amount,
        increase: Amount,
        total: Amount,
        limit_percent: u64,
    },

    #[error("Stake {stake} outside bounds [{min}, {max}]")]
    StakeOutOfBounds { stake: Amount, min: Amount, max: Amount },

    #[error("Commission rate {rate} exceeds max rate {max_rate}")]
    CommissionRateTooHigh {
        rate: BasisPoints,
        max_rate: BasisPoints,
    },

    #[error("Commission change {delta} exceeds max change rate {max_change_rate}")]
    CommissionChangeTooLarge {
        delta: BasisPoints,
        max_change_rate: BasisPoints,
    },

    #[error("Commission updated too recently, next update allowed at {next_allowed}")]
    CommissionUpdateTooFrequent { next_allowed: Timestamp },

    #[error("Cannot remove {0}, it is the last active validator")]
    LastActiveValidator(Address),

    #[error("Validator set changes are disabled")]
    ValidatorSetChangeDisabled,

    // --- outbound value ---
    #[error("Transfer of {amount} to {recipient} failed: {reason}")]
    TransferFailed {
        recipient: Address,
        amount: Amount,
        reason: String,
    },

    #[error("Reward sink rejected {amount}: {reason}")]
    RewardSinkFailed { amount: Amount, reason: String },

    // --- guards ---
    #[error("Staking operations are paused")]
    Paused,

    #[error("Reentrant call rejected")]
    ReentrantCall,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid genesis: {0}")]
    InvalidGenesis(String),
}

impl StakingError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        use StakingError::*;
        match self {
            ZeroAmount
            | ZeroShares
            | BelowMinimumDelegation { .. }
            | SameValidator(_)
            | ValidatorNotRegistered(_)
            | ValidatorAlreadyRegistered(_)
            | InvalidMoniker(_)
            | DuplicateMoniker(_)
            | InvalidConsensusKey(_)
            | DuplicateConsensusKey(_)
            | DuplicateOperator(_)
            | InvalidCommission(_)
            | InvalidStatus { .. }
            | ValidatorNotActive(_)
            | NothingToClaim(_)
            | NothingPending(_)
            | InsufficientRegistrationStake { .. }
            | ReservedAddress(_)
            | InvalidConfig(_)
            | InvalidGenesis(_) => ErrorKind::Validation,

            NotOperator { .. } | NotValidator { .. } | Unauthorized(_) => {
                ErrorKind::Authorization
            }

            InsufficientShares { .. }
            | InsufficientBucket { .. }
            | ZeroTotalShares
            | ZeroSharesMinted(_)
            | ArithmeticOverflow(_)
            | DivisionByZero(_) => ErrorKind::InvariantViolation,

            ValidatorSetFull { .. }
            | VotingPowerIncreaseExceeded { .. }
            | StakeOutOfBounds { .. }
            | CommissionRateTooHigh { .. }
            | CommissionChangeTooLarge { .. }
            | CommissionUpdateTooFrequent { .. }
            | LastActiveValidator(_)
            | ValidatorSetChangeDisabled => ErrorKind::LimitExceeded,

            TransferFailed { .. } | RewardSinkFailed { .. } => ErrorKind::TransferFailure,

            Paused => ErrorKind::Paused,
            ReentrantCall => ErrorKind::Reentrancy,
        }
    }

    /// Short stable label for metrics and logs.
    pub fn label(&self) -> &'static str {
        match self.kind() {
            ErrorKind::Validation => "validation",
            ErrorKind::Authorization => "authorization",
            ErrorKind::InvariantViolation => "invariant",
            ErrorKind::LimitExceeded => "limit",
            ErrorKind::TransferFailure => "transfer",
            ErrorKind::Paused => "paused",
            ErrorKind::Reentrancy => "reentrancy",
        }
    }
}

/// Result type for staking operations
pub type StakingResult<T> = Result<T, StakingError>;
