//! Staking services
//!
//! - `ValidatorManager`: registry, lifecycle, epoch pass
//! - `StakeRouter`: delegate / undelegate / redelegate / claim
//! - genesis: seeding and checking the initial active set
//!
//! Both mutate one `ManagerState` through all-or-nothing transactions.

mod epoch;
mod genesis;
mod guard;
mod manager;
mod router;
mod state;

pub use epoch::EpochReport;
pub use guard::{best_effort, GuardToken, ReentrancyGuard};
pub use manager::{ManagerDependencies, ValidatorManager};
pub use router::{RedelegateOutcome, RouterDependencies, StakeRouter};
pub use state::ManagerState;
