//! Ports (hexagonal architecture)
//!
//! - inbound: APIs this subsystem offers (stake router, epoch handler)
//! - outbound: collaborators this subsystem depends on

mod inbound;
mod outbound;

pub use inbound::*;
pub use outbound::*;
