//! Ports layer (Hexagonal Architecture)
//!
//! Inbound: the reporting plugin driven by the consensus transport.
//! Outbound: chain, bridge and strategy collaborators.

mod inbound;
mod outbound;

pub use inbound::*;
pub use outbound::*;
