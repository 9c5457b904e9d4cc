//! # Bridge Module
//!
//! Chain-family routing and the per-pair bridge cache.

mod factory;
mod registry;

pub use factory::BridgeFactory;
pub use registry::{
    BridgeRegistry, BridgeRequirements, BridgeRoute, ChainDependencies, ChainFamily, ContractRole,
};
