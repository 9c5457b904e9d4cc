//! # Domain Module
//!
//! Core domain types for the Liquidity Manager.

pub mod entities;
pub mod graph;
pub mod inflight;
pub mod invariants;
pub mod messages;
pub mod value_objects;

pub use entities::*;
pub use graph::{LiquidityGraph, NetworkData};
pub use inflight::{InflightContainer, InflightKey};
pub use invariants::*;
pub use messages::*;
pub use value_objects::*;
