//! # Integration Tests
//!
//! Drives several independent plugin instances through the reporting rounds
//! the consensus transport would run, against one shared simulated world of
//! liquidity manager contracts and bridges.

pub mod liquidity_rounds;
