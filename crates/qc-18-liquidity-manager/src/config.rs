//! # Plugin Configuration
//!
//! Plain values handed to the plugin at construction. Nothing here is read
//! from files or the environment.

use crate::domain::{Address, NetworkSelector};
use crate::error::{LiquidityManagerError, LiquidityManagerResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One megabyte, the default size ceiling of encoded round messages.
pub const DEFAULT_MAX_MESSAGE_LENGTH: usize = 1024 * 1024;

/// Default upper bound on reports per round.
pub const DEFAULT_MAX_REPORT_COUNT: usize = 100;

/// Size limits advertised to the transport and enforced by the plugin.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginLimits {
    /// Encoded query size. Always zero: the query is empty.
    pub max_query_length: usize,
    /// Encoded observation size.
    pub max_observation_length: usize,
    /// Encoded outcome size.
    pub max_outcome_length: usize,
    /// Encoded on-chain report size.
    pub max_report_length: usize,
    /// Reports produced by one round.
    pub max_report_count: usize,
}

impl Default for PluginLimits {
    fn default() -> Self {
        Self {
            max_query_length: 0,
            max_observation_length: DEFAULT_MAX_MESSAGE_LENGTH,
            max_outcome_length: DEFAULT_MAX_MESSAGE_LENGTH,
            max_report_length: DEFAULT_MAX_MESSAGE_LENGTH,
            max_report_count: DEFAULT_MAX_REPORT_COUNT,
        }
    }
}

impl PluginLimits {
    /// Fail if `size` is above `limit`.
    pub fn check(what: &'static str, size: usize, limit: usize) -> LiquidityManagerResult<()> {
        if size > limit {
            return Err(LiquidityManagerError::LimitExceeded { what, size, limit });
        }
        Ok(())
    }
}

/// Reporting plugin configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginConfig {
    /// Maximum number of faulty nodes tolerated.
    pub f: usize,
    /// Budget for releasing clients and bridges on close.
    pub close_timeout_secs: u64,
    /// Network hosting the root liquidity manager.
    pub root_network: NetworkSelector,
    /// Root liquidity manager contract.
    pub root_address: Address,
    /// Message size limits.
    pub limits: PluginLimits,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            f: 1,
            close_timeout_secs: 10,
            root_network: NetworkSelector::default(),
            root_address: Address::ZERO,
            limits: PluginLimits::default(),
        }
    }
}

impl PluginConfig {
    /// Close timeout as a duration.
    pub fn close_timeout(&self) -> Duration {
        Duration::from_secs(self.close_timeout_secs)
    }

    /// Reject configurations the plugin cannot run with.
    pub fn validate(&self) -> LiquidityManagerResult<()> {
        if self.close_timeout_secs == 0 {
            return Err(LiquidityManagerError::InvalidConfig(
                "close timeout must be positive".to_string(),
            ));
        }
        let limits = [
            ("max_observation_length", self.limits.max_observation_length),
            ("max_outcome_length", self.limits.max_outcome_length),
            ("max_report_length", self.limits.max_report_length),
            ("max_report_count", self.limits.max_report_count),
        ];
        if let Some((name, _)) = limits.iter().find(|(_, value)| *value == 0) {
            return Err(LiquidityManagerError::InvalidConfig(format!(
                "{name} must be positive"
            )));
        }
        if self.limits.max_query_length != 0 {
            return Err(LiquidityManagerError::InvalidConfig(
                "max_query_length must be zero, the query is always empty".to_string(),
            ));
        }
        Ok(())
    }
}
