//! Error types for the Liquidity Manager subsystem
//!
//! Soft rejections (empty report, stale report, already in-flight transfer,
//! unresolvable proposal) are not errors; they surface as `Ok(false)` or a
//! skipped item and are logged by the service.

use crate::domain::NetworkSelector;
use thiserror::Error;

/// Liquidity manager subsystem errors
#[derive(Debug, Error)]
pub enum LiquidityManagerError {
    /// Fewer observations than the 2f+1 quorum
    #[error("Insufficient observations: have {have}, need {need}")]
    InsufficientObservations { have: usize, need: usize },

    /// Wire encoding or decoding failed
    #[error("Codec error: {0}")]
    Codec(String),

    /// A collection in an observation contains the same key twice
    #[error("Duplicate {kind} in observation: {key}")]
    DuplicateEntry { kind: &'static str, key: String },

    /// A single entry failed its own validation
    #[error("Invalid {kind}: {reason}")]
    InvalidEntry { kind: &'static str, reason: String },

    /// No bridge cached for the pair
    #[error("Bridge not found: {from}-{to}")]
    BridgeNotFound {
        from: NetworkSelector,
        to: NetworkSelector,
    },

    /// Source and destination of a bridge are the same network
    #[error("Cannot bridge network {0} to itself")]
    SameNetworkBridge(NetworkSelector),

    /// No bridge route registered for the chain-family pair
    #[error("Unsupported bridge pair: {from} ({from_family}) -> {to} ({to_family})")]
    UnsupportedBridgePair {
        from: NetworkSelector,
        to: NetworkSelector,
        from_family: String,
        to_family: String,
    },

    /// A route requirement is not satisfied by the configured chain dependencies
    #[error("Missing bridge dependency on network {network}: {what}")]
    MissingBridgeDependency {
        network: NetworkSelector,
        what: String,
    },

    /// Bridge construction or bridge call failed
    #[error("Bridge error: {0}")]
    Bridge(String),

    /// Network not present in the liquidity graph
    #[error("Network not found in liquidity graph: {0}")]
    NetworkNotFound(NetworkSelector),

    /// Config digest missing for a network
    #[error("Config digest not found for network {0}")]
    ConfigDigestNotFound(NetworkSelector),

    /// Liquidity discovery failed
    #[error("Discoverer error: {0}")]
    Discoverer(String),

    /// On-chain liquidity manager client failed
    #[error("Liquidity manager client error: {0}")]
    LiquidityManagerClient(String),

    /// Encoded message above its configured limit
    #[error("{what} exceeds limit: {size} > {limit}")]
    LimitExceeded {
        what: &'static str,
        size: usize,
        limit: usize,
    },

    /// Invalid plugin configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Operation did not finish in time
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Error annotated with the operation that produced it
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<LiquidityManagerError>,
    },

    /// Several independent failures (best-effort operations)
    #[error("{} errors: {}", .0.len(), join_errors(.0))]
    Multiple(Vec<LiquidityManagerError>),
}

fn join_errors(errors: &[LiquidityManagerError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl LiquidityManagerError {
    /// Strip context layers and return the innermost error.
    pub fn root_cause(&self) -> &LiquidityManagerError {
        match self {
            Self::Context { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Whether this is (or wraps) a cache miss in the bridge factory.
    pub fn is_bridge_not_found(&self) -> bool {
        matches!(self.root_cause(), Self::BridgeNotFound { .. })
    }
}

impl From<bincode::Error> for LiquidityManagerError {
    fn from(err: bincode::Error) -> Self {
        Self::Codec(err.to_string())
    }
}

/// Result type for liquidity manager operations
pub type LiquidityManagerResult<T> = Result<T, LiquidityManagerError>;

/// Attach operation context to an error.
pub trait ResultExt<T> {
    /// Wrap the error with a fixed context message.
    fn context(self, context: impl Into<String>) -> LiquidityManagerResult<T>;

    /// Wrap the error with a lazily built context message.
    fn with_context<F, S>(self, f: F) -> LiquidityManagerResult<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T> ResultExt<T> for LiquidityManagerResult<T> {
    fn context(self, context: impl Into<String>) -> LiquidityManagerResult<T> {
        self.map_err(|source| LiquidityManagerError::Context {
            context: context.into(),
            source: Box::new(source),
        })
    }

    fn with_context<F, S>(self, f: F) -> LiquidityManagerResult<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|source| LiquidityManagerError::Context {
            context: f().into(),
            source: Box::new(source),
        })
    }
}
