//! # Adapters Layer (Hexagonal Architecture)
//!
//! Reference implementations of the outbound ports, used by tests and
//! local devnets. Production deployments plug in chain clients instead.

mod discoverer;
mod liquidity_manager;
mod mock_bridge;
mod ping_pong;
mod report_codec;

pub use discoverer::StaticDiscoverer;
pub use liquidity_manager::{InMemoryLiquidityManager, InMemoryLiquidityManagerFactory};
pub use mock_bridge::{MockBridge, MockBridgeConstructor, MockBridgeLedger};
pub use ping_pong::PingPongRebalancer;
pub use report_codec::BincodeReportCodec;
