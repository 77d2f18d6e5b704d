// nexus_core/src/lib.rs
//
// Nexus Core — the root library crate for a single-process, single-strategy
// low-latency trading pipeline: decode, book, strategy, risk, route.
//
//     cargo test

pub mod book;
pub mod engine;
pub mod gateway;
pub mod logging;
pub mod ring;
pub mod risk;
pub mod router;
pub mod strategy;
pub mod types;
pub mod wire;

pub use book::{BboEvent, BboListener, OrderBookL2};
pub use engine::config::LogFormat;
pub use engine::{Engine, EngineConfig, EngineError, EngineState};
pub use gateway::GatewaySim;
pub use logging::init_logging;
pub use ring::SpscRing;
pub use risk::{RiskChecker, RiskLimits};
pub use router::Router;
pub use strategy::{Strategy, StrategyParams};
pub use types::{
    ExecutionReport, ExecutionStatus, OrderAction, OrderType, Price, Quantity, Side, StrategyOrder,
    SymbolId, SymbolInfo, SymbolUniverse, SCALE,
};
pub use wire::{DecodedMessage, Decoder, EventKind};
