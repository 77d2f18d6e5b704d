// Process orchestrator. Owns the three SPSC rings and spawns the three
// pinned OS threads (market-data, strategy, execution) that make up the
// pipeline, grounded in the three-thread design of the original engine.

pub mod config;
pub mod error;

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{info, warn};

use crate::gateway::GatewaySim;
use crate::ring::SpscRing;
use crate::risk::RiskChecker;
use crate::router::Router;
use crate::strategy::{Strategy, StrategyParams};
use crate::types::symbol::{SymbolId, SymbolUniverse};
use crate::types::{ExecutionReport, HardwareParamUpdate, StrategyOrder};
use crate::wire::decoder::Decoder;

pub use config::EngineConfig;
pub use error::EngineError;

const MD_QUEUE_CAPACITY: usize = 16_384;
const ORDER_QUEUE_CAPACITY: usize = 8_192;
const EXEC_QUEUE_CAPACITY: usize = 8_192;
/// Small: one parameter refresh every 100 market events, never contended.
const HW_PARAM_QUEUE_CAPACITY: usize = 16;
/// Strategy thread cadence for pushing a refreshed parameter snapshot to
/// the hardware driver (spec'd as "every 100 market events").
const HW_PARAM_PUSH_INTERVAL: u32 = 100;

const MD_CORE: usize = 1;
const STRATEGY_CORE: usize = 2;
const EXEC_CORE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EngineState {
    Created = 0,
    Running = 1,
    Stopping = 2,
    Stopped = 3,
}

impl From<u8> for EngineState {
    fn from(v: u8) -> Self {
        match v {
            1 => EngineState::Running,
            2 => EngineState::Stopping,
            3 => EngineState::Stopped,
            _ => EngineState::Created,
        }
    }
}

/// Produces synthetic `AddOrder` wire records in the absence of a live
/// multicast feed. Mirrors the shape a real `MulticastReceiver` would have
/// without opening a socket.
struct SimulatedSource {
    tag: [u8; 8],
    next_order_id: u64,
    tick_interval: Duration,
}

impl SimulatedSource {
    fn new(tag: [u8; 8]) -> Self {
        Self { tag, next_order_id: 1, tick_interval: Duration::from_millis(200) }
    }

    /// Produce one length-prefixed record: 2-byte big-endian length followed
    /// by the payload `md_thread_loop` would strip and hand to the decoder.
    fn next_record(&mut self) -> Vec<u8> {
        let order_id = self.next_order_id;
        self.next_order_id += 1;
        let side = if order_id % 2 == 0 { b'S' } else { b'B' };
        let price: u32 = 1_000_000 + ((order_id % 50) as u32) * 100;

        let mut payload = Vec::with_capacity(36);
        payload.push(b'A');
        payload.extend_from_slice(&0u16.to_be_bytes());
        payload.extend_from_slice(&0u16.to_be_bytes());
        payload.extend_from_slice(&0u64.to_be_bytes()[2..8]);
        payload.extend_from_slice(&order_id.to_be_bytes());
        payload.push(side);
        payload.extend_from_slice(&100u32.to_be_bytes());
        payload.extend_from_slice(&self.tag);
        payload.extend_from_slice(&price.to_be_bytes());

        let mut record = Vec::with_capacity(2 + payload.len());
        record.extend_from_slice(&(payload.len() as u16).to_be_bytes());
        record.extend_from_slice(&payload);
        record
    }
}

/// Owns the pipeline's shared state and thread handles.
pub struct Engine {
    config: EngineConfig,
    symbols: SymbolUniverse,
    state: Arc<AtomicU8>,
    running: Arc<AtomicBool>,
    md_to_strategy: Arc<SpscRing<crate::wire::decoder::DecodedMessage>>,
    strategy_to_risk: Arc<SpscRing<StrategyOrder>>,
    gateway_to_strategy: Arc<SpscRing<ExecutionReport>>,
    strategy_to_hw_params: Arc<SpscRing<HardwareParamUpdate>>,
    handles: Vec<JoinHandle<()>>,
    /// Sampled telemetry counters, not per-event logging.
    md_messages_processed: Arc<AtomicU64>,
    exec_reports_processed: Arc<AtomicU64>,
}

impl Engine {
    pub fn new(config: EngineConfig, symbols: SymbolUniverse) -> Result<Self, EngineError> {
        Ok(Self {
            config,
            symbols,
            state: Arc::new(AtomicU8::new(EngineState::Created as u8)),
            running: Arc::new(AtomicBool::new(false)),
            md_to_strategy: Arc::new(SpscRing::new(MD_QUEUE_CAPACITY)),
            strategy_to_risk: Arc::new(SpscRing::new(ORDER_QUEUE_CAPACITY)),
            gateway_to_strategy: Arc::new(SpscRing::new(EXEC_QUEUE_CAPACITY)),
            strategy_to_hw_params: Arc::new(SpscRing::new(HW_PARAM_QUEUE_CAPACITY)),
            handles: Vec::new(),
            md_messages_processed: Arc::new(AtomicU64::new(0)),
            exec_reports_processed: Arc::new(AtomicU64::new(0)),
        })
    }

    pub fn state(&self) -> EngineState {
        EngineState::from(self.state.load(Ordering::Acquire))
    }

    pub fn md_messages_processed(&self) -> u64 {
        self.md_messages_processed.load(Ordering::Relaxed)
    }

    pub fn exec_reports_processed(&self) -> u64 {
        self.exec_reports_processed.load(Ordering::Relaxed)
    }

    fn pin_current_thread(core_index: usize) {
        match core_affinity::get_core_ids() {
            Some(core_ids) if core_index < core_ids.len() => {
                if !core_affinity::set_for_current(core_ids[core_index]) {
                    warn!(core_index, "failed to pin thread to core");
                }
            }
            _ => warn!(core_index, "core affinity unavailable, running unpinned"),
        }
    }

    /// Spawn exec, strategy, and md threads in that order (reverse
    /// data-flow), so each stage's consumer is alive before its producer.
    pub fn run(&mut self) -> Result<(), EngineError> {
        let symbol = self
            .symbols
            .first()
            .cloned()
            .ok_or_else(|| EngineError::Configuration("no symbols registered".into()))?;

        let router = Router::new().map_err(EngineError::HardwareRegisterOpen)?;

        let mut decoder = Decoder::new();
        decoder
            .register_symbol(name_to_tag(&symbol.name), symbol.id)
            .map_err(|_| EngineError::SymbolTableFull)?;

        self.state.store(EngineState::Running as u8, Ordering::Release);
        self.running.store(true, Ordering::Release);

        let exec_handle = {
            let running = Arc::clone(&self.running);
            let strategy_to_risk = Arc::clone(&self.strategy_to_risk);
            let gateway_to_strategy = Arc::clone(&self.gateway_to_strategy);
            let strategy_to_hw_params = Arc::clone(&self.strategy_to_hw_params);
            let limits = self.config.risk_limits;
            let register_path = self.config.hw_register_file.clone();
            let symbols = Arc::new(self.symbols.clone());
            std::thread::spawn(move || {
                Self::pin_current_thread(EXEC_CORE);
                Self::exec_thread_loop(
                    running,
                    strategy_to_risk,
                    gateway_to_strategy,
                    strategy_to_hw_params,
                    router,
                    limits,
                    register_path,
                    symbols,
                );
            })
        };

        let strategy_handle = {
            let running = Arc::clone(&self.running);
            let md_to_strategy = Arc::clone(&self.md_to_strategy);
            let strategy_to_risk = Arc::clone(&self.strategy_to_risk);
            let gateway_to_strategy = Arc::clone(&self.gateway_to_strategy);
            let strategy_to_hw_params = Arc::clone(&self.strategy_to_hw_params);
            let symbol_id = symbol.id;
            let max_pos_limit = self.config.risk_limits.max_position_shares;
            let md_messages_processed = Arc::clone(&self.md_messages_processed);
            let exec_reports_processed = Arc::clone(&self.exec_reports_processed);
            std::thread::spawn(move || {
                Self::pin_current_thread(STRATEGY_CORE);
                Self::strategy_thread_loop(
                    running,
                    md_to_strategy,
                    strategy_to_risk,
                    gateway_to_strategy,
                    strategy_to_hw_params,
                    symbol_id,
                    max_pos_limit,
                    md_messages_processed,
                    exec_reports_processed,
                );
            })
        };

        let md_handle = {
            let running = Arc::clone(&self.running);
            let md_to_strategy = Arc::clone(&self.md_to_strategy);
            let tag = name_to_tag(&symbol.name);
            std::thread::spawn(move || {
                Self::pin_current_thread(MD_CORE);
                Self::md_thread_loop(running, md_to_strategy, decoder, tag);
            })
        };

        self.handles = vec![exec_handle, strategy_handle, md_handle];
        info!("engine running");
        Ok(())
    }

    /// Clear `running`; join all threads in LIFO spawn order (md, then
    /// strategy, then exec). Idempotent: calling `stop` twice is a no-op the
    /// second time since `handles` is drained on the first call.
    pub fn stop(&mut self) {
        self.state.store(EngineState::Stopping as u8, Ordering::Release);
        self.running.store(false, Ordering::Release);
        while let Some(handle) = self.handles.pop() {
            let _ = handle.join();
        }
        self.state.store(EngineState::Stopped as u8, Ordering::Release);
        info!("engine stopped");
    }

    fn md_thread_loop(
        running: Arc<AtomicBool>,
        md_to_strategy: Arc<SpscRing<crate::wire::decoder::DecodedMessage>>,
        mut decoder: Decoder,
        tag: [u8; 8],
    ) {
        let mut source = SimulatedSource::new(tag);
        let mut rdtsc_ts: u64 = 0;

        while running.load(Ordering::Acquire) {
            let record = source.next_record();
            let len = u16::from_be_bytes([record[0], record[1]]) as usize;
            let payload = &record[2..2 + len];
            rdtsc_ts += 1;
            let msg = decoder.decode(payload, rdtsc_ts);
            if msg.valid {
                md_to_strategy.push(msg);
            }
            std::thread::sleep(source.tick_interval);
        }
    }

    fn strategy_thread_loop(
        running: Arc<AtomicBool>,
        md_to_strategy: Arc<SpscRing<crate::wire::decoder::DecodedMessage>>,
        strategy_to_risk: Arc<SpscRing<StrategyOrder>>,
        gateway_to_strategy: Arc<SpscRing<ExecutionReport>>,
        strategy_to_hw_params: Arc<SpscRing<HardwareParamUpdate>>,
        symbol_id: SymbolId,
        max_pos_limit: i64,
        md_messages_processed: Arc<AtomicU64>,
        exec_reports_processed: Arc<AtomicU64>,
    ) {
        let mut strategy = Strategy::new(symbol_id, Arc::clone(&strategy_to_risk), StrategyParams::default());
        let mut events_since_param_push: u32 = 0;

        while running.load(Ordering::Acquire) {
            let mut did_work = false;

            if let Some(msg) = md_to_strategy.pop() {
                strategy.on_market_data(&msg);
                did_work = true;
                md_messages_processed.fetch_add(1, Ordering::Relaxed);
                events_since_param_push += 1;
                if events_since_param_push >= HW_PARAM_PUSH_INTERVAL {
                    events_since_param_push = 0;
                    strategy_to_hw_params.push(strategy.hardware_param_snapshot(max_pos_limit));
                }
            }

            if let Some(report) = gateway_to_strategy.pop() {
                strategy.on_execution(&report);
                did_work = true;
                exec_reports_processed.fetch_add(1, Ordering::Relaxed);
            }

            if !did_work {
                std::thread::yield_now();
            }
        }
    }

    fn exec_thread_loop(
        running: Arc<AtomicBool>,
        strategy_to_risk: Arc<SpscRing<StrategyOrder>>,
        gateway_to_strategy: Arc<SpscRing<ExecutionReport>>,
        strategy_to_hw_params: Arc<SpscRing<HardwareParamUpdate>>,
        mut router: Router,
        limits: crate::risk::RiskLimits,
        hw_register_file: Option<std::path::PathBuf>,
        symbols: Arc<SymbolUniverse>,
    ) {
        let mut risk = RiskChecker::new(limits);
        let _ = hw_register_file; // reserved for a file-backed register block, see EngineConfig
        let mut gateway = GatewaySim::new();
        let mut tsc: u64 = 0;
        let fallback_symbol = crate::types::symbol::SymbolInfo {
            id: crate::types::symbol::INVALID_SYMBOL,
            name: String::new(),
            lot_size: 1,
            tick_size: crate::types::Price::new(100),
            maker_fee: 0.0,
            taker_fee: 0.0,
            use_hw_execution: false,
        };

        while running.load(Ordering::Acquire) {
            let mut did_work = false;

            if let Some(order) = strategy_to_risk.pop() {
                did_work = true;
                tsc += 1;
                if risk.check_order(&order) {
                    let symbol = symbols.get_symbol(order.symbol_id).unwrap_or(&fallback_symbol);
                    router.route(order, symbol, &mut gateway, tsc);
                }
            }

            if let Some(update) = strategy_to_hw_params.pop() {
                did_work = true;
                router.apply_hw_params(update);
            }

            while let Some(report) = gateway.get_execution_report() {
                did_work = true;
                risk.on_execution(&report);
                gateway_to_strategy.push(report);
            }

            if !did_work {
                std::thread::yield_now();
            }
        }
    }
}

fn name_to_tag(name: &str) -> [u8; 8] {
    let mut tag = [b' '; 8];
    let bytes = name.as_bytes();
    let n = bytes.len().min(8);
    tag[..n].copy_from_slice(&bytes[..n]);
    tag
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::symbol::SymbolInfo;
    use crate::types::Price;

    fn test_universe() -> SymbolUniverse {
        let mut u = SymbolUniverse::new();
        u.add_symbol(SymbolInfo {
            id: 1,
            name: "AAPL".to_string(),
            lot_size: 1,
            tick_size: Price::new(100),
            maker_fee: 0.0,
            taker_fee: 0.0,
            use_hw_execution: false,
        });
        u
    }

    #[test]
    fn lifecycle_created_running_stopping_stopped() {
        let mut engine = Engine::new(EngineConfig::default(), test_universe()).unwrap();
        assert_eq!(engine.state(), EngineState::Created);
        engine.run().unwrap();
        assert_eq!(engine.state(), EngineState::Running);
        engine.stop();
        assert_eq!(engine.state(), EngineState::Stopped);
    }

    #[test]
    fn telemetry_counters_start_at_zero() {
        let engine = Engine::new(EngineConfig::default(), test_universe()).unwrap();
        assert_eq!(engine.md_messages_processed(), 0);
        assert_eq!(engine.exec_reports_processed(), 0);
    }

    #[test]
    fn stop_is_idempotent() {
        let mut engine = Engine::new(EngineConfig::default(), test_universe()).unwrap();
        engine.run().unwrap();
        engine.stop();
        engine.stop();
        assert_eq!(engine.state(), EngineState::Stopped);
    }
}
