// Smart order routing: per-symbol dispatch between the simulated hardware
// quoting path and the software gateway, with latency telemetry kept
// separately for each path.

pub mod hw_driver;

use std::time::Instant;

use crate::gateway::GatewaySim;
use crate::types::symbol::SymbolInfo;
use crate::types::{HardwareParamUpdate, StrategyOrder};
use hw_driver::HardwareDriver;

#[derive(Debug, Default, Clone, Copy)]
pub struct RouteLatencyStats {
    pub count: u64,
    pub total_ns: u64,
}

impl RouteLatencyStats {
    fn record(&mut self, elapsed_ns: u64) {
        self.count += 1;
        self.total_ns += elapsed_ns;
    }

    pub fn avg_ns(&self) -> u64 {
        if self.count == 0 { 0 } else { self.total_ns / self.count }
    }
}

/// Routes accepted orders to either the simulated FPGA register path or the
/// software gateway, based on each symbol's `use_hw_execution` flag.
pub struct Router {
    hw: Option<HardwareDriver>,
    cpu_stats: RouteLatencyStats,
    hw_stats: RouteLatencyStats,
}

impl Router {
    pub fn new() -> std::io::Result<Self> {
        Ok(Self {
            hw: Some(HardwareDriver::new()?),
            cpu_stats: RouteLatencyStats::default(),
            hw_stats: RouteLatencyStats::default(),
        })
    }

    pub fn cpu_latency(&self) -> RouteLatencyStats {
        self.cpu_stats
    }

    pub fn hw_latency(&self) -> RouteLatencyStats {
        self.hw_stats
    }

    /// Dispatch a risk-approved order. `symbol` decides the path; the
    /// software path's acknowledgment/fill reports are queued inside
    /// `gateway` for the execution thread to drain.
    pub fn route(&mut self, order: StrategyOrder, symbol: &SymbolInfo, gateway: &mut GatewaySim, tsc: u64) {
        if symbol.use_hw_execution {
            self.route_hw(order);
        } else {
            self.route_cpu(order, gateway, tsc);
        }
    }

    fn route_cpu(&mut self, order: StrategyOrder, gateway: &mut GatewaySim, tsc: u64) {
        let start = Instant::now();
        gateway.send_order(order, tsc);
        self.cpu_stats.record(start.elapsed().as_nanos() as u64);
    }

    /// Apply a periodic parameter refresh to the hardware register block.
    /// A no-op if the hardware path isn't available — exec_thread still
    /// drains these messages so a misconfigured hw path doesn't back up the
    /// ring.
    pub fn apply_hw_params(&mut self, update: HardwareParamUpdate) {
        if let Some(hw) = self.hw.as_mut() {
            let _ = hw.update_strategy_params(update.base_skew, update.gamma, update.max_pos_limit);
        }
    }

    fn route_hw(&mut self, order: StrategyOrder) {
        let start = Instant::now();
        if let Some(hw) = self.hw.as_mut() {
            let _ = hw.send_order(&order);
        }
        self.hw_stats.record(start.elapsed().as_nanos() as u64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OrderAction, OrderType, Price, Side};

    fn symbol(use_hw: bool) -> SymbolInfo {
        SymbolInfo {
            id: 1,
            name: "TEST".to_string(),
            lot_size: 1,
            tick_size: Price::new(100),
            maker_fee: 0.0,
            taker_fee: 0.0,
            use_hw_execution: use_hw,
        }
    }

    fn order() -> StrategyOrder {
        StrategyOrder {
            action: OrderAction::New,
            client_order_id: 1,
            symbol_id: 1,
            side: Side::Buy,
            price: Price::new(1_000_000),
            quantity: 10,
            order_type: OrderType::Limit,
        }
    }

    #[test]
    fn cpu_path_reaches_the_gateway() {
        let mut router = Router::new().unwrap();
        let mut gateway = GatewaySim::new();
        router.route(order(), &symbol(false), &mut gateway, 0);
        assert_eq!(gateway.resting_order_count(), 1);
        assert_eq!(router.cpu_latency().count, 1);
        assert_eq!(router.hw_latency().count, 0);
    }

    #[test]
    fn hw_path_bypasses_the_gateway() {
        let mut router = Router::new().unwrap();
        let mut gateway = GatewaySim::new();
        router.route(order(), &symbol(true), &mut gateway, 0);
        assert_eq!(gateway.resting_order_count(), 0);
        assert_eq!(router.hw_latency().count, 1);
        assert_eq!(router.cpu_latency().count, 0);
    }

    #[test]
    fn apply_hw_params_writes_through_to_the_register_block() {
        let mut router = Router::new().unwrap();
        router.apply_hw_params(HardwareParamUpdate { base_skew: -500, gamma: 250, max_pos_limit: 10_000 });
        let hw = router.hw.as_ref().unwrap();
        assert_eq!(hw.read_reg_i64(hw_driver::REG_BASE_SKEW).unwrap(), -500);
    }
}
