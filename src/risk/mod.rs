// Pre-trade risk checking. Three integer-only limit checks on the hot path,
// plus position tracking derived from fill reports.

use std::collections::HashMap;

use crate::types::fixed_point::SCALE;
use crate::types::{ExecutionReport, ExecutionStatus, Side, StrategyOrder};

#[derive(Debug, Clone, Copy)]
pub struct RiskLimits {
    pub max_order_size: u32,
    pub max_position_shares: i64,
    /// Whole-currency units; compared against notional scaled by `SCALE`.
    pub max_notional: i64,
}

impl Default for RiskLimits {
    /// Defaults match the S5 scenario constants, overridable via
    /// `EngineConfig` for ops tuning without a rebuild.
    fn default() -> Self {
        Self {
            max_order_size: 1_000,
            max_position_shares: 10_000,
            max_notional: 1_000_000,
        }
    }
}

/// Tracks one signed net position per symbol and validates orders against
/// fixed limits. No floating point anywhere on the hot path.
pub struct RiskChecker {
    limits: RiskLimits,
    position_by_symbol: HashMap<u32, i64>,
    /// Side recovered by client-order-id when a later execution report for
    /// that order arrives, so `on_execution` knows which way to move the
    /// position.
    side_by_client_order_id: HashMap<u64, (u32, Side)>,
}

impl RiskChecker {
    pub fn new(limits: RiskLimits) -> Self {
        Self {
            limits,
            position_by_symbol: HashMap::new(),
            side_by_client_order_id: HashMap::new(),
        }
    }

    pub fn position(&self, symbol_id: u32) -> i64 {
        *self.position_by_symbol.get(&symbol_id).unwrap_or(&0)
    }

    /// Hot path. Returns `true` if the order may be routed.
    pub fn check_order(&mut self, order: &StrategyOrder) -> bool {
        if order.quantity > self.limits.max_order_size {
            return false;
        }

        let current = self.position(order.symbol_id);
        let hypothetical = match order.side {
            Side::Buy => current + order.quantity as i64,
            Side::Sell => current - order.quantity as i64,
        };
        if hypothetical.abs() > self.limits.max_position_shares {
            return false;
        }

        let notional = order.price.raw() * order.quantity as i64;
        if notional > self.limits.max_notional * SCALE {
            return false;
        }

        self.side_by_client_order_id
            .insert(order.client_order_id, (order.symbol_id, order.side));
        true
    }

    /// Update `current_position` from a fill. The side is recovered from the
    /// client-order-id index populated by `check_order`.
    pub fn on_execution(&mut self, report: &ExecutionReport) {
        if !matches!(report.status, ExecutionStatus::Partial | ExecutionStatus::Filled) {
            return;
        }
        let Some(&(symbol_id, side)) = self.side_by_client_order_id.get(&report.client_order_id) else {
            return;
        };
        let delta = match side {
            Side::Buy => report.fill_quantity as i64,
            Side::Sell => -(report.fill_quantity as i64),
        };
        *self.position_by_symbol.entry(symbol_id).or_insert(0) += delta;
    }
}
