// Reservation-price quoting strategy. Feeds the book on every market data
// message, then (when both sides have a valid top) computes a two-sided
// quote around an inventory-adjusted reservation price and pushes it to the
// outbound order ring.

use std::sync::Arc;

use crate::book::OrderBookL2;
use crate::ring::SpscRing;
use crate::types::fixed_point::SCALE;
use crate::types::symbol::SymbolId;
use crate::types::{
    ExecutionReport, ExecutionStatus, HardwareParamUpdate, OrderAction, OrderType, Price, Side, StrategyOrder,
};
use crate::wire::decoder::DecodedMessage;

/// Constant per-quote size used by v1 of the strategy.
pub const QUOTE_QUANTITY: u32 = 100;
/// Minimum half-spread multiplier applied to the volatility estimate.
const SIGMA_SPREAD_MULTIPLIER: i64 = 5_000;
const DEFAULT_TICK_SIZE: i64 = 100;

#[derive(Debug, Clone, Copy)]
pub struct StrategyParams {
    /// Risk aversion, fixed-point scaled by `SCALE`.
    pub gamma: i64,
    /// Volatility estimate, fixed-point scaled by `SCALE`.
    pub sigma: i64,
    pub tick_size: i64,
}

impl Default for StrategyParams {
    fn default() -> Self {
        Self { gamma: SCALE / 100, sigma: SCALE / 10_000, tick_size: DEFAULT_TICK_SIZE }
    }
}

pub struct Strategy {
    symbol_id: SymbolId,
    book: OrderBookL2,
    outbound: Arc<SpscRing<StrategyOrder>>,
    inventory: i64,
    params: StrategyParams,
    next_client_order_id: u64,
}

impl Strategy {
    pub fn new(symbol_id: SymbolId, outbound: Arc<SpscRing<StrategyOrder>>, params: StrategyParams) -> Self {
        Self {
            symbol_id,
            book: OrderBookL2::new(symbol_id),
            outbound,
            inventory: 0,
            params,
            next_client_order_id: 1,
        }
    }

    pub fn book(&self) -> &OrderBookL2 {
        &self.book
    }

    pub fn inventory(&self) -> i64 {
        self.inventory
    }

    pub fn set_params(&mut self, params: StrategyParams) {
        self.params = params;
    }

    /// Snapshot of the values the hardware offload path needs refreshed
    /// periodically: an inventory-proportional skew (mirrors the
    /// reservation-price adjustment in `quote_if_ready`) plus the current
    /// risk aversion and the caller-supplied position limit.
    pub fn hardware_param_snapshot(&self, max_pos_limit: i64) -> HardwareParamUpdate {
        let base_skew =
            (-(self.inventory as i128) * self.params.gamma as i128 / SCALE as i128) as i64;
        HardwareParamUpdate { base_skew, gamma: self.params.gamma, max_pos_limit }
    }

    /// Feed one decoded market-data message and, if both sides of the book
    /// have a valid top, emit a refreshed two-sided quote.
    pub fn on_market_data(&mut self, msg: &DecodedMessage) {
        self.book.update(msg);
        self.quote_if_ready();
    }

    fn quote_if_ready(&mut self) {
        let bid = self.book.best_bid();
        let ask = self.book.best_ask();
        if bid.price == Price::ZERO || ask.price.is_invalid() {
            return;
        }

        let mid = bid.price.midpoint(&ask.price);
        let market_half_spread = (ask.price.raw() - bid.price.raw()) / 2;
        let vol_half_spread = self.params.sigma.saturating_mul(SIGMA_SPREAD_MULTIPLIER);
        let half_spread = vol_half_spread.max(market_half_spread);

        // reservation = mid - inventory * gamma * sigma^2, all terms carried
        // in fixed-point; the i128 intermediate avoids overflow from the
        // sigma^2 term.
        let adjustment = (self.inventory as i128)
            * (self.params.gamma as i128)
            * (self.params.sigma as i128)
            * (self.params.sigma as i128)
            / (SCALE as i128 * SCALE as i128);
        let reservation = Price::new(mid.raw() - adjustment as i64);

        let optimal_bid = Price::new(reservation.raw() - half_spread).quantize_down(self.params.tick_size);
        let optimal_ask = Price::new(reservation.raw() + half_spread).quantize_down(self.params.tick_size);

        if optimal_bid.raw() > 0 {
            self.emit(Side::Buy, optimal_bid);
        }
        if optimal_ask.raw() > optimal_bid.raw() {
            self.emit(Side::Sell, optimal_ask);
        }
    }

    fn emit(&mut self, side: Side, price: Price) {
        let order = StrategyOrder {
            action: OrderAction::New,
            client_order_id: self.next_client_order_id,
            symbol_id: self.symbol_id,
            side,
            price,
            quantity: QUOTE_QUANTITY,
            order_type: OrderType::Limit,
        };
        self.next_client_order_id += 1;
        self.outbound.push(order);
    }

    /// Update inventory from an execution report for this strategy's symbol.
    ///
    /// The side of the fill is inferred by comparing the fill price to the
    /// current best ask rather than tracked per client-order-id. This is a
    /// known approximation carried over from the source design: it is wrong
    /// whenever the book has moved between order placement and fill, but the
    /// behavior is reproduced as specified for parity.
    pub fn on_execution(&mut self, report: &ExecutionReport) {
        if report.symbol_id != self.symbol_id {
            return;
        }
        if !matches!(report.status, ExecutionStatus::Partial | ExecutionStatus::Filled) {
            return;
        }

        let best_ask = self.book.best_ask().price;
        let is_buy_fill = !best_ask.is_invalid() && report.fill_price.raw() < best_ask.raw();
        if is_buy_fill {
            self.inventory += report.fill_quantity as i64;
        } else {
            self.inventory -= report.fill_quantity as i64;
        }
    }
}
