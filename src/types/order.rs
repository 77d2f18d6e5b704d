// Order and execution-report records shared by strategy, risk, router, and
// gateway. These cross thread boundaries via the SPSC rings, so they are
// plain `Copy` data — no embedded pointers or interior mutability.

use super::fixed_point::Price;
use super::side::Side;
use super::symbol::SymbolId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderAction {
    New,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderType {
    Limit,
    Market,
}

/// An order produced by the strategy, consumed by risk then the router.
/// Ownership is conceptually surrendered to whichever execution path
/// accepts it.
#[derive(Debug, Clone, Copy)]
pub struct StrategyOrder {
    pub action: OrderAction,
    pub client_order_id: u64,
    pub symbol_id: SymbolId,
    pub side: Side,
    pub price: Price,
    pub quantity: u32,
    pub order_type: OrderType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStatus {
    New,
    Partial,
    Filled,
    Canceled,
    Rejected,
}

#[derive(Debug, Clone, Copy)]
pub struct ExecutionReport {
    pub tsc: u64,
    pub client_order_id: u64,
    pub symbol_id: SymbolId,
    pub status: ExecutionStatus,
    pub fill_price: Price,
    pub fill_quantity: u32,
    pub remaining_quantity: u32,
}

/// Periodic refresh of the strategy's fixed-point parameters, pushed from
/// the strategy thread to the execution thread so the latter — the sole
/// owner of the hardware register block — can apply them without a shared
/// mutable handle between the two threads.
#[derive(Debug, Clone, Copy)]
pub struct HardwareParamUpdate {
    pub base_skew: i64,
    pub gamma: i64,
    pub max_pos_limit: i64,
}
