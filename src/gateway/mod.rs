// Minimal software crossing engine. Owned entirely by the execution thread:
// maintains its own resting-order book (separate from the market-data
// OrderBookL2) and a queue of execution reports the exec thread drains into
// the strategy-feedback ring.

use std::collections::VecDeque;

use crate::types::symbol::SymbolId;
use crate::types::{ExecutionReport, ExecutionStatus, OrderType, Price, Side, StrategyOrder};

#[derive(Debug, Clone, Copy)]
struct RestingOrder {
    client_order_id: u64,
    symbol_id: SymbolId,
    side: Side,
    price: Price,
    quantity: u32,
    seq: u64,
}

pub struct GatewaySim {
    active_bids: Vec<RestingOrder>,
    active_asks: Vec<RestingOrder>,
    reports: VecDeque<ExecutionReport>,
    next_seq: u64,
}

impl GatewaySim {
    pub fn new() -> Self {
        Self {
            active_bids: Vec::new(),
            active_asks: Vec::new(),
            reports: VecDeque::new(),
            next_seq: 1,
        }
    }

    pub fn get_execution_report(&mut self) -> Option<ExecutionReport> {
        self.reports.pop_front()
    }

    pub fn resting_order_count(&self) -> usize {
        self.active_bids.len() + self.active_asks.len()
    }

    /// Accept an order: acknowledge it, cross it against the resting book,
    /// then (if a limit order with size remaining) let it rest.
    pub fn send_order(&mut self, order: StrategyOrder, tsc: u64) {
        self.reports.push_back(ExecutionReport {
            tsc,
            client_order_id: order.client_order_id,
            symbol_id: order.symbol_id,
            status: ExecutionStatus::New,
            fill_price: Price::ZERO,
            fill_quantity: 0,
            remaining_quantity: order.quantity,
        });

        let remaining = self.try_match(order, tsc);

        if remaining > 0 && order.order_type == OrderType::Limit {
            let seq = self.next_seq;
            self.next_seq += 1;
            let resting = RestingOrder {
                client_order_id: order.client_order_id,
                symbol_id: order.symbol_id,
                side: order.side,
                price: order.price,
                quantity: remaining,
                seq,
            };
            Self::insert_sorted(
                match order.side {
                    Side::Buy => &mut self.active_bids,
                    Side::Sell => &mut self.active_asks,
                },
                resting,
            );
        }
    }

    /// Cross the incoming order against the opposite side. Returns the
    /// quantity still unfilled.
    fn try_match(&mut self, order: StrategyOrder, tsc: u64) -> u32 {
        let mut remaining = order.quantity;
        let book = match order.side {
            Side::Buy => &mut self.active_asks,
            Side::Sell => &mut self.active_bids,
        };

        while remaining > 0 {
            let Some(top) = book.first() else { break };
            let crosses = match order.side {
                Side::Buy => top.price.raw() <= order.price.raw(),
                Side::Sell => top.price.raw() >= order.price.raw(),
            };
            if !crosses {
                break;
            }

            let fill_qty = remaining.min(top.quantity);
            let fill_price = top.price;
            remaining -= fill_qty;

            let status = if remaining == 0 { ExecutionStatus::Filled } else { ExecutionStatus::Partial };
            self.reports.push_back(ExecutionReport {
                tsc,
                client_order_id: order.client_order_id,
                symbol_id: order.symbol_id,
                status,
                fill_price,
                fill_quantity: fill_qty,
                remaining_quantity: remaining,
            });

            if fill_qty == top.quantity {
                book.remove(0);
            } else {
                book[0].quantity -= fill_qty;
            }
        }

        remaining
    }

    fn insert_sorted(book: &mut Vec<RestingOrder>, order: RestingOrder) {
        let idx = match order.side {
            Side::Buy => book.partition_point(|o| o.price.raw() > order.price.raw()),
            Side::Sell => book.partition_point(|o| o.price.raw() < order.price.raw()),
        };
        book.insert(idx, order);
    }
}

impl Default for GatewaySim {
    fn default() -> Self {
        Self::new()
    }
}
