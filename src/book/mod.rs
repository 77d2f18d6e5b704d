// Incremental L2 order book: pooled order entries, hashed order index, two
// flat sorted level arrays. Single-threaded — only the strategy thread
// touches one symbol's book.

use crate::types::fixed_point::INVALID_PRICE;
use crate::types::symbol::{SymbolId, INVALID_SYMBOL};
use crate::types::{Price, Side};
use crate::wire::decoder::{DecodedMessage, EventKind};

pub const MAX_LEVELS: usize = 100;
const POOL_CAPACITY: usize = 100_000;
const BUCKET_COUNT: usize = 131_072; // power of two, >= 1.3x POOL_CAPACITY
const NIL: u32 = u32::MAX;

/// One resting order, owned by the arena. `next` threads this entry either
/// into its hash-bucket chain (while live) or the pool's free list (while
/// unallocated) — the two uses never overlap.
#[derive(Clone, Copy)]
struct OrderEntry {
    order_id: u64,
    price: Price,
    side: Side,
    quantity: u32,
    next: u32,
}

impl OrderEntry {
    const EMPTY: OrderEntry = OrderEntry {
        order_id: 0,
        price: Price::ZERO,
        side: Side::Buy,
        quantity: 0,
        next: NIL,
    };
}

/// Aggregated quantity and order count at one price. `quantity` is kept as
/// `i64` internally so `update_level` can observe a transient non-positive
/// value mid-update before the level is collapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Level {
    pub price: Price,
    pub quantity: i64,
    pub order_count: u32,
}

impl Level {
    fn empty(sentinel: Price) -> Self {
        Level { price: sentinel, quantity: 0, order_count: 0 }
    }
}

/// Snapshot of the best bid and offer, delivered to the listener only when
/// the top of book actually changed.
#[derive(Debug, Clone, Copy)]
pub struct BboEvent {
    pub symbol_id: SymbolId,
    pub bid_price: Price,
    pub bid_quantity: i64,
    pub ask_price: Price,
    pub ask_quantity: i64,
    pub monotonic_ns: u64,
}

/// Narrow callback invoked on every BBO change. Not `Send`: the book and its
/// listener both live on the single strategy thread.
pub trait BboListener {
    fn on_bbo_change(&mut self, event: BboEvent);
}

pub struct OrderBookL2 {
    symbol_id: SymbolId,
    arena: Vec<OrderEntry>,
    free_head: u32,
    bucket_heads: Vec<u32>,
    bids: [Level; MAX_LEVELS],
    asks: [Level; MAX_LEVELS],
    listener: Option<Box<dyn BboListener>>,
    pool_exhausted_count: u64,
}

impl OrderBookL2 {
    pub fn new(symbol_id: SymbolId) -> Self {
        let mut arena = vec![OrderEntry::EMPTY; POOL_CAPACITY];
        for i in 0..POOL_CAPACITY {
            arena[i].next = if i + 1 < POOL_CAPACITY { (i + 1) as u32 } else { NIL };
        }
        Self {
            symbol_id,
            arena,
            free_head: 0,
            bucket_heads: vec![NIL; BUCKET_COUNT],
            bids: [Level::empty(Price::ZERO); MAX_LEVELS],
            asks: [Level::empty(Price::INVALID); MAX_LEVELS],
            listener: None,
            pool_exhausted_count: 0,
        }
    }

    pub fn set_listener(&mut self, listener: Box<dyn BboListener>) {
        self.listener = Some(listener);
    }

    pub fn symbol_id(&self) -> SymbolId {
        self.symbol_id
    }

    pub fn best_bid(&self) -> Level {
        self.bids[0]
    }

    pub fn best_ask(&self) -> Level {
        self.asks[0]
    }

    pub fn bids(&self) -> &[Level; MAX_LEVELS] {
        &self.bids
    }

    pub fn asks(&self) -> &[Level; MAX_LEVELS] {
        &self.asks
    }

    pub fn pool_exhausted_count(&self) -> u64 {
        self.pool_exhausted_count
    }

    #[inline]
    fn hash_order_id(id: u64) -> usize {
        // Fibonacci hashing: multiply by the odd golden-ratio constant and
        // take the high bits, masked down to the bucket count.
        let h = id.wrapping_mul(0x9E3779B97F4A7C15);
        ((h >> 40) as usize) & (BUCKET_COUNT - 1)
    }

    /// Apply one decoded message. Ignores events for a different symbol and
    /// invalid messages (the decoder's silent failure signal).
    pub fn update(&mut self, msg: &DecodedMessage) {
        if !msg.valid {
            return;
        }
        if msg.symbol_id != INVALID_SYMBOL && msg.symbol_id != self.symbol_id {
            return;
        }

        let prev_bid = self.bids[0];
        let prev_ask = self.asks[0];

        match msg.ev {
            EventKind::AddOrder => {
                if let Some(side) = msg.side {
                    self.add_order(msg.order_id, side, msg.price, msg.quantity);
                }
            }
            EventKind::DeleteOrder => {
                self.delete_order(msg.order_id);
            }
            EventKind::ReplaceOrder => {
                if let Some(side) = self.side_of(msg.order_id) {
                    self.delete_order(msg.order_id);
                    self.add_order(msg.new_order_id, side, msg.price, msg.quantity);
                }
            }
            EventKind::Unknown => {}
        }

        self.maybe_notify_bbo(prev_bid, prev_ask, msg.rdtsc_ts);
    }

    fn side_of(&self, order_id: u64) -> Option<Side> {
        let bucket = Self::hash_order_id(order_id);
        let mut idx = self.bucket_heads[bucket];
        while idx != NIL {
            let entry = &self.arena[idx as usize];
            if entry.order_id == order_id {
                return Some(entry.side);
            }
            idx = entry.next;
        }
        None
    }

    fn add_order(&mut self, order_id: u64, side: Side, price: Price, quantity: u32) {
        let slot = self.free_head;
        if slot == NIL {
            self.pool_exhausted_count += 1;
            return;
        }
        self.free_head = self.arena[slot as usize].next;

        let bucket = Self::hash_order_id(order_id);
        self.arena[slot as usize] = OrderEntry {
            order_id,
            price,
            side,
            quantity,
            next: self.bucket_heads[bucket],
        };
        self.bucket_heads[bucket] = slot;

        self.update_level(side, price, quantity as i64);
    }

    fn delete_order(&mut self, order_id: u64) {
        let bucket = Self::hash_order_id(order_id);
        let mut idx = self.bucket_heads[bucket];
        let mut prev: u32 = NIL;

        while idx != NIL {
            let entry = self.arena[idx as usize];
            if entry.order_id == order_id {
                if prev == NIL {
                    self.bucket_heads[bucket] = entry.next;
                } else {
                    self.arena[prev as usize].next = entry.next;
                }

                self.update_level(entry.side, entry.price, -(entry.quantity as i64));

                self.arena[idx as usize].next = self.free_head;
                self.free_head = idx;
                return;
            }
            prev = idx;
            idx = entry.next;
        }
    }

    /// Hot routine: adjust the aggregated level for `side` at `price` by
    /// `qty_delta`, shifting the flat sorted array in place.
    fn update_level(&mut self, side: Side, price: Price, qty_delta: i64) {
        let sentinel = if side == Side::Buy { Price::ZERO } else { Price::INVALID };
        let levels: &mut [Level; MAX_LEVELS] = if side == Side::Buy { &mut self.bids } else { &mut self.asks };

        for i in 0..MAX_LEVELS {
            if levels[i].price == price {
                levels[i].quantity += qty_delta;
                if qty_delta > 0 {
                    levels[i].order_count += 1;
                } else {
                    levels[i].order_count = levels[i].order_count.saturating_sub(1);
                }

                if levels[i].quantity <= 0 {
                    if i < MAX_LEVELS - 1 {
                        levels.copy_within(i + 1..MAX_LEVELS, i);
                    }
                    levels[MAX_LEVELS - 1] = Level::empty(sentinel);
                }
                return;
            }

            let is_empty_slot = levels[i].price == sentinel;
            let correct_order = if side == Side::Buy {
                levels[i].price < price
            } else {
                levels[i].price > price
            };

            if is_empty_slot || correct_order {
                if qty_delta < 0 {
                    // Deleting a level that was never found: nothing to do.
                    return;
                }
                if i < MAX_LEVELS - 1 {
                    levels.copy_within(i..MAX_LEVELS - 1, i + 1);
                }
                levels[i] = Level { price, quantity: qty_delta, order_count: 1 };
                return;
            }
        }
    }

    fn maybe_notify_bbo(&mut self, prev_bid: Level, prev_ask: Level, monotonic_ns: u64) {
        let bid = self.bids[0];
        let ask = self.asks[0];
        if bid.price == prev_bid.price
            && bid.quantity == prev_bid.quantity
            && ask.price == prev_ask.price
            && ask.quantity == prev_ask.quantity
        {
            return;
        }
        if let Some(listener) = self.listener.as_mut() {
            listener.on_bbo_change(BboEvent {
                symbol_id: self.symbol_id,
                bid_price: bid.price,
                bid_quantity: bid.quantity,
                ask_price: ask.price,
                ask_quantity: ask.quantity,
                monotonic_ns,
            });
        }
    }
}

const _: () = assert!(INVALID_PRICE == i64::MAX);
