// Binary exchange market-data decoder.
//
// Turns a length-prefixed wire record's payload (the 2-byte length prefix
// has already been stripped by the caller's framer) into a `DecodedMessage`.
// Stateless with respect to message sequencing: each call to `decode` is a
// pure function of its input bytes and the (read-only, post-startup) symbol
// table. All multi-byte wire fields are big-endian.

use crate::types::symbol::SymbolId;
use crate::types::{Price, Side};
use crate::wire::symbol_table::SymbolTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    AddOrder,
    DeleteOrder,
    ReplaceOrder,
    Unknown,
}

const TAG_ADD_ORDER: u8 = b'A';
const TAG_ORDER_DELETE: u8 = b'D';
const TAG_ORDER_REPLACE: u8 = b'U';

// Minimum payload length for each recognized message, counting the leading
// type tag byte: 1 (tag) + locate:2 + tracking:2 + ts:6 + fields.
const ADD_ORDER_LEN: usize = 1 + 2 + 2 + 6 + 8 + 1 + 4 + 8 + 4; // 36
const ORDER_DELETE_LEN: usize = 1 + 2 + 2 + 6 + 8; // 19
const ORDER_REPLACE_LEN: usize = 1 + 2 + 2 + 6 + 8 + 8 + 4 + 4; // 35

/// Event emitted by the decoder. `valid = false` means "unrecognized or
/// truncated"; this is a normal, silent outcome on the hot path, not an error.
#[derive(Debug, Clone, Copy)]
pub struct DecodedMessage {
    pub ev: EventKind,
    pub exchange_ts: u64,
    pub rdtsc_ts: u64,
    pub order_id: u64,
    pub new_order_id: u64,
    pub symbol_id: SymbolId,
    pub side: Option<Side>,
    pub price: Price,
    pub quantity: u32,
    pub valid: bool,
}

impl DecodedMessage {
    fn invalid(rdtsc_ts: u64) -> Self {
        Self {
            ev: EventKind::Unknown,
            exchange_ts: 0,
            rdtsc_ts,
            order_id: 0,
            new_order_id: 0,
            symbol_id: crate::types::symbol::INVALID_SYMBOL,
            side: None,
            price: Price::ZERO,
            quantity: 0,
            valid: false,
        }
    }
}

/// Read a big-endian 6-byte timestamp, zero-extended into a `u64`.
#[inline]
fn read_be_u48(buf: &[u8]) -> u64 {
    let mut bytes = [0u8; 8];
    bytes[2..8].copy_from_slice(&buf[0..6]);
    u64::from_be_bytes(bytes)
}

#[inline]
fn read_be_u32(buf: &[u8]) -> u32 {
    u32::from_be_bytes(buf[0..4].try_into().unwrap())
}

#[inline]
fn read_be_u64(buf: &[u8]) -> u64 {
    u64::from_be_bytes(buf[0..8].try_into().unwrap())
}

pub struct Decoder {
    symbols: SymbolTable,
}

impl Decoder {
    pub fn new() -> Self {
        Self {
            symbols: SymbolTable::new(),
        }
    }

    /// Table-full is surfaced only at startup registration time; the hot
    /// decode path never sees this failure mode.
    pub fn register_symbol(
        &mut self,
        tag: [u8; 8],
        id: SymbolId,
    ) -> Result<(), crate::wire::symbol_table::SymbolTableFullError> {
        self.symbols.register_symbol(tag, id)
    }

    pub fn lookup_symbol(&self, tag: [u8; 8]) -> SymbolId {
        self.symbols.lookup_symbol(tag)
    }

    /// Decode one payload (type tag at offset 0). Never panics on short
    /// input; truncated or unrecognized payloads yield `valid = false`.
    pub fn decode(&self, data: &[u8], rdtsc_ts: u64) -> DecodedMessage {
        if data.is_empty() {
            return DecodedMessage::invalid(rdtsc_ts);
        }

        match data[0] {
            TAG_ADD_ORDER => self.decode_add_order(data, rdtsc_ts),
            TAG_ORDER_DELETE => self.decode_order_delete(data, rdtsc_ts),
            TAG_ORDER_REPLACE => self.decode_order_replace(data, rdtsc_ts),
            _ => DecodedMessage::invalid(rdtsc_ts),
        }
    }

    fn decode_add_order(&self, data: &[u8], rdtsc_ts: u64) -> DecodedMessage {
        if data.len() < ADD_ORDER_LEN {
            return DecodedMessage::invalid(rdtsc_ts);
        }
        // Offsets within `data`, after the 1-byte type tag.
        let ts = read_be_u48(&data[5..11]);
        let order_ref = read_be_u64(&data[11..19]);
        let side = match data[19] {
            b'B' => Some(Side::Buy),
            b'S' => Some(Side::Sell),
            _ => return DecodedMessage::invalid(rdtsc_ts),
        };
        let shares = read_be_u32(&data[20..24]);
        let stock: [u8; 8] = data[24..32].try_into().unwrap();
        let price_raw = read_be_u32(&data[32..36]);

        DecodedMessage {
            ev: EventKind::AddOrder,
            exchange_ts: ts,
            rdtsc_ts,
            order_id: order_ref,
            new_order_id: 0,
            symbol_id: self.lookup_symbol(stock),
            side,
            price: Price::new(price_raw as i64),
            quantity: shares,
            valid: true,
        }
    }

    fn decode_order_delete(&self, data: &[u8], rdtsc_ts: u64) -> DecodedMessage {
        if data.len() < ORDER_DELETE_LEN {
            return DecodedMessage::invalid(rdtsc_ts);
        }
        let ts = read_be_u48(&data[5..11]);
        let order_ref = read_be_u64(&data[11..19]);

        DecodedMessage {
            ev: EventKind::DeleteOrder,
            exchange_ts: ts,
            rdtsc_ts,
            order_id: order_ref,
            new_order_id: 0,
            symbol_id: crate::types::symbol::INVALID_SYMBOL,
            side: None,
            price: Price::ZERO,
            quantity: 0,
            valid: true,
        }
    }

    fn decode_order_replace(&self, data: &[u8], rdtsc_ts: u64) -> DecodedMessage {
        if data.len() < ORDER_REPLACE_LEN {
            return DecodedMessage::invalid(rdtsc_ts);
        }
        let ts = read_be_u48(&data[5..11]);
        let orig_ref = read_be_u64(&data[11..19]);
        let new_ref = read_be_u64(&data[19..27]);
        let shares = read_be_u32(&data[27..31]);
        let price_raw = read_be_u32(&data[31..35]);

        DecodedMessage {
            ev: EventKind::ReplaceOrder,
            exchange_ts: ts,
            rdtsc_ts,
            order_id: orig_ref,
            new_order_id: new_ref,
            symbol_id: crate::types::symbol::INVALID_SYMBOL,
            side: None,
            price: Price::new(price_raw as i64),
            quantity: shares,
            valid: true,
        }
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stock_tag(s: &str) -> [u8; 8] {
        let mut t = [b' '; 8];
        let bytes = s.as_bytes();
        t[..bytes.len()].copy_from_slice(bytes);
        t
    }

    fn encode_add_order(ts: u64, order_ref: u64, side: u8, shares: u32, stock: &str, price: u32) -> Vec<u8> {
        let mut buf = Vec::with_capacity(ADD_ORDER_LEN);
        buf.push(b'A');
        buf.extend_from_slice(&0u16.to_be_bytes()); // locate
        buf.extend_from_slice(&0u16.to_be_bytes()); // tracking
        buf.extend_from_slice(&ts.to_be_bytes()[2..8]); // 6-byte ts
        buf.extend_from_slice(&order_ref.to_be_bytes());
        buf.push(side);
        buf.extend_from_slice(&shares.to_be_bytes());
        buf.extend_from_slice(&stock_tag(stock));
        buf.extend_from_slice(&price.to_be_bytes());
        buf
    }

    #[test]
    fn decode_add_order_s4_scenario() {
        let mut decoder = Decoder::new();
        decoder.register_symbol(stock_tag("AAPL"), 1).unwrap();

        let buf = encode_add_order(123_456, 12345, b'B', 100, "AAPL", 1_500_000);
        assert_eq!(buf.len(), 38 - 2); // 38-byte record minus the 2-byte length prefix

        let msg = decoder.decode(&buf, 999);
        assert!(msg.valid);
        assert_eq!(msg.ev, EventKind::AddOrder);
        assert_eq!(msg.symbol_id, 1);
        assert_eq!(msg.side, Some(Side::Buy));
        assert_eq!(msg.price.raw(), 1_500_000);
        assert_eq!(msg.quantity, 100);
        assert_eq!(msg.order_id, 12345);
        assert_eq!(msg.rdtsc_ts, 999);
    }

    #[test]
    fn decode_unregistered_symbol_yields_invalid_symbol_id() {
        let decoder = Decoder::new();
        let buf = encode_add_order(1, 1, b'S', 10, "ZZZZ", 100);
        let msg = decoder.decode(&buf, 0);
        assert!(msg.valid);
        assert_eq!(msg.symbol_id, crate::types::symbol::INVALID_SYMBOL);
    }

    #[test]
    fn decode_truncated_add_order_is_invalid_not_a_panic() {
        let decoder = Decoder::new();
        let buf = encode_add_order(1, 1, b'B', 10, "AAPL", 100);
        for len in 0..ADD_ORDER_LEN {
            let msg = decoder.decode(&buf[..len], 0);
            assert!(!msg.valid);
        }
    }

    #[test]
    fn decode_unknown_type_tag_is_invalid() {
        let decoder = Decoder::new();
        let buf = vec![b'Z'; 64];
        let msg = decoder.decode(&buf, 0);
        assert!(!msg.valid);
        assert_eq!(msg.ev, EventKind::Unknown);
    }

    #[test]
    fn decode_order_delete() {
        let decoder = Decoder::new();
        let mut buf = vec![b'D'];
        buf.extend_from_slice(&0u16.to_be_bytes());
        buf.extend_from_slice(&0u16.to_be_bytes());
        buf.extend_from_slice(&42u64.to_be_bytes()[2..8]);
        buf.extend_from_slice(&777u64.to_be_bytes());

        let msg = decoder.decode(&buf, 5);
        assert!(msg.valid);
        assert_eq!(msg.ev, EventKind::DeleteOrder);
        assert_eq!(msg.order_id, 777);
    }

    #[test]
    fn decode_order_replace() {
        let decoder = Decoder::new();
        let mut buf = vec![b'U'];
        buf.extend_from_slice(&0u16.to_be_bytes());
        buf.extend_from_slice(&0u16.to_be_bytes());
        buf.extend_from_slice(&42u64.to_be_bytes()[2..8]);
        buf.extend_from_slice(&100u64.to_be_bytes());
        buf.extend_from_slice(&200u64.to_be_bytes());
        buf.extend_from_slice(&50u32.to_be_bytes());
        buf.extend_from_slice(&250_000u32.to_be_bytes());

        let msg = decoder.decode(&buf, 5);
        assert!(msg.valid);
        assert_eq!(msg.ev, EventKind::ReplaceOrder);
        assert_eq!(msg.order_id, 100);
        assert_eq!(msg.new_order_id, 200);
        assert_eq!(msg.quantity, 50);
        assert_eq!(msg.price.raw(), 250_000);
    }
}
