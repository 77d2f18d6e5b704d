// Tradable symbol registry.
//
// The original design used a global singleton (`SymbolUniverse::instance()`).
// Per the redesign, we pass an explicit `SymbolUniverse` handle to whatever
// needs symbol metadata instead of reaching for global mutable state.

use std::collections::HashMap;

use super::fixed_point::Price;

pub type SymbolId = u32;

pub const INVALID_SYMBOL: SymbolId = SymbolId::MAX;

/// Static metadata for one tradable instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolInfo {
    pub id: SymbolId,
    pub name: String,
    pub lot_size: u32,
    pub tick_size: Price,
    pub maker_fee: f64,
    pub taker_fee: f64,
    /// Routing flag: true if the strategy for this symbol executes through
    /// the hardware (mmap'd register) path rather than the CPU gateway.
    pub use_hw_execution: bool,
}

/// Registry of all tradable symbols, addressable by id or name.
///
/// Owned by the engine and handed by reference to whichever components
/// (decoder, router) need to resolve symbol metadata. Not a singleton.
#[derive(Debug, Default, Clone)]
pub struct SymbolUniverse {
    symbols: Vec<Option<SymbolInfo>>,
    name_to_id: HashMap<String, SymbolId>,
}

impl SymbolUniverse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_symbol(&mut self, info: SymbolInfo) {
        let idx = info.id as usize;
        if idx >= self.symbols.len() {
            self.symbols.resize(idx + 1, None);
        }
        self.name_to_id.insert(info.name.clone(), info.id);
        self.symbols[idx] = Some(info);
    }

    pub fn get_symbol(&self, id: SymbolId) -> Option<&SymbolInfo> {
        self.symbols.get(id as usize).and_then(|s| s.as_ref())
    }

    pub fn get_id(&self, name: &str) -> SymbolId {
        self.name_to_id.get(name).copied().unwrap_or(INVALID_SYMBOL)
    }

    /// First registered symbol in id order, if any. Used by the engine to
    /// pick a default instrument to trade when none is specified explicitly.
    pub fn first(&self) -> Option<&SymbolInfo> {
        self.symbols.iter().flatten().next()
    }

    pub fn len(&self) -> usize {
        self.name_to_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.name_to_id.is_empty()
    }
}
