// Binary market-data wire format: decoder and symbol tag lookup.

pub mod decoder;
pub mod symbol_table;

pub use decoder::{DecodedMessage, Decoder, EventKind};
pub use symbol_table::SymbolTable;
