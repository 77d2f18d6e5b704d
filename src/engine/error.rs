// Startup-only error taxonomy, returned from `Engine::run`. Decode failures
// and risk rejections on the hot path stay sentinel/counter-based and never
// surface here.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("failed to open hardware register file: {0}")]
    HardwareRegisterOpen(#[from] std::io::Error),

    #[error("symbol table is full")]
    SymbolTableFull,
}
