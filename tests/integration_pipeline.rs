// End-to-end test: a real `Engine` wired to the in-process simulated
// market-data source for a bounded window, asserting messages flow all the
// way from decode through strategy to the execution feedback queue.

use std::time::Duration;

use nexus_core::{Engine, EngineConfig, EngineState, Price, SymbolInfo, SymbolUniverse};

fn universe_with_one_symbol() -> SymbolUniverse {
    let mut universe = SymbolUniverse::new();
    universe.add_symbol(SymbolInfo {
        id: 1,
        name: "AAPL".to_string(),
        lot_size: 1,
        tick_size: Price::new(100),
        maker_fee: 0.0,
        taker_fee: 0.0,
        use_hw_execution: false,
    });
    universe
}

#[test]
fn synthetic_ticks_flow_from_market_data_to_execution_feedback() {
    let mut engine = Engine::new(EngineConfig::default(), universe_with_one_symbol()).unwrap();
    assert_eq!(engine.state(), EngineState::Created);

    engine.run().unwrap();
    assert_eq!(engine.state(), EngineState::Running);

    // The simulated source ticks every 200ms; wait long enough for several
    // AddOrder messages to cross both sides of the book and for the
    // resulting quotes to round-trip through risk, the gateway, and back.
    std::thread::sleep(Duration::from_millis(1200));

    engine.stop();
    assert_eq!(engine.state(), EngineState::Stopped);

    assert!(engine.md_messages_processed() > 0, "strategy thread should have consumed market data");
    assert!(engine.exec_reports_processed() > 0, "execution reports should flow back to the strategy thread");
}

#[test]
fn engine_construction_fails_without_any_registered_symbols() {
    let mut engine = Engine::new(EngineConfig::default(), SymbolUniverse::new()).unwrap();
    assert!(engine.run().is_err());
}
