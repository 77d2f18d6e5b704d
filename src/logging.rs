// Structured logging setup. Called once at process startup, never on the
// hot path — the pipeline threads only ever call the `tracing` macros.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::engine::config::LogFormat;

/// Install the global `tracing` subscriber. `RUST_LOG` controls verbosity
/// per the usual `EnvFilter` syntax (e.g. `nexus_core=debug,warn`),
/// defaulting to `INFO` when unset.
pub fn init_logging(format: LogFormat) {
    let filter = tracing_subscriber::filter::EnvFilter::builder()
        .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
        .from_env_lossy();

    match format {
        LogFormat::Text => {
            tracing_subscriber::registry().with(filter).with(tracing_subscriber::fmt::layer()).init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().flatten_event(true))
                .init();
        }
    }
}
