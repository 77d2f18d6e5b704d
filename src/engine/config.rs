// Environment-driven process configuration, assembled once at startup and
// never consulted on the hot path.

use std::path::PathBuf;

use crate::risk::RiskLimits;

use super::error::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Live,
    Sim,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub mode: RunMode,
    pub log_format: LogFormat,
    /// If set, the hardware register block mmaps this file instead of an
    /// anonymous region, so its state can be inspected between runs.
    pub hw_register_file: Option<PathBuf>,
    pub risk_limits: RiskLimits,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mode: RunMode::Sim,
            log_format: LogFormat::Text,
            hw_register_file: None,
            risk_limits: RiskLimits::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Result<Self, EngineError> {
        let mode = match std::env::var("NEXUS_MODE").as_deref() {
            Ok("live") => RunMode::Live,
            Ok("sim") | Err(_) => RunMode::Sim,
            Ok(other) => return Err(EngineError::Configuration(format!("invalid NEXUS_MODE: {other}"))),
        };

        let log_format = match std::env::var("NEXUS_LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            Ok("text") | Err(_) => LogFormat::Text,
            Ok(other) => return Err(EngineError::Configuration(format!("invalid NEXUS_LOG_FORMAT: {other}"))),
        };

        let hw_register_file = match std::env::var("NEXUS_HW_REGISTER_FILE") {
            Ok(path) => {
                let path = PathBuf::from(path);
                if !path.exists() {
                    return Err(EngineError::Configuration(format!(
                        "NEXUS_HW_REGISTER_FILE does not exist: {}",
                        path.display()
                    )));
                }
                Some(path)
            }
            Err(_) => None,
        };

        let risk_limits = RiskLimits {
            max_order_size: env_or("NEXUS_MAX_ORDER_SIZE", RiskLimits::default().max_order_size)?,
            max_position_shares: env_or("NEXUS_MAX_POSITION_SHARES", RiskLimits::default().max_position_shares)?,
            max_notional: env_or("NEXUS_MAX_NOTIONAL", RiskLimits::default().max_notional)?,
        };

        Ok(Self { mode, log_format, hw_register_file, risk_limits })
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T, EngineError> {
    match std::env::var(key) {
        Ok(v) => v.parse().map_err(|_| EngineError::Configuration(format!("invalid {key}"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_sim_text() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.mode, RunMode::Sim);
        assert_eq!(cfg.log_format, LogFormat::Text);
        assert!(cfg.hw_register_file.is_none());
    }

    #[test]
    fn default_risk_limits_match_s5_scenario() {
        let limits = RiskLimits::default();
        assert_eq!(limits.max_order_size, 1_000);
        assert_eq!(limits.max_position_shares, 10_000);
        assert_eq!(limits.max_notional, 1_000_000);
    }
}
