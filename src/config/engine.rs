//! Orchestration settings: which timeframes trigger entries and which feed the
//! higher-timeframe bias.

use serde::{Deserialize, Serialize};

use super::error::ConfigError;
use super::signal::SignalConfig;
use crate::utils::TimeUtils;

/// Minimum history before an entry timeframe is analysed at all.
pub const MIN_ENTRY_CANDLES: usize = 100;

/// Minimum history for a higher timeframe to contribute to the bias.
pub const MIN_HTF_CANDLES: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub entry_timeframes: Vec<String>,
    pub htf_timeframes: Vec<String>,
    pub min_entry_candles: usize,
    pub min_htf_candles: usize,
    /// Log every rejection reason at info level.
    pub diagnostic_mode: bool,
    pub signal: SignalConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            entry_timeframes: vec!["1h".to_string(), "4h".to_string()],
            htf_timeframes: vec!["1h".to_string(), "4h".to_string()],
            min_entry_candles: MIN_ENTRY_CANDLES,
            min_htf_candles: MIN_HTF_CANDLES,
            diagnostic_mode: false,
            signal: SignalConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.entry_timeframes.is_empty() {
            return Err(ConfigError::NoEntryTimeframes);
        }
        for tf in self.entry_timeframes.iter().chain(&self.htf_timeframes) {
            if TimeUtils::interval_from_str(tf).is_none() {
                return Err(ConfigError::UnknownTimeframe(tf.clone()));
            }
        }
        self.signal.validate()
    }

    pub fn is_entry_timeframe(&self, timeframe: &str) -> bool {
        self.entry_timeframes.iter().any(|tf| tf == timeframe)
    }
}
