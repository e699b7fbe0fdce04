//! Configuration module for the signal engine.

pub mod engine;
pub mod error;
pub mod markets;
pub mod signal;

mod debug; // Private: use crate::config::DEBUG_FLAGS, not crate::config::debug::DEBUG_FLAGS
pub use debug::DEBUG_FLAGS;

// Re-export commonly used items
pub use engine::{EngineConfig, MIN_ENTRY_CANDLES, MIN_HTF_CANDLES};
pub use error::ConfigError;
pub use markets::{MarketConfigs, SignalOverrides};
pub use signal::{PatternToggles, PatternWeights, SIGNAL_DEFAULTS, SignalConfig};
