// Candle storage and validation
pub mod candle_cache;
pub mod validation;

// Re-export commonly used types
pub use candle_cache::{CacheUpdate, CandleCache};
pub use validation::{CandleError, validate_candle, validate_candles};
