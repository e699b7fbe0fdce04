// Domain types and value objects
pub mod candle;
pub mod direction;
pub mod pair_interval;

// Re-export commonly used types
pub use candle::{Candle, CandleType};
pub use direction::{Direction, Side};
pub use pair_interval::PairInterval;
