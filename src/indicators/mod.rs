//! Numeric context indicators consumed by the scorer and the bypass rules.

pub mod atr;
pub mod rsi;
pub mod volume;

pub use atr::{AtrSpike, calculate_atr, detect_atr_spike};
pub use rsi::{Divergence, calculate_rsi, detect_rsi_divergence};
pub use volume::{calculate_average_volume, has_volume_spark, volume_ratio};
