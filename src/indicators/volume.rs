use crate::domain::Candle;
use crate::utils::maths_utils::{mean, safe_ratio};

/// Mean base volume of the last `min(n, period)` candles, current included.
pub fn calculate_average_volume(candles: &[Candle], period: usize) -> f64 {
    let start = candles.len().saturating_sub(period);
    let volumes: Vec<f64> = candles[start..].iter().map(|c| c.base_volume).collect();
    mean(&volumes)
}

/// Latest volume over the trailing average. 1.0 when there is no baseline.
pub fn volume_ratio(candles: &[Candle], period: usize) -> f64 {
    let Some(last) = candles.last() else {
        return 1.0;
    };
    safe_ratio(last.base_volume, calculate_average_volume(candles, period), 1.0)
}

pub fn has_volume_spark(volume: f64, average: f64, threshold: f64) -> bool {
    volume > average * threshold
}
