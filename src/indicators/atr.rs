//! Average True Range and volatility-spike detection.
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|).
//! ATR here is the plain mean of the last `period` true ranges, so it needs
//! `period + 1` candles.

use serde::Serialize;

use crate::domain::Candle;
use crate::utils::maths_utils::{mean, safe_ratio};

/// Number of trailing ATR values averaged for the spike baseline.
const SPIKE_BASELINE_LEN: usize = 20;

fn true_range(cur: &Candle, prev: &Candle) -> f64 {
    let h = cur.high_price;
    let l = cur.low_price;
    let pc = prev.close_price;
    (h - l).max((h - pc).abs()).max((l - pc).abs())
}

/// ATR of the trailing `period` candles, `None` with too little history.
pub fn calculate_atr(candles: &[Candle], period: usize) -> Option<f64> {
    if period == 0 || candles.len() < period + 1 {
        return None;
    }
    let tail = &candles[candles.len() - period - 1..];
    let ranges: Vec<f64> = tail.windows(2).map(|w| true_range(&w[1], &w[0])).collect();
    Some(mean(&ranges))
}

/// ATR evaluated at every index from `period` onward.
pub fn atr_series(candles: &[Candle], period: usize) -> Vec<f64> {
    if period == 0 {
        return Vec::new();
    }
    (period..candles.len())
        .filter_map(|end| calculate_atr(&candles[..=end], period))
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AtrSpike {
    pub has_spike: bool,
    pub current_atr: Option<f64>,
    pub average_atr: Option<f64>,
    pub ratio: f64,
}

/// Current ATR against the mean of the last 20 ATR values. Needs
/// `2 * period + 1` candles, otherwise reports no spike.
pub fn detect_atr_spike(candles: &[Candle], period: usize, threshold: f64) -> AtrSpike {
    if period == 0 || candles.len() < 2 * period + 1 {
        return AtrSpike::default();
    }
    let series = atr_series(candles, period);
    let Some(&current) = series.last() else {
        return AtrSpike::default();
    };
    let baseline = &series[series.len().saturating_sub(SPIKE_BASELINE_LEN)..];
    let average = mean(baseline);
    let ratio = safe_ratio(current, average, 0.0);

    AtrSpike {
        has_spike: ratio >= threshold,
        current_atr: Some(current),
        average_atr: Some(average),
        ratio,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ohlc_series, push_candle};

    fn steady(n: usize) -> Vec<Candle> {
        ohlc_series(&vec![(100.0, 101.0, 99.0, 100.0); n])
    }

    #[test]
    fn test_atr_of_steady_series() {
        let candles = steady(20);
        assert!((calculate_atr(&candles, 14).unwrap() - 2.0).abs() < 1e-12);
        assert!(calculate_atr(&candles[..14], 14).is_none());
        assert_eq!(atr_series(&candles, 14).len(), 6);
    }

    #[test]
    fn test_true_range_uses_gap_from_previous_close() {
        let candles = ohlc_series(&[(100.0, 101.0, 99.0, 100.0), (104.0, 105.0, 103.0, 104.5)]);
        assert!((calculate_atr(&candles, 1).unwrap() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_spike_detection() {
        let mut candles = steady(40);
        assert!(!detect_atr_spike(&candles, 14, 1.5).has_spike);

        // one 30-point bar lifts the 14-bar mean from 2 to 4
        push_candle(&mut candles, 100.0, 115.0, 85.0, 100.0, 1000.0);
        let spike = detect_atr_spike(&candles, 14, 1.5);
        assert!(spike.has_spike, "ratio {}", spike.ratio);
        assert!((spike.current_atr.unwrap() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_spike_needs_history() {
        let candles = steady(28);
        assert_eq!(detect_atr_spike(&candles, 14, 1.5), AtrSpike::default());
    }
}
