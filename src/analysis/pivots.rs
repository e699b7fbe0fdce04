//! Swing-point detection over a symmetric window.
//!
//! A candle is a pivot high when its high is strictly greater than every other
//! high within `window` candles on each side. Equal neighbours disqualify it,
//! so flat double tops never produce pivots.

use serde::Serialize;

use crate::domain::Candle;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Pivot {
    pub index: usize,
    pub price: f64,
}

#[derive(Clone, Copy)]
enum Extreme {
    High,
    Low,
}

impl Extreme {
    fn price(self, candle: &Candle) -> f64 {
        match self {
            Extreme::High => candle.high_price,
            Extreme::Low => candle.low_price,
        }
    }

    /// True when `candidate` strictly beats `other`.
    fn beats(self, candidate: f64, other: f64) -> bool {
        match self {
            Extreme::High => candidate > other,
            Extreme::Low => candidate < other,
        }
    }
}

fn detect_pivots(candles: &[Candle], window: usize, extreme: Extreme) -> Vec<Pivot> {
    let n = candles.len();
    if window == 0 || n < 2 * window + 1 {
        return Vec::new();
    }

    (window..n - window)
        .filter_map(|i| {
            let price = extreme.price(&candles[i]);
            let is_pivot = candles[i - window..=i + window]
                .iter()
                .enumerate()
                .all(|(offset, other)| {
                    offset == window || extreme.beats(price, extreme.price(other))
                });
            is_pivot.then_some(Pivot { index: i, price })
        })
        .collect()
}

pub fn detect_pivot_highs(candles: &[Candle], window: usize) -> Vec<Pivot> {
    detect_pivots(candles, window, Extreme::High)
}

pub fn detect_pivot_lows(candles: &[Candle], window: usize) -> Vec<Pivot> {
    detect_pivots(candles, window, Extreme::Low)
}

fn last_n(mut pivots: Vec<Pivot>, count: usize) -> Vec<Pivot> {
    let skip = pivots.len().saturating_sub(count);
    pivots.drain(..skip);
    pivots
}

/// The most recent `count` pivot highs, oldest first.
pub fn recent_pivot_highs(candles: &[Candle], window: usize, count: usize) -> Vec<Pivot> {
    last_n(detect_pivot_highs(candles, window), count)
}

/// The most recent `count` pivot lows, oldest first.
pub fn recent_pivot_lows(candles: &[Candle], window: usize, count: usize) -> Vec<Pivot> {
    last_n(detect_pivot_lows(candles, window), count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{candles_from_closes, ohlc_series};
    use proptest::prelude::*;

    #[test]
    fn test_single_peak_and_trough() {
        // bodies span the midpoint of consecutive closes, wicks 0.5 beyond
        let candles = candles_from_closes(&[10.0, 11.0, 12.0, 15.0, 12.0, 11.0, 10.0, 8.0, 6.0, 8.0, 10.0]);
        let highs = detect_pivot_highs(&candles, 2);
        let lows = detect_pivot_lows(&candles, 2);
        assert_eq!(highs.iter().map(|p| p.index).collect::<Vec<_>>(), vec![3]);
        assert!((highs[0].price - 15.5).abs() < 1e-9);
        assert!((lows[0].price - 5.5).abs() < 1e-9);
        assert_eq!(lows.iter().map(|p| p.index).collect::<Vec<_>>(), vec![8]);
    }

    #[test]
    fn test_flat_double_top_is_not_a_pivot() {
        let candles = ohlc_series(&[
            (10.0, 11.0, 9.0, 10.0),
            (10.0, 12.0, 9.0, 11.0),
            (11.0, 15.0, 10.0, 12.0),
            (12.0, 15.0, 10.0, 11.0),
            (11.0, 12.0, 9.0, 10.0),
            (10.0, 11.0, 9.0, 10.0),
        ]);
        assert!(detect_pivot_highs(&candles, 2).is_empty());
    }

    #[test]
    fn test_recent_pivots_keep_latest() {
        let closes: Vec<f64> = (0..60)
            .map(|i| 100.0 + if i % 10 == 5 { 5.0 } else { 0.0 } + (i % 10) as f64 * 0.01)
            .collect();
        let candles = candles_from_closes(&closes);
        let all = detect_pivot_highs(&candles, 3);
        let recent = recent_pivot_highs(&candles, 3, 2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[..], all[all.len() - 2..]);
    }

    proptest! {
        #[test]
        fn short_sequences_have_no_pivots(
            closes in prop::collection::vec(1.0..1000.0_f64, 0..11),
        ) {
            let candles = candles_from_closes(&closes);
            prop_assert!(detect_pivot_highs(&candles, 5).is_empty());
            prop_assert!(detect_pivot_lows(&candles, 5).is_empty());
        }

        #[test]
        fn pivots_stay_clear_of_boundaries(
            closes in prop::collection::vec(1.0..1000.0_f64, 0..80),
            window in 1usize..6,
        ) {
            let candles = candles_from_closes(&closes);
            let n = candles.len();
            for p in detect_pivot_highs(&candles, window)
                .into_iter()
                .chain(detect_pivot_lows(&candles, window))
            {
                prop_assert!(p.index >= window);
                prop_assert!(p.index + window < n);
            }
        }
    }
}
