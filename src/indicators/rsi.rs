//! Wilder RSI and price/RSI divergence at swing pivots.

use serde::Serialize;

use crate::analysis::pivots::Pivot;
use crate::domain::{Candle, Direction};

/// RS used when the average loss is zero (no down moves).
const RS_WHEN_NO_LOSS: f64 = 100.0;

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    let rs = if avg_loss == 0.0 {
        RS_WHEN_NO_LOSS
    } else {
        avg_gain / avg_loss
    };
    100.0 - 100.0 / (1.0 + rs)
}

/// RSI aligned to candle indices: `None` before index `period`.
pub fn rsi_series(candles: &[Candle], period: usize) -> Vec<Option<f64>> {
    let n = candles.len();
    let mut out = vec![None; n];
    if period == 0 || n < period + 1 {
        return out;
    }

    let change = |i: usize| candles[i].close_price - candles[i - 1].close_price;

    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    for i in 1..=period {
        let delta = change(i);
        if delta > 0.0 {
            avg_gain += delta;
        } else {
            avg_loss -= delta;
        }
    }
    avg_gain /= period as f64;
    avg_loss /= period as f64;
    out[period] = Some(rsi_from_averages(avg_gain, avg_loss));

    let p = period as f64;
    for (i, slot) in out.iter_mut().enumerate().skip(period + 1) {
        let delta = change(i);
        avg_gain = (avg_gain * (p - 1.0) + delta.max(0.0)) / p;
        avg_loss = (avg_loss * (p - 1.0) + (-delta).max(0.0)) / p;
        *slot = Some(rsi_from_averages(avg_gain, avg_loss));
    }
    out
}

/// Latest RSI value.
pub fn calculate_rsi(candles: &[Candle], period: usize) -> Option<f64> {
    rsi_series(candles, period).last().copied().flatten()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Divergence {
    pub bullish: bool,
    pub bearish: bool,
    pub description: Option<String>,
}

impl Divergence {
    /// Bullish wins when both fire.
    pub fn direction(&self) -> Option<Direction> {
        if self.bullish {
            Some(Direction::Bullish)
        } else if self.bearish {
            Some(Direction::Bearish)
        } else {
            None
        }
    }
}

/// Compare the last two pivot highs (bearish: price higher high, RSI lower high)
/// and the last two pivot lows (bullish: price lower low, RSI higher low).
pub fn detect_rsi_divergence(
    candles: &[Candle],
    pivot_highs: &[Pivot],
    pivot_lows: &[Pivot],
    period: usize,
) -> Divergence {
    let rsi = rsi_series(candles, period);
    let rsi_at = |p: &Pivot| rsi.get(p.index).copied().flatten();

    let mut divergence = Divergence::default();
    let mut notes = Vec::new();

    if let [.., h1, h2] = pivot_highs {
        if let (Some(r1), Some(r2)) = (rsi_at(h1), rsi_at(h2)) {
            if h2.price > h1.price && r2 < r1 {
                divergence.bearish = true;
                notes.push(format!(
                    "Bearish divergence: price HH {:.4} > {:.4}, RSI LH {:.1} < {:.1}",
                    h2.price, h1.price, r2, r1
                ));
            }
        }
    }
    if let [.., l1, l2] = pivot_lows {
        if let (Some(r1), Some(r2)) = (rsi_at(l1), rsi_at(l2)) {
            if l2.price < l1.price && r2 > r1 {
                divergence.bullish = true;
                notes.push(format!(
                    "Bullish divergence: price LL {:.4} < {:.4}, RSI HL {:.1} > {:.1}",
                    l2.price, l1.price, r2, r1
                ));
            }
        }
    }

    if !notes.is_empty() {
        divergence.description = Some(notes.join("; "));
    }
    divergence
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::candles_from_closes;

    #[test]
    fn test_rsi_bounds_and_extremes() {
        let rising: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let rsi = calculate_rsi(&candles_from_closes(&rising), 14).unwrap();
        assert!((rsi - (100.0 - 100.0 / 101.0)).abs() < 1e-9);

        let falling: Vec<f64> = (0..30).map(|i| 100.0 - i as f64).collect();
        let rsi = calculate_rsi(&candles_from_closes(&falling), 14).unwrap();
        assert!(rsi.abs() < 1e-9);
    }

    #[test]
    fn test_rsi_series_alignment() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + (i % 3) as f64).collect();
        let series = rsi_series(&candles_from_closes(&closes), 14);
        assert_eq!(series.len(), 20);
        assert!(series[13].is_none());
        assert!(series[14].is_some());
        assert!(series.iter().flatten().all(|v| (0.0..=100.0).contains(v)));
    }

    #[test]
    fn test_bearish_divergence_on_weakening_push() {
        // strong rally to the first peak, slow grind to a marginally higher second peak
        let mut closes: Vec<f64> = (0..20).map(|i| 100.0 + i as f64 * 2.0).collect();
        closes.extend((0..6).map(|i| 138.0 - i as f64 * 2.0));
        closes.extend((0..12).map(|i| 128.0 + i as f64 * 1.0));
        closes.extend((0..6).map(|i| 139.0 - i as f64 * 3.0));
        let candles = candles_from_closes(&closes);

        let highs = [
            Pivot { index: 19, price: candles[19].high_price },
            Pivot { index: 37, price: candles[37].high_price },
        ];
        assert!(highs[1].price > highs[0].price);
        let div = detect_rsi_divergence(&candles, &highs, &[], 14);
        assert!(div.bearish);
        assert_eq!(div.direction(), Some(Direction::Bearish));
        assert!(div.description.unwrap().starts_with("Bearish"));
    }

    #[test]
    fn test_no_divergence_without_pivots() {
        let candles = candles_from_closes(&[100.0; 30]);
        let div = detect_rsi_divergence(&candles, &[], &[], 14);
        assert_eq!(div, Divergence::default());
        assert_eq!(div.direction(), None);
    }
}
