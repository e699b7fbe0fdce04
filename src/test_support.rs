//! Candle fixtures shared by unit tests.

use crate::domain::Candle;
use crate::utils::TimeUtils;

const H: i64 = TimeUtils::MS_IN_H;

fn at(index: usize, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Candle {
    let open_time = index as i64 * H;
    Candle::new(open_time, open_time + H - 1, open, high, low, close, volume)
}

/// Hourly candles from `(open, high, low, close)` tuples, volume 1000.
pub fn ohlc_series(rows: &[(f64, f64, f64, f64)]) -> Vec<Candle> {
    rows.iter()
        .enumerate()
        .map(|(i, &(o, h, l, c))| at(i, o, h, l, c, 1000.0))
        .collect()
}

/// Hourly candles from `(open, high, low, close, volume)` tuples.
pub fn ohlcv_series(rows: &[(f64, f64, f64, f64, f64)]) -> Vec<Candle> {
    rows.iter()
        .enumerate()
        .map(|(i, &(o, h, l, c, v))| at(i, o, h, l, c, v))
        .collect()
}

/// Opens at the midpoint of the previous and current close, wicks 0.5 beyond
/// the body. Peaks and troughs of `closes` become strict pivots.
pub fn candles_from_closes(closes: &[f64]) -> Vec<Candle> {
    let mut prev = closes.first().copied().unwrap_or(0.0);
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = (prev + close) / 2.0;
            prev = close;
            at(
                i,
                open,
                open.max(close) + 0.5,
                open.min(close) - 0.5,
                close,
                1000.0,
            )
        })
        .collect()
}

/// Triangle wave between `base` and `base + amplitude`, troughs at multiples of `period`.
pub fn zigzag_closes(n: usize, base: f64, amplitude: f64, period: usize) -> Vec<f64> {
    trending_closes(n, base, 0.0, amplitude, period)
}

/// Triangle wave riding a linear drift of `step` per candle.
pub fn trending_closes(n: usize, base: f64, step: f64, amplitude: f64, period: usize) -> Vec<f64> {
    let half = period as f64 / 2.0;
    (0..n)
        .map(|i| {
            let phase = (i % period) as f64;
            let tri = if phase <= half { phase } else { period as f64 - phase };
            base + step * i as f64 + amplitude * tri / half
        })
        .collect()
}

/// Append a candle timed one hour after the last one.
pub fn push_candle(candles: &mut Vec<Candle>, o: f64, h: f64, l: f64, c: f64, v: f64) {
    let index = candles.len();
    candles.push(at(index, o, h, l, c, v));
}
