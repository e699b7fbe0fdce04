//! Candle integrity checks run before candles reach the cache.

use thiserror::Error;

use crate::domain::Candle;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CandleError {
    #[error("Invalid {field}: {value}")]
    NonFinite { field: &'static str, value: f64 },
    #[error("Negative volume: {0}")]
    NegativeVolume(f64),
    #[error("High ({high}) < max(open={open}, close={close})")]
    HighBelowBody { high: f64, open: f64, close: f64 },
    #[error("Low ({low}) > min(open={open}, close={close})")]
    LowAboveBody { low: f64, open: f64, close: f64 },
    #[error("High ({high}) < low ({low})")]
    HighBelowLow { high: f64, low: f64 },
}

pub fn validate_candle(candle: &Candle) -> Result<(), CandleError> {
    let Candle {
        open_price: open,
        high_price: high,
        low_price: low,
        close_price: close,
        base_volume: volume,
        ..
    } = *candle;

    for (field, value) in [
        ("open", open),
        ("high", high),
        ("low", low),
        ("close", close),
        ("volume", volume),
    ] {
        if !value.is_finite() {
            return Err(CandleError::NonFinite { field, value });
        }
    }
    if volume < 0.0 {
        return Err(CandleError::NegativeVolume(volume));
    }
    if high < open.max(close) {
        return Err(CandleError::HighBelowBody { high, open, close });
    }
    if low > open.min(close) {
        return Err(CandleError::LowAboveBody { low, open, close });
    }
    if high < low {
        return Err(CandleError::HighBelowLow { high, low });
    }
    Ok(())
}

/// Split into valid candles and `(index, reason)` for the rest.
pub fn validate_candles(candles: &[Candle]) -> (Vec<Candle>, Vec<(usize, CandleError)>) {
    let mut valid = Vec::with_capacity(candles.len());
    let mut rejected = Vec::new();
    for (i, candle) in candles.iter().enumerate() {
        match validate_candle(candle) {
            Ok(()) => valid.push(*candle),
            Err(e) => {
                log::warn!("Candle {} rejected: {}", i, e);
                rejected.push((i, e));
            }
        }
    }
    (valid, rejected)
}
