use serde::{Deserialize, Serialize};

/// Colour of a candle. A candle whose close equals its open is `Flat`, which
/// counts as neither bullish nor bearish in the pattern library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandleType {
    Bullish,
    Bearish,
    Flat,
}

/// One closed OHLCV bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    #[serde(alias = "openTime")]
    pub open_time: i64,
    #[serde(alias = "closeTime")]
    pub close_time: i64,
    #[serde(alias = "open")]
    pub open_price: f64,
    #[serde(alias = "high")]
    pub high_price: f64,
    #[serde(alias = "low")]
    pub low_price: f64,
    #[serde(alias = "close")]
    pub close_price: f64,
    #[serde(alias = "volume")]
    pub base_volume: f64,
}

impl Candle {
    pub fn new(
        open_time: i64,
        close_time: i64,
        open_price: f64,
        high_price: f64,
        low_price: f64,
        close_price: f64,
        base_volume: f64,
    ) -> Self {
        Candle {
            open_time,
            close_time,
            open_price,
            high_price,
            low_price,
            close_price,
            base_volume,
        }
    }

    pub fn get_type(&self) -> CandleType {
        if self.close_price > self.open_price {
            CandleType::Bullish
        } else if self.close_price < self.open_price {
            CandleType::Bearish
        } else {
            CandleType::Flat
        }
    }

    pub fn is_bullish(&self) -> bool {
        self.get_type() == CandleType::Bullish
    }

    pub fn is_bearish(&self) -> bool {
        self.get_type() == CandleType::Bearish
    }

    /// Absolute size of the body.
    pub fn body(&self) -> f64 {
        (self.close_price - self.open_price).abs()
    }

    /// High minus low. Zero for a degenerate bar.
    pub fn range(&self) -> f64 {
        self.high_price - self.low_price
    }

    // Returns the low and high of the candle body as a tuple
    pub fn body_range(&self) -> (f64, f64) {
        (
            self.open_price.min(self.close_price),
            self.open_price.max(self.close_price),
        )
    }

    pub fn upper_wick(&self) -> f64 {
        self.high_price - self.body_range().1
    }

    pub fn lower_wick(&self) -> f64 {
        self.body_range().0 - self.low_price
    }

    /// Midpoint between open and close.
    pub fn body_midpoint(&self) -> f64 {
        (self.open_price + self.close_price) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wicks_and_body() {
        let c = Candle::new(0, 1, 100.0, 102.0, 95.0, 101.0, 10.0);
        assert_eq!(c.get_type(), CandleType::Bullish);
        assert!((c.body() - 1.0).abs() < 1e-9);
        assert!((c.range() - 7.0).abs() < 1e-9);
        assert!((c.upper_wick() - 1.0).abs() < 1e-9);
        assert!((c.lower_wick() - 5.0).abs() < 1e-9);
        assert_eq!(c.body_range(), (100.0, 101.0));
    }

    #[test]
    fn test_flat_candle_is_neither_colour() {
        let c = Candle::new(0, 1, 100.0, 101.0, 99.0, 100.0, 10.0);
        assert!(!c.is_bullish());
        assert!(!c.is_bearish());
    }

    #[test]
    fn test_deserialize_short_field_names() {
        let json = r#"{"openTime":0,"closeTime":59999,"open":1.0,"high":2.0,"low":0.5,"close":1.5,"volume":3.0}"#;
        let c: Candle = serde_json::from_str(json).unwrap();
        assert_eq!(c.close_time, 59_999);
        assert!((c.base_volume - 3.0).abs() < 1e-9);
    }
}
