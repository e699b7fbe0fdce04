use serde::{Deserialize, Serialize};

use crate::utils::TimeUtils;

/// Identity of one candle series: instrument plus timeframe.
#[derive(Serialize, Deserialize, Debug, Clone, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub struct PairInterval {
    pub name: String,
    pub interval_ms: i64,
}

impl PairInterval {
    pub fn new(name: impl Into<String>, interval_ms: i64) -> Self {
        Self {
            name: name.into(),
            interval_ms,
        }
    }

    /// Build from a shorthand timeframe such as `4h`.
    pub fn from_timeframe(name: impl Into<String>, timeframe: &str) -> Option<Self> {
        let interval_ms = TimeUtils::interval_from_str(timeframe)?;
        Some(Self::new(name, interval_ms))
    }

    // Finds the trading quote at the end of the pair name and returns it.
    pub fn get_quote(text: &str) -> Option<&str> {
        static PAIR_QUOTES: &[&str] = &["USDT", "USDC", "FDUSD", "BTC", "ETH"];
        PAIR_QUOTES
            .iter()
            .find(|&&ext| text.ends_with(ext))
            .copied()
    }

    pub fn get_base(text: &str) -> Option<&str> {
        let quote = Self::get_quote(text)?;
        text.strip_suffix(quote)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn timeframe(&self) -> &'static str {
        TimeUtils::interval_to_string(self.interval_ms)
    }
}

impl std::fmt::Display for PairInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} {}", self.name, self.timeframe())
    }
}
