use std::collections::HashMap;

use crate::config::DEBUG_FLAGS;
use crate::domain::{Candle, PairInterval};

pub const DEFAULT_CACHE_CAPACITY: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheUpdate {
    /// Same `open_time` as the last cached candle.
    Replaced,
    Appended,
}

/// Bounded candle history per instrument and timeframe, oldest first.
#[derive(Debug)]
pub struct CandleCache {
    series: HashMap<PairInterval, Vec<Candle>>,
    capacity: usize,
}

impl Default for CandleCache {
    fn default() -> Self {
        Self::new()
    }
}

impl CandleCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            series: HashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Replace the series for `key`, keeping only the newest `capacity` candles.
    pub fn init(&mut self, key: PairInterval, mut candles: Vec<Candle>) {
        let excess = candles.len().saturating_sub(self.capacity);
        candles.drain(..excess);
        log::info!("Initialised {} with {} candles", key, candles.len());
        self.series.insert(key, candles);
    }

    /// Replace the last candle when its `open_time` matches, else append and
    /// evict the oldest beyond capacity. Unknown series start empty.
    pub fn update(&mut self, key: &PairInterval, candle: Candle) -> CacheUpdate {
        let capacity = self.capacity;
        let series = self.series.entry(key.clone()).or_default();

        let outcome = match series.last_mut() {
            Some(last) if last.open_time == candle.open_time => {
                *last = candle;
                CacheUpdate::Replaced
            }
            _ => {
                series.push(candle);
                if series.len() > capacity {
                    series.remove(0);
                }
                CacheUpdate::Appended
            }
        };

        #[cfg(debug_assertions)]
        if DEBUG_FLAGS.print_cache_updates {
            log::debug!("{} {:?}: {} candles cached", key, outcome, series.len());
        }

        outcome
    }

    /// Empty when the series is unknown.
    pub fn get(&self, key: &PairInterval) -> &[Candle] {
        self.series.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The newest `count` candles.
    pub fn recent(&self, key: &PairInterval, count: usize) -> &[Candle] {
        let candles = self.get(key);
        &candles[candles.len().saturating_sub(count)..]
    }

    pub fn instruments(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.series.keys().map(|k| k.name()).collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    pub fn timeframes(&self, instrument: &str) -> Vec<&'static str> {
        let mut keys: Vec<&PairInterval> = self
            .series
            .keys()
            .filter(|k| k.name() == instrument)
            .collect();
        keys.sort();
        keys.into_iter().map(|k| k.timeframe()).collect()
    }

    pub fn has(&self, key: &PairInterval) -> bool {
        self.series.contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ohlc_series;

    fn key(name: &str, tf: &str) -> PairInterval {
        PairInterval::from_timeframe(name, tf).unwrap()
    }

    #[test]
    fn test_update_replaces_same_open_time() {
        let mut cache = CandleCache::new();
        let k = key("BTCUSDT", "1h");
        let candles = ohlc_series(&[(1.0, 2.0, 0.5, 1.5), (1.5, 2.5, 1.0, 2.0)]);
        assert_eq!(cache.update(&k, candles[0]), CacheUpdate::Appended);

        let mut revised = candles[0];
        revised.close_price = 1.8;
        assert_eq!(cache.update(&k, revised), CacheUpdate::Replaced);
        assert_eq!(cache.get(&k).len(), 1);
        assert_eq!(cache.get(&k)[0].close_price, 1.8);

        assert_eq!(cache.update(&k, candles[1]), CacheUpdate::Appended);
        assert_eq!(cache.get(&k).len(), 2);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut cache = CandleCache::with_capacity(3);
        let k = key("ETHUSDT", "4h");
        for candle in ohlc_series(&[(1.0, 2.0, 0.5, 1.5); 5]) {
            cache.update(&k, candle);
        }
        let kept = cache.get(&k);
        assert_eq!(kept.len(), 3);
        assert_eq!(kept[0].open_time, 2 * crate::utils::TimeUtils::MS_IN_H);
        assert_eq!(cache.recent(&k, 2).len(), 2);
        assert_eq!(cache.recent(&k, 10).len(), 3);
    }

    #[test]
    fn test_init_and_lookup() {
        let mut cache = CandleCache::with_capacity(2);
        cache.init(key("BTCUSDT", "4h"), ohlc_series(&[(1.0, 2.0, 0.5, 1.5); 4]));
        cache.init(key("BTCUSDT", "1h"), vec![]);
        cache.init(key("ETHUSDT", "1h"), vec![]);

        assert_eq!(cache.get(&key("BTCUSDT", "4h")).len(), 2);
        assert!(cache.get(&key("SOLUSDT", "1h")).is_empty());
        assert!(cache.has(&key("BTCUSDT", "1h")));
        assert_eq!(cache.instruments(), vec!["BTCUSDT", "ETHUSDT"]);
        assert_eq!(cache.timeframes("BTCUSDT"), vec!["1h", "4h"]);
    }
}
