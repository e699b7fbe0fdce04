//! Runs the setup detectors in priority order and returns the first match.

use crate::analysis::legacy::{detect_breakout_setup, detect_retest_setup, detect_reversal_setup};
use crate::analysis::liquidity::{detect_liquidity_sweep, detect_trap};
use crate::analysis::retest::{detect_breakout_retest_setup, detect_false_break_confirmed};
use crate::analysis::zones::build_zones;
use crate::config::SignalConfig;
use crate::domain::Candle;
use crate::models::setup::Setup;
use crate::models::zone::ZoneSet;

pub type Detector = fn(&[Candle], &ZoneSet, &SignalConfig) -> Option<Setup>;

/// Highest quality first. Sweeps and traps read stop runs directly, the
/// breakout-retest chain needs three stages, and the legacy trio fires on
/// the weakest evidence.
pub const DETECTORS: [(&str, Detector); 7] = [
    ("liquidity_sweep", detect_liquidity_sweep),
    ("trap", detect_trap),
    ("breakout_retest", detect_breakout_retest_setup),
    ("false_break_confirmed", detect_false_break_confirmed),
    ("reversal", detect_reversal_setup),
    ("breakout", detect_breakout_setup),
    ("retest", detect_retest_setup),
];

/// Build zones, then run [`DETECTORS`] until one matches. `None` when fewer than
/// `min_zones_required` zones exist.
pub fn detect_setup(candles: &[Candle], config: &SignalConfig) -> Option<Setup> {
    let zones = build_zones(
        candles,
        config.zone_lookback,
        config.pivot_window,
        config.zone_tolerance_pct,
    );
    if zones.len() < config.min_zones_required {
        log::debug!(
            "Insufficient zones: {} found, {} required",
            zones.len(),
            config.min_zones_required
        );
        return None;
    }

    DETECTORS
        .iter()
        .find_map(|(name, detect)| {
            detect(candles, &zones, config).inspect(|setup| {
                log::debug!("{} detector matched: {} ({})", name, setup.name, setup.side)
            })
        })
        .map(|setup| setup.with_zones(zones))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SIGNAL_DEFAULTS;
    use crate::domain::Side;
    use crate::models::setup::SetupType;
    use crate::test_support::{candles_from_closes, ohlc_series, push_candle, zigzag_closes};

    #[test]
    fn test_flat_history_has_no_zones() {
        let candles = ohlc_series(&[(100.0, 100.5, 99.5, 100.0); 60]);
        assert!(detect_setup(&candles, &SIGNAL_DEFAULTS).is_none());
    }

    #[test]
    fn test_sweep_wins_and_carries_zones() {
        let mut candles = candles_from_closes(&zigzag_closes(30, 100.0, 10.0, 10));
        push_candle(&mut candles, 99.70, 99.80, 99.15, 99.75, 1000.0);
        let setup = detect_setup(&candles, &SIGNAL_DEFAULTS).unwrap();
        assert_eq!(setup.setup_type(), SetupType::LiquiditySweepBull);
        assert_eq!(setup.side, Side::Long);
        assert!(setup.zones.len() >= SIGNAL_DEFAULTS.min_zones_required);
    }

    #[test]
    fn test_min_zones_gate() {
        let mut candles = candles_from_closes(&zigzag_closes(30, 100.0, 10.0, 10));
        push_candle(&mut candles, 99.70, 99.80, 99.15, 99.75, 1000.0);
        let strict = SignalConfig {
            min_zones_required: 10,
            ..SIGNAL_DEFAULTS
        };
        assert!(detect_setup(&candles, &strict).is_none());
    }

    #[test]
    fn test_priority_table_order() {
        let names: Vec<&str> = DETECTORS.iter().map(|(name, _)| *name).collect();
        assert_eq!(names[0], "liquidity_sweep");
        assert_eq!(names[2], "breakout_retest");
        assert_eq!(names.last(), Some(&"retest"));
    }
}
