//! Breakout -> retest -> confirmation chains and confirmed false breaks.
//!
//! All three stages of a breakout-retest must chain on the same zone. The
//! confirmation is always read from the latest candle so that a setup fires
//! exactly once, on the candle that completes it.

use crate::analysis::patterns::{PatternMatch, detect_engulfing, detect_pin_bar, detect_reversal_pattern};
use crate::config::SignalConfig;
use crate::domain::{Candle, Direction, Side};
use crate::models::setup::{BreakoutRetestEvidence, Setup, SetupKind};
use crate::models::zone::{Zone, ZoneSet};

pub const MIN_BREAKOUT_RETEST_CANDLES: usize = 20;
pub const MIN_FALSE_BREAK_CANDLES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breakout {
    pub index: usize,
    pub close: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Retest {
    pub index: usize,
    /// Low of the retest candle for a long, high for a short.
    pub price: f64,
    pub bars_since_breakout: usize,
}

fn closes_beyond(candle: &Candle, zone: &Zone, side: Side) -> bool {
    match side {
        Side::Long => candle.close_price > zone.upper,
        Side::Short => candle.close_price < zone.lower,
    }
}

fn holds_breakout_side(candle: &Candle, zone: &Zone, side: Side) -> bool {
    match side {
        Side::Long => candle.close_price > zone.center,
        Side::Short => candle.close_price < zone.center,
    }
}

/// First close beyond `zone` among the latest `lookback` candles, the current
/// one included. A long breaks resistance upwards, a short breaks support downwards.
pub fn detect_breakout(candles: &[Candle], zone: &Zone, side: Side, lookback: usize) -> Option<Breakout> {
    if candles.len() < lookback + 1 {
        return None;
    }
    let start = candles.len() - lookback;
    (start..candles.len())
        .find(|&i| closes_beyond(&candles[i], zone, side))
        .map(|index| Breakout {
            index,
            close: candles[index].close_price,
        })
}

/// Latest candle within `max_bars` after the breakout that trades back into
/// the zone while closing on the breakout side of its center.
pub fn detect_retest(
    candles: &[Candle],
    breakout_index: usize,
    zone: &Zone,
    side: Side,
    max_bars: usize,
) -> Option<Retest> {
    let current = candles.len().checked_sub(1)?;
    let last = current.min(breakout_index + max_bars);
    (breakout_index + 1..=last).rev().find_map(|i| {
        let candle = &candles[i];
        let (touching, price) = match side {
            Side::Long => (
                candle.low_price <= zone.upper && candle.close_price >= zone.lower,
                candle.low_price,
            ),
            Side::Short => (
                candle.high_price >= zone.lower && candle.close_price <= zone.upper,
                candle.high_price,
            ),
        };
        (touching && holds_breakout_side(candle, zone, side)).then_some(Retest {
            index: i,
            price,
            bars_since_breakout: i - breakout_index,
        })
    })
}

/// Pin bar on the latest candle, or engulfing over the last two, pointing the
/// breakout's way and no more than `window` candles after the retest.
pub fn detect_confirmation(
    candles: &[Candle],
    retest_index: usize,
    side: Side,
    window: usize,
) -> Option<PatternMatch> {
    let current = candles.len().checked_sub(1)?;
    if retest_index > current || current - retest_index > window {
        return None;
    }
    let wanted = side.direction();
    candles
        .last()
        .and_then(detect_pin_bar)
        .filter(|p| p.direction == wanted)
        .or_else(|| detect_engulfing(candles).filter(|p| p.direction == wanted))
}

fn chain_on_zone(candles: &[Candle], zone: &Zone, side: Side, config: &SignalConfig) -> Option<BreakoutRetestEvidence> {
    let breakout = detect_breakout(candles, zone, side, config.breakout_lookback)?;
    let retest = detect_retest(candles, breakout.index, zone, side, config.retest_max_bars)?;
    let confirmation = detect_confirmation(candles, retest.index, side, config.confirmation_window)?;
    let cur = candles.last()?;
    if !holds_breakout_side(cur, zone, side) {
        return None;
    }
    Some(BreakoutRetestEvidence {
        breakout_index: breakout.index,
        breakout_close: breakout.close,
        retest_index: retest.index,
        confirmation,
    })
}

/// Resistance zones are tried for longs first, then support zones for shorts.
pub fn detect_breakout_retest_setup(
    candles: &[Candle],
    zones: &ZoneSet,
    config: &SignalConfig,
) -> Option<Setup> {
    if candles.len() < MIN_BREAKOUT_RETEST_CANDLES {
        return None;
    }
    let cur = candles.last()?;
    let index = candles.len() - 1;

    let longs = zones.resistance.iter().map(|z| (z, Side::Long));
    let shorts = zones.support.iter().map(|z| (z, Side::Short));
    longs.chain(shorts).find_map(|(zone, side)| {
        let evidence = chain_on_zone(candles, zone, side, config)?;
        let name = match side {
            Side::Long => "Bullish Breakout-Retest-Confirmation",
            Side::Short => "Bearish Breakout-Retest-Confirmation",
        };
        let strength = evidence.confirmation.strength;
        Some(Setup::new(
            SetupKind::BreakoutRetest(evidence),
            side,
            name,
            cur.close_price,
            strength,
            Some(zone.clone()),
            index,
        ))
    })
}

/// Wick beyond a zone, close back inside, and a reversal pattern agreeing
/// with the rejection.
pub fn detect_false_break_confirmed(
    candles: &[Candle],
    zones: &ZoneSet,
    config: &SignalConfig,
) -> Option<Setup> {
    if candles.len() < MIN_FALSE_BREAK_CANDLES {
        return None;
    }
    let cur = candles.last()?;
    let index = candles.len() - 1;
    let pattern = detect_reversal_pattern(candles, &config.patterns);

    let build = |zone: &Zone, side: Side, name: &str, pattern: PatternMatch| {
        Setup::new(
            SetupKind::FalseBreakConfirmed { pattern },
            side,
            name,
            cur.close_price,
            pattern.strength,
            Some(zone.clone()),
            index,
        )
    };

    if let Some(p) = pattern.filter(|p| p.direction == Direction::Bullish)
        && let Some(zone) = zones
            .support
            .iter()
            .find(|z| cur.low_price < z.lower && cur.close_price > z.lower)
    {
        return Some(build(zone, Side::Long, "False Breakdown + Confirmation", p));
    }
    if let Some(p) = pattern.filter(|p| p.direction == Direction::Bearish)
        && let Some(zone) = zones
            .resistance
            .iter()
            .find(|z| cur.high_price > z.upper && cur.close_price < z.upper)
    {
        return Some(build(zone, Side::Short, "False Breakout + Confirmation", p));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::patterns::PatternKind;
    use crate::config::SIGNAL_DEFAULTS;
    use crate::models::zone::ZoneKind;
    use crate::test_support::{ohlc_series, push_candle};

    fn zone(kind: ZoneKind, lower: f64, upper: f64) -> Zone {
        Zone {
            kind,
            lower,
            upper,
            center: (lower + upper) / 2.0,
            touch_count: 2,
            first_index: 0,
        }
    }

    /// Flat base, close above 101 at 20, pullback into the zone at 22.
    fn bullish_chain() -> Vec<Candle> {
        let mut candles = ohlc_series(&[(99.0, 99.5, 98.5, 99.0); 20]);
        push_candle(&mut candles, 99.5, 102.5, 99.4, 102.0, 1000.0);
        push_candle(&mut candles, 102.0, 103.0, 101.8, 102.5, 1000.0);
        push_candle(&mut candles, 102.4, 102.6, 100.8, 101.5, 1000.0);
        candles
    }

    fn resistance_only() -> ZoneSet {
        ZoneSet {
            support: vec![],
            resistance: vec![zone(ZoneKind::Resistance, 100.0, 101.0)],
        }
    }

    #[test]
    fn test_stage_detection() {
        let candles = bullish_chain();
        let z = &resistance_only().resistance[0];
        let breakout = detect_breakout(&candles, z, Side::Long, 10).unwrap();
        assert_eq!(breakout.index, 20);
        let retest = detect_retest(&candles, breakout.index, z, Side::Long, 4).unwrap();
        assert_eq!(retest.index, 22);
        assert_eq!(retest.bars_since_breakout, 2);
        assert!((retest.price - 100.8).abs() < 1e-12);
    }

    #[test]
    fn test_bullish_breakout_retest_confirmed_by_hammer() {
        let mut candles = bullish_chain();
        push_candle(&mut candles, 101.6, 101.8, 100.6, 101.7, 1000.0);
        let setup = detect_breakout_retest_setup(&candles, &resistance_only(), &SIGNAL_DEFAULTS).unwrap();
        assert_eq!(setup.side, Side::Long);
        let SetupKind::BreakoutRetest(evidence) = &setup.kind else {
            panic!("unexpected kind {:?}", setup.kind);
        };
        assert_eq!(evidence.breakout_index, 20);
        // the hammer itself trades back into the zone
        assert_eq!(evidence.retest_index, 23);
        assert_eq!(evidence.confirmation.kind, PatternKind::PinBar);
        assert!((setup.strength - evidence.confirmation.strength).abs() < 1e-12);
    }

    #[test]
    fn test_breakout_window_ends_at_current_candle() {
        let mut candles = ohlc_series(&[(99.0, 99.5, 98.5, 99.0); 20]);
        push_candle(&mut candles, 99.5, 102.5, 99.4, 102.0, 1000.0);
        for _ in 0..3 {
            push_candle(&mut candles, 99.0, 99.5, 98.5, 99.0, 1000.0);
        }
        let z = &resistance_only().resistance[0];
        assert_eq!(detect_breakout(&candles, z, Side::Long, 4).map(|b| b.index), Some(20));
        assert!(detect_breakout(&candles, z, Side::Long, 3).is_none());
    }

    #[test]
    fn test_later_retest_confirmed_after_earlier_touch() {
        let mut candles = ohlc_series(&[(99.0, 99.5, 98.5, 99.0); 20]);
        push_candle(&mut candles, 99.5, 102.5, 99.4, 102.0, 1000.0);
        // first touch right after the break, then two candles clear of the zone
        push_candle(&mut candles, 102.0, 102.2, 100.8, 101.6, 1000.0);
        push_candle(&mut candles, 101.6, 103.0, 101.5, 102.8, 1000.0);
        push_candle(&mut candles, 102.8, 103.2, 101.9, 102.0, 1000.0);
        // second touch four bars after the break, a hammer
        push_candle(&mut candles, 101.6, 101.8, 100.6, 101.7, 1000.0);

        let z = &resistance_only().resistance[0];
        let retest = detect_retest(&candles, 20, z, Side::Long, 4).unwrap();
        assert_eq!(retest.index, 24);
        assert_eq!(retest.bars_since_breakout, 4);

        let setup = detect_breakout_retest_setup(&candles, &resistance_only(), &SIGNAL_DEFAULTS).unwrap();
        assert_eq!(setup.name, "Bullish Breakout-Retest-Confirmation");
        let SetupKind::BreakoutRetest(evidence) = &setup.kind else {
            panic!("unexpected kind {:?}", setup.kind);
        };
        assert_eq!(evidence.retest_index, 24);
    }

    #[test]
    fn test_chain_without_confirmation_is_ignored() {
        let mut candles = bullish_chain();
        // plain bullish body, no pin bar and no engulfing
        push_candle(&mut candles, 101.5, 102.0, 101.3, 101.9, 1000.0);
        assert!(detect_breakout_retest_setup(&candles, &resistance_only(), &SIGNAL_DEFAULTS).is_none());
    }

    #[test]
    fn test_confirmation_outside_window() {
        let candles = bullish_chain();
        assert!(detect_confirmation(&candles, 19, Side::Long, 2).is_none());
    }

    #[test]
    fn test_bearish_breakdown_retest() {
        let mut candles = ohlc_series(&[(101.0, 101.5, 100.5, 101.0); 20]);
        push_candle(&mut candles, 100.8, 100.9, 97.5, 98.0, 1000.0);
        push_candle(&mut candles, 98.0, 98.3, 97.0, 97.5, 1000.0);
        push_candle(&mut candles, 97.6, 99.2, 97.4, 98.5, 1000.0);
        push_candle(&mut candles, 98.4, 99.4, 98.2, 98.3, 1000.0);
        let zones = ZoneSet {
            support: vec![zone(ZoneKind::Support, 99.0, 100.0)],
            resistance: vec![],
        };
        let setup = detect_breakout_retest_setup(&candles, &zones, &SIGNAL_DEFAULTS).unwrap();
        assert_eq!(setup.side, Side::Short);
        assert_eq!(setup.name, "Bearish Breakout-Retest-Confirmation");
    }

    #[test]
    fn test_false_breakdown_with_hammer() {
        let mut candles = ohlc_series(&[(101.0, 101.2, 100.8, 101.0); 6]);
        push_candle(&mut candles, 100.6, 100.8, 99.0, 100.7, 1000.0);
        let zones = ZoneSet {
            support: vec![zone(ZoneKind::Support, 99.5, 100.5)],
            resistance: vec![zone(ZoneKind::Resistance, 110.0, 111.0)],
        };
        let setup = detect_false_break_confirmed(&candles, &zones, &SIGNAL_DEFAULTS).unwrap();
        assert_eq!(setup.side, Side::Long);
        assert_eq!(setup.kind.pattern().map(|p| p.name), Some("Hammer"));
    }

    #[test]
    fn test_false_break_needs_matching_pattern() {
        let mut candles = ohlc_series(&[(101.0, 101.2, 100.8, 101.0); 6]);
        push_candle(&mut candles, 100.6, 100.8, 99.0, 100.7, 1000.0);
        let zones = ZoneSet {
            support: vec![zone(ZoneKind::Support, 99.5, 100.5)],
            resistance: vec![],
        };
        let config = SignalConfig {
            patterns: crate::config::PatternToggles {
                pin_bar: false,
                ..crate::config::PatternToggles::ALL
            },
            ..SIGNAL_DEFAULTS
        };
        assert!(detect_false_break_confirmed(&candles, &zones, &config).is_none());
    }
}
