//! Lowest-priority detectors: reversal at a zone, single-candle breakouts
//! (with weak-volume fades) and retests of recently broken zones.

use crate::analysis::patterns::detect_reversal_pattern;
use crate::analysis::zones::nearest_zone;
use crate::config::SignalConfig;
use crate::domain::{Candle, Direction, Side};
use crate::indicators::{calculate_average_volume, has_volume_spark};
use crate::models::setup::{BreakoutEvidence, Setup, SetupKind};
use crate::models::zone::ZoneSet;
use crate::utils::maths_utils::safe_ratio;

pub const MIN_REVERSAL_CANDLES: usize = 20;
pub const MIN_BREAKOUT_CANDLES: usize = 20;
pub const MIN_RETEST_CANDLES: usize = 30;

/// How far back a retest looks for the close that broke the zone.
const RETEST_HISTORY: usize = 20;

const TRUE_BREAK_STRENGTH: f64 = 0.8;
const FADE_STRENGTH: f64 = 0.5;

/// Reversal pattern whose close touches the nearest zone on the matching side.
pub fn detect_reversal_setup(candles: &[Candle], zones: &ZoneSet, config: &SignalConfig) -> Option<Setup> {
    if candles.len() < MIN_REVERSAL_CANDLES {
        return None;
    }
    let pattern = detect_reversal_pattern(candles, &config.patterns)?;
    let price = candles.last()?.close_price;

    let (side, pool, name) = match pattern.direction {
        Direction::Bullish => (Side::Long, &zones.support, "Bullish Reversal at Support"),
        Direction::Bearish => (Side::Short, &zones.resistance, "Bearish Reversal at Resistance"),
        Direction::Neutral => return None,
    };
    let zone = nearest_zone(price, pool, config.nearest_zone_max_distance_pct)
        .filter(|z| z.is_touching(price, config.zone_tolerance_pct))?;

    Some(Setup::new(
        SetupKind::Reversal { pattern },
        side,
        name,
        price,
        pattern.strength,
        Some(zone.clone()),
        candles.len() - 1,
    ))
}

/// Close through a zone from the far side of its center. With a volume spike
/// the break is traded; without one it is faded. A wick through the zone that
/// closes back inside on quiet volume is a false breakout/breakdown.
pub fn detect_breakout_setup(candles: &[Candle], zones: &ZoneSet, config: &SignalConfig) -> Option<Setup> {
    if candles.len() < MIN_BREAKOUT_CANDLES {
        return None;
    }
    let [.., prev, cur] = candles else {
        return None;
    };
    let index = candles.len() - 1;
    let price = cur.close_price;

    let avg_volume = calculate_average_volume(candles, config.volume_period);
    let volume_spike = has_volume_spark(cur.base_volume, avg_volume, config.volume_spike_threshold);
    let volume_ratio = safe_ratio(cur.base_volume, avg_volume, 1.0);
    let evidence = BreakoutEvidence {
        is_true: volume_spike,
        volume_ratio,
        volume_spike,
    };
    let break_strength = if volume_spike { TRUE_BREAK_STRENGTH } else { FADE_STRENGTH };

    for zone in &zones.resistance {
        if prev.close_price < zone.center && cur.close_price > zone.upper {
            let (side, name) = if volume_spike {
                (Side::Long, "True Breakout Above Resistance")
            } else {
                (Side::Short, "False Breakout (Weak Volume)")
            };
            return Some(Setup::new(
                SetupKind::Breakout(evidence),
                side,
                name,
                price,
                break_strength,
                Some(zone.clone()),
                index,
            ));
        }
        if cur.high_price > zone.upper && cur.close_price < zone.upper && !volume_spike {
            let wick_ratio = safe_ratio(cur.upper_wick(), cur.range(), 0.0);
            return Some(Setup::new(
                SetupKind::FalseBreakout {
                    wick_ratio,
                    volume_ratio,
                },
                Side::Short,
                "False Breakout Rejection",
                price,
                wick_ratio,
                Some(zone.clone()),
                index,
            ));
        }
    }

    for zone in &zones.support {
        if prev.close_price > zone.center && cur.close_price < zone.lower {
            let (side, name) = if volume_spike {
                (Side::Short, "True Breakdown Below Support")
            } else {
                (Side::Long, "False Breakdown (Weak Volume)")
            };
            return Some(Setup::new(
                SetupKind::Breakdown(evidence),
                side,
                name,
                price,
                break_strength,
                Some(zone.clone()),
                index,
            ));
        }
        if cur.low_price < zone.lower && cur.close_price > zone.lower && !volume_spike {
            let wick_ratio = safe_ratio(cur.lower_wick(), cur.range(), 0.0);
            return Some(Setup::new(
                SetupKind::FalseBreakdown {
                    wick_ratio,
                    volume_ratio,
                },
                Side::Long,
                "False Breakdown Rejection",
                price,
                wick_ratio,
                Some(zone.clone()),
                index,
            ));
        }
    }
    None
}

/// Price back at a zone it closed through within the last 20 candles, on the
/// broken side of the center, with a reversal pattern pointing away from it.
pub fn detect_retest_setup(candles: &[Candle], zones: &ZoneSet, config: &SignalConfig) -> Option<Setup> {
    if candles.len() < MIN_RETEST_CANDLES {
        return None;
    }
    let price = candles.last()?.close_price;
    let recent = &candles[candles.len() - RETEST_HISTORY..];
    let index = candles.len() - 1;

    let broken_resistance = zones.resistance.iter().find(|z| {
        price > z.center
            && z.is_touching(price, config.zone_tolerance_pct)
            && recent.iter().any(|c| c.close_price > z.upper)
    });
    if let Some(zone) = broken_resistance
        && let Some(pattern) = detect_reversal_pattern(candles, &config.patterns)
        && pattern.direction == Direction::Bullish
    {
        return Some(Setup::new(
            SetupKind::Retest { pattern },
            Side::Long,
            "Retest of Broken Resistance",
            price,
            pattern.strength,
            Some(zone.clone()),
            index,
        ));
    }

    let broken_support = zones.support.iter().find(|z| {
        price < z.center
            && z.is_touching(price, config.zone_tolerance_pct)
            && recent.iter().any(|c| c.close_price < z.lower)
    });
    if let Some(zone) = broken_support
        && let Some(pattern) = detect_reversal_pattern(candles, &config.patterns)
        && pattern.direction == Direction::Bearish
    {
        return Some(Setup::new(
            SetupKind::Retest { pattern },
            Side::Short,
            "Retest of Broken Support",
            price,
            pattern.strength,
            Some(zone.clone()),
            index,
        ));
    }
    None
}
