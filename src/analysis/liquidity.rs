//! Liquidity sweeps (stop runs beyond a swing that snap back) and traps
//! (wicks through a zone boundary that close back inside).

use crate::analysis::pivots::{recent_pivot_highs, recent_pivot_lows};
use crate::config::SignalConfig;
use crate::domain::{Candle, Side};
use crate::indicators::volume_ratio;
use crate::models::setup::{Setup, SetupKind, SweepEvidence, TrapEvidence};
use crate::models::zone::ZoneSet;

pub const MIN_SWEEP_CANDLES: usize = 20;
pub const MIN_TRAP_CANDLES: usize = 10;

/// How many recent pivots to look back through for the swept level.
const SWEEP_PIVOT_COUNT: usize = 10;

/// Boost applied to sweep strength when volume confirms.
const VOLUME_STRENGTH_BOOST: f64 = 1.2;

fn sweep_strength(wick_ratio: f64, has_volume: bool) -> f64 {
    let boost = if has_volume { VOLUME_STRENGTH_BOOST } else { 1.0 };
    (wick_ratio * boost).min(1.0)
}

/// Latest low pierces the most recent pivot low by `sweep_pct`% and closes
/// back above it by `reclaim_pct`% with a dominant lower wick.
pub fn detect_bullish_sweep(candles: &[Candle], config: &SignalConfig) -> Option<Setup> {
    if candles.len() < MIN_SWEEP_CANDLES {
        return None;
    }
    let pivot = *recent_pivot_lows(candles, config.pivot_window, SWEEP_PIVOT_COUNT).last()?;
    let cur = candles.last()?;

    let sweep_level = pivot.price * (1.0 - config.sweep_pct / 100.0);
    let reclaim_level = pivot.price * (1.0 + config.reclaim_pct / 100.0);
    if cur.low_price > sweep_level || cur.close_price < reclaim_level || cur.range() <= 0.0 {
        return None;
    }
    let wick_ratio = cur.lower_wick() / cur.range();
    if wick_ratio < config.wick_rejection_min {
        return None;
    }

    let vol_ratio = volume_ratio(candles, config.volume_period);
    let has_volume = vol_ratio >= config.volume_spike_threshold;
    if config.require_volume_confirmation && !has_volume {
        return None;
    }

    Some(Setup::new(
        SetupKind::LiquiditySweepBull(SweepEvidence {
            pivot,
            sweep_level,
            reclaim_level,
            wick_ratio,
            volume_ratio: vol_ratio,
            has_volume,
        }),
        Side::Long,
        "Bullish Liquidity Sweep",
        cur.close_price,
        sweep_strength(wick_ratio, has_volume),
        None,
        candles.len() - 1,
    ))
}

/// Mirror of [`detect_bullish_sweep`] above the most recent pivot high.
pub fn detect_bearish_sweep(candles: &[Candle], config: &SignalConfig) -> Option<Setup> {
    if candles.len() < MIN_SWEEP_CANDLES {
        return None;
    }
    let pivot = *recent_pivot_highs(candles, config.pivot_window, SWEEP_PIVOT_COUNT).last()?;
    let cur = candles.last()?;

    let sweep_level = pivot.price * (1.0 + config.sweep_pct / 100.0);
    let reclaim_level = pivot.price * (1.0 - config.reclaim_pct / 100.0);
    if cur.high_price < sweep_level || cur.close_price > reclaim_level || cur.range() <= 0.0 {
        return None;
    }
    let wick_ratio = cur.upper_wick() / cur.range();
    if wick_ratio < config.wick_rejection_min {
        return None;
    }

    let vol_ratio = volume_ratio(candles, config.volume_period);
    let has_volume = vol_ratio >= config.volume_spike_threshold;
    if config.require_volume_confirmation && !has_volume {
        return None;
    }

    Some(Setup::new(
        SetupKind::LiquiditySweepBear(SweepEvidence {
            pivot,
            sweep_level,
            reclaim_level,
            wick_ratio,
            volume_ratio: vol_ratio,
            has_volume,
        }),
        Side::Short,
        "Bearish Liquidity Sweep",
        cur.close_price,
        sweep_strength(wick_ratio, has_volume),
        None,
        candles.len() - 1,
    ))
}

/// Bullish first, then bearish.
pub fn detect_liquidity_sweep(
    candles: &[Candle],
    _zones: &ZoneSet,
    config: &SignalConfig,
) -> Option<Setup> {
    detect_bullish_sweep(candles, config).or_else(|| detect_bearish_sweep(candles, config))
}

/// Wick through a zone boundary, close back past the zone center, with the
/// previous close on the untouched side. Support zones are checked first.
pub fn detect_trap(candles: &[Candle], zones: &ZoneSet, config: &SignalConfig) -> Option<Setup> {
    if candles.len() < MIN_TRAP_CANDLES {
        return None;
    }
    let [.., prev, cur] = candles else {
        return None;
    };
    if cur.range() <= 0.0 {
        return None;
    }
    let index = candles.len() - 1;

    let lower_wick_ratio = cur.lower_wick() / cur.range();
    for zone in &zones.support {
        if cur.low_price < zone.lower
            && cur.close_price > zone.center
            && prev.close_price > zone.lower
            && lower_wick_ratio >= config.wick_rejection_min
        {
            return Some(Setup::new(
                SetupKind::TrapBull(TrapEvidence {
                    wick_ratio: lower_wick_ratio,
                }),
                Side::Long,
                "Bear Trap at Support",
                cur.close_price,
                lower_wick_ratio,
                Some(zone.clone()),
                index,
            ));
        }
    }

    let upper_wick_ratio = cur.upper_wick() / cur.range();
    for zone in &zones.resistance {
        if cur.high_price > zone.upper
            && cur.close_price < zone.center
            && prev.close_price < zone.upper
            && upper_wick_ratio >= config.wick_rejection_min
        {
            return Some(Setup::new(
                SetupKind::TrapBear(TrapEvidence {
                    wick_ratio: upper_wick_ratio,
                }),
                Side::Short,
                "Bull Trap at Resistance",
                cur.close_price,
                upper_wick_ratio,
                Some(zone.clone()),
                index,
            ));
        }
    }
    None
}
