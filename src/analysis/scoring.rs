//! Multi-factor signal score. Every component is capped on its own and the
//! total is the rounded sum.

use serde::Serialize;

use crate::analysis::bias::HtfAlignment;
use crate::analysis::patterns::candle_strength;
use crate::analysis::structure::StructureEvents;
use crate::config::{DEBUG_FLAGS, SignalConfig};
use crate::domain::{Candle, Side};
use crate::indicators::{Divergence, volume_ratio};
use crate::models::setup::{Setup, SetupKind};

pub const HTF_CAP: f64 = 30.0;
pub const SETUP_CAP: f64 = 35.0;
pub const CANDLE_CAP: f64 = 25.0;
pub const VOLUME_CAP: f64 = 15.0;
pub const STRUCTURE_CAP: f64 = 15.0;
pub const SWEEP_CAP: f64 = 12.0;
pub const RETEST_CAP: f64 = 10.0;
pub const FALSE_BREAK_CAP: f64 = 8.0;

const NO_HTF_SCORE: f64 = 15.0;
const SETUP_BASE: f64 = 10.0;
const CANDLE_BASE: f64 = 10.0;
const VOLUME_BASE: f64 = 5.0;
const SHORT_HISTORY_VOLUME_SCORE: f64 = 7.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub htf: f64,
    pub setup: f64,
    pub candle: f64,
    pub volume: f64,
    pub divergence: f64,
    pub structure: f64,
    pub sweep: f64,
    pub retest: f64,
    pub false_break: f64,
}

impl ScoreBreakdown {
    pub fn total(&self) -> f64 {
        self.htf
            + self.setup
            + self.candle
            + self.volume
            + self.divergence
            + self.structure
            + self.sweep
            + self.retest
            + self.false_break
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreResult {
    pub score: f64,
    pub breakdown: ScoreBreakdown,
    /// Sum of every cap. Bonuses are mostly exclusive, so this is not reachable.
    pub max_score: f64,
}

pub fn max_score(config: &SignalConfig) -> f64 {
    HTF_CAP
        + SETUP_CAP
        + CANDLE_CAP
        + VOLUME_CAP
        + config.rsi_divergence_bonus
        + STRUCTURE_CAP
        + SWEEP_CAP
        + RETEST_CAP
        + FALSE_BREAK_CAP
}

pub fn calculate_score(
    setup: &Setup,
    htf: Option<&HtfAlignment>,
    candles: &[Candle],
    divergence: &Divergence,
    events: &StructureEvents,
    config: &SignalConfig,
) -> ScoreResult {
    let breakdown = ScoreBreakdown {
        htf: htf_score(htf),
        setup: setup_score(setup, config),
        candle: candle_score(candles, setup.side),
        volume: volume_score(candles, setup, config.volume_period),
        divergence: divergence_score(divergence, setup.side, config.rsi_divergence_bonus),
        structure: structure_score(events, setup.side),
        sweep: sweep_bonus(setup),
        retest: retest_bonus(setup),
        false_break: false_break_bonus(setup),
    };

    #[cfg(debug_assertions)]
    if DEBUG_FLAGS.print_score_breakdown {
        log::debug!("Score breakdown for {}: {:?}", setup.name, breakdown);
    }

    ScoreResult {
        score: breakdown.total().round(),
        breakdown,
        max_score: max_score(config),
    }
}

/// 25..=30 when aligned, 5..=20 against, 15 without HTF data.
pub fn htf_score(htf: Option<&HtfAlignment>) -> f64 {
    let Some(alignment) = htf else {
        return NO_HTF_SCORE;
    };
    let score = if alignment.aligned {
        25.0 + alignment.score * 5.0
    } else {
        5.0 + alignment.score * 15.0
    };
    score.clamp(0.0, HTF_CAP)
}

/// Base plus a kind bonus. Sweeps, traps and confirmed chains rank highest.
pub fn setup_score(setup: &Setup, config: &SignalConfig) -> f64 {
    let s = setup.strength;
    let bonus = match &setup.kind {
        SetupKind::LiquiditySweepBull(_) | SetupKind::LiquiditySweepBear(_) => 15.0 + 10.0 * s,
        SetupKind::TrapBull(_) | SetupKind::TrapBear(_) => 13.0 + 10.0 * s,
        SetupKind::BreakoutRetest(_) => 15.0 + 10.0 * s,
        SetupKind::FalseBreakConfirmed { .. } => 12.0 + 8.0 * s,
        SetupKind::Reversal { pattern } => {
            (8.0 + 7.0 * s) * config.pattern_weights.weight(pattern.kind)
        }
        SetupKind::Retest { .. } => 10.0 + 5.0 * s,
        SetupKind::Breakout(e) | SetupKind::Breakdown(e) => {
            if e.is_true {
                10.0 + 5.0 * s
            } else {
                3.0
            }
        }
        SetupKind::FalseBreakout { .. } | SetupKind::FalseBreakdown { .. } => 6.0 + 4.0 * s,
    };
    (SETUP_BASE + bonus).clamp(0.0, SETUP_CAP)
}

/// Directional body, close location and wick rejection of the latest candle.
pub fn candle_score(candles: &[Candle], side: Side) -> f64 {
    let Some(last) = candles.last() else {
        return CANDLE_BASE;
    };
    let shape = candle_strength(last);
    let mut score = CANDLE_BASE;

    if shape.direction.matches(side) {
        score += shape.strength * 10.0;
    } else if shape.direction.matches(side.opposite()) {
        score -= 5.0;
    }

    let strong_close = match side {
        Side::Long => shape.close_location >= 0.7,
        Side::Short => shape.close_location <= 0.3,
    };
    if strong_close {
        score += 3.0;
    }
    if shape.wick_rejection.matches(side) {
        score += 2.0;
    }
    score.clamp(0.0, CANDLE_CAP)
}

pub fn volume_score(candles: &[Candle], setup: &Setup, period: usize) -> f64 {
    if candles.len() < period {
        return SHORT_HISTORY_VOLUME_SCORE;
    }
    let ratio = volume_ratio(candles, period);
    let mut score = VOLUME_BASE;
    if ratio > 2.0 {
        score += 10.0;
    } else if ratio > 1.5 {
        score += 7.0;
    } else if ratio > 1.2 {
        score += 5.0;
    } else if ratio < 0.8 {
        score -= 3.0;
    }
    if setup.kind.has_volume_spike() {
        score += 3.0;
    }
    score.clamp(0.0, VOLUME_CAP)
}

pub fn divergence_score(divergence: &Divergence, side: Side, bonus: f64) -> f64 {
    let agrees = match side {
        Side::Long => divergence.bullish,
        Side::Short => divergence.bearish,
    };
    if agrees { bonus } else { 0.0 }
}

/// CHOCH in the trade's direction beats BOS.
pub fn structure_score(events: &StructureEvents, side: Side) -> f64 {
    let aligned = |e: &crate::analysis::structure::StructureEvent| e.direction.matches(side);
    if events.choch.as_ref().is_some_and(aligned) {
        STRUCTURE_CAP
    } else if events.bos.as_ref().is_some_and(aligned) {
        10.0
    } else {
        0.0
    }
}

pub fn sweep_bonus(setup: &Setup) -> f64 {
    let s = setup.strength;
    let bonus = match &setup.kind {
        SetupKind::LiquiditySweepBull(e) | SetupKind::LiquiditySweepBear(e) => {
            8.0 * s + if e.has_volume { 4.0 } else { 0.0 }
        }
        SetupKind::TrapBull(_) | SetupKind::TrapBear(_) => 10.0 * s,
        _ => 0.0,
    };
    bonus.clamp(0.0, SWEEP_CAP)
}

pub fn retest_bonus(setup: &Setup) -> f64 {
    let s = setup.strength;
    let bonus = match &setup.kind {
        SetupKind::BreakoutRetest(_) => 6.0 + 4.0 * s,
        SetupKind::Retest { .. } => 3.0 + 2.0 * s,
        _ => 0.0,
    };
    bonus.clamp(0.0, RETEST_CAP)
}

pub fn false_break_bonus(setup: &Setup) -> f64 {
    let bonus = match &setup.kind {
        SetupKind::FalseBreakConfirmed { .. } => 4.0 + 4.0 * setup.strength,
        SetupKind::FalseBreakout { .. } | SetupKind::FalseBreakdown { .. } => 2.0,
        _ => 0.0,
    };
    bonus.clamp(0.0, FALSE_BREAK_CAP)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::patterns::{PatternKind, PatternMatch};
    use crate::analysis::pivots::Pivot;
    use crate::analysis::structure::{StructureEvent, StructureEventKind, StructureState};
    use crate::config::SIGNAL_DEFAULTS;
    use crate::domain::Direction;
    use crate::models::setup::{BreakoutEvidence, BreakoutRetestEvidence, SweepEvidence, TrapEvidence};
    use crate::test_support::{ohlc_series, ohlcv_series};
    use proptest::prelude::*;

    fn pattern(kind: PatternKind, direction: Direction, strength: f64) -> PatternMatch {
        PatternMatch {
            kind,
            name: "test",
            direction,
            strength,
        }
    }

    fn sweep(has_volume: bool) -> SetupKind {
        SetupKind::LiquiditySweepBull(SweepEvidence {
            pivot: Pivot {
                index: 0,
                price: 100.0,
            },
            sweep_level: 99.7,
            reclaim_level: 100.2,
            wick_ratio: 0.8,
            volume_ratio: 1.0,
            has_volume,
        })
    }

    /// One of every kind, indexed for property tests.
    fn kind_at(index: usize, strength: f64, flag: bool) -> SetupKind {
        let p = pattern(PatternKind::MorningStar, Direction::Bullish, strength);
        let breakout = BreakoutEvidence {
            is_true: flag,
            volume_ratio: 2.0,
            volume_spike: flag,
        };
        match index {
            0 => sweep(flag),
            1 => SetupKind::TrapBull(TrapEvidence { wick_ratio: strength }),
            2 => SetupKind::BreakoutRetest(BreakoutRetestEvidence {
                breakout_index: 1,
                breakout_close: 101.0,
                retest_index: 2,
                confirmation: p,
            }),
            3 => SetupKind::FalseBreakConfirmed { pattern: p },
            4 => SetupKind::Reversal { pattern: p },
            5 => SetupKind::Breakout(breakout),
            6 => SetupKind::Breakdown(breakout),
            7 => SetupKind::FalseBreakout {
                wick_ratio: strength,
                volume_ratio: 1.0,
            },
            8 => SetupKind::FalseBreakdown {
                wick_ratio: strength,
                volume_ratio: 1.0,
            },
            _ => SetupKind::Retest { pattern: p },
        }
    }

    fn setup(kind: SetupKind, side: Side, strength: f64) -> Setup {
        Setup::new(kind, side, "test", 100.0, strength, None, 0)
    }

    fn event(kind: StructureEventKind, direction: Direction) -> StructureEvent {
        StructureEvent {
            kind,
            direction,
            price: 100.0,
            broken_level: 99.0,
            candle_index: 0,
            timestamp: 0,
            prev_state: StructureState::Neutral,
        }
    }

    #[test]
    fn test_htf_score_ranges() {
        assert_eq!(htf_score(None), 15.0);
        let aligned = HtfAlignment {
            aligned: true,
            score: 1.0,
            bias: Direction::Bullish,
        };
        assert_eq!(htf_score(Some(&aligned)), 30.0);
        let against = HtfAlignment {
            aligned: false,
            score: 0.0,
            bias: Direction::Bearish,
        };
        assert_eq!(htf_score(Some(&against)), 5.0);
    }

    #[test]
    fn test_sweep_outranks_fade() {
        let strong_sweep = setup(sweep(true), Side::Long, 1.0);
        assert_eq!(setup_score(&strong_sweep, &SIGNAL_DEFAULTS), SETUP_CAP);
        assert_eq!(sweep_bonus(&strong_sweep), SWEEP_CAP);

        let fade = setup(kind_at(5, 0.5, false), Side::Short, 0.5);
        assert_eq!(setup_score(&fade, &SIGNAL_DEFAULTS), 13.0);
    }

    #[test]
    fn test_reversal_uses_pattern_weight() {
        let doji = pattern(PatternKind::Doji, Direction::Neutral, 1.0);
        let reversal = setup(SetupKind::Reversal { pattern: doji }, Side::Long, 1.0);
        // (8 + 7) * 0.5
        assert!((setup_score(&reversal, &SIGNAL_DEFAULTS) - 17.5).abs() < 1e-9);
    }

    #[test]
    fn test_candle_score_alignment() {
        // full-bodied bullish candle closing on its high
        let bull = ohlc_series(&[(100.0, 102.0, 100.0, 102.0)]);
        assert_eq!(candle_score(&bull, Side::Long), 23.0);
        assert_eq!(candle_score(&bull, Side::Short), 5.0);
    }

    #[test]
    fn test_volume_tiers() {
        let mut rows = vec![(100.0, 101.0, 99.0, 100.0, 1000.0); 19];
        rows.push((100.0, 101.0, 99.0, 100.0, 5000.0));
        let candles = ohlcv_series(&rows);
        let s = setup(sweep(false), Side::Long, 0.5);
        assert_eq!(volume_score(&candles, &s, 20), 15.0);
        assert_eq!(volume_score(&candles[..10], &s, 20), 7.0);

        let quiet = ohlcv_series(&[(100.0, 101.0, 99.0, 100.0, 1000.0); 20]);
        assert_eq!(volume_score(&quiet, &s, 20), 5.0);
    }

    #[test]
    fn test_structure_prefers_choch() {
        let both = StructureEvents {
            bos: Some(event(StructureEventKind::Bos, Direction::Bullish)),
            choch: Some(event(StructureEventKind::Choch, Direction::Bullish)),
        };
        assert_eq!(structure_score(&both, Side::Long), 15.0);
        assert_eq!(structure_score(&both, Side::Short), 0.0);
        let bos_only = StructureEvents {
            bos: Some(event(StructureEventKind::Bos, Direction::Bearish)),
            choch: None,
        };
        assert_eq!(structure_score(&bos_only, Side::Short), 10.0);
    }

    #[test]
    fn test_divergence_only_when_aligned() {
        let bullish = Divergence {
            bullish: true,
            bearish: false,
            description: None,
        };
        assert_eq!(divergence_score(&bullish, Side::Long, 10.0), 10.0);
        assert_eq!(divergence_score(&bullish, Side::Short, 10.0), 0.0);
    }

    #[test]
    fn test_divergence_both_ways_rewards_either_side() {
        let both = Divergence {
            bullish: true,
            bearish: true,
            description: None,
        };
        assert_eq!(divergence_score(&both, Side::Long, 10.0), 10.0);
        assert_eq!(divergence_score(&both, Side::Short, 10.0), 10.0);
    }

    #[test]
    fn test_max_score_is_informational() {
        let result = calculate_score(
            &setup(sweep(true), Side::Long, 1.0),
            None,
            &ohlc_series(&[(100.0, 102.0, 100.0, 102.0)]),
            &Divergence::default(),
            &StructureEvents::default(),
            &SIGNAL_DEFAULTS,
        );
        assert_eq!(result.max_score, 160.0);
        assert!(result.score < result.max_score);
        assert_eq!(result.score, result.breakdown.total().round());
    }

    proptest! {
        #[test]
        fn components_stay_within_caps(
            index in 0usize..10,
            strength in 0.0f64..=1.0,
            flag in any::<bool>(),
            long in any::<bool>(),
            aligned in any::<bool>(),
            align_score in 0.0f64..=1.0,
            last_volume in 0.0f64..20_000.0,
            body in -3.0f64..3.0,
        ) {
            let side = if long { Side::Long } else { Side::Short };
            let mut rows = vec![(100.0, 101.0, 99.0, 100.0, 1000.0); 25];
            let close = 100.0 + body;
            rows.push((100.0, close.max(100.0) + 0.5, close.min(100.0) - 0.5, close, last_volume));
            let candles = ohlcv_series(&rows);
            let alignment = HtfAlignment { aligned, score: align_score, bias: Direction::Bullish };
            let events = StructureEvents {
                bos: Some(event(StructureEventKind::Bos, side.direction())),
                choch: Some(event(StructureEventKind::Choch, side.direction())),
            };
            let divergence = Divergence { bullish: true, bearish: true, description: None };
            let s = setup(kind_at(index, strength, flag), side, strength);

            let result = calculate_score(&s, Some(&alignment), &candles, &divergence, &events, &SIGNAL_DEFAULTS);
            let b = result.breakdown;
            for (value, cap) in [
                (b.htf, HTF_CAP),
                (b.setup, SETUP_CAP),
                (b.candle, CANDLE_CAP),
                (b.volume, VOLUME_CAP),
                (b.divergence, SIGNAL_DEFAULTS.rsi_divergence_bonus),
                (b.structure, STRUCTURE_CAP),
                (b.sweep, SWEEP_CAP),
                (b.retest, RETEST_CAP),
                (b.false_break, FALSE_BREAK_CAP),
            ] {
                prop_assert!(value >= 0.0 && value <= cap, "{} exceeds {}", value, cap);
            }
            prop_assert!(result.score >= 0.0 && result.score <= result.max_score);
        }
    }
}
