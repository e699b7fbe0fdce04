//! Candlestick pattern library.
//!
//! Every detector is a pure function over the trailing one to three candles
//! and returns `None` for no match. Strengths are normalised to `0.0..=1.0`.

use serde::Serialize;
use strum_macros::{Display, EnumIter};

use crate::config::signal::PatternToggles;
use crate::domain::{Candle, Direction};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PatternKind {
    PinBar,
    Engulfing,
    Doji,
    InsideBar,
    MorningStar,
    EveningStar,
    Harami,
    ThreeWhiteSoldiers,
    ThreeBlackCrows,
    Tweezer,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PatternMatch {
    pub kind: PatternKind,
    pub name: &'static str,
    pub direction: Direction,
    pub strength: f64,
}

impl PatternMatch {
    fn new(kind: PatternKind, name: &'static str, direction: Direction, strength: f64) -> Self {
        Self {
            kind,
            name,
            direction,
            strength: strength.clamp(0.0, 1.0),
        }
    }
}

// Thresholds, in percent of the candle range unless noted.
const PIN_BAR_MAX_BODY_PCT: f64 = 30.0;
const PIN_BAR_MIN_WICK_PCT: f64 = 60.0;
const PIN_BAR_MAX_OPPOSING_WICK_PCT: f64 = 20.0;
const DOJI_MAX_BODY_PCT: f64 = 5.0;
const STAR_MAX_BODY_RATIO: f64 = 0.3;
const HARAMI_MAX_BODY_RATIO: f64 = 0.5;
const SOLDIERS_MIN_BODY_RATIO: f64 = 0.5;
const TWEEZER_TOLERANCE: f64 = 0.002;
const WICK_REJECTION_PCT: f64 = 40.0;

fn pct_of_range(part: f64, candle: &Candle) -> f64 {
    part / candle.range() * 100.0
}

fn last_two(candles: &[Candle]) -> Option<(&Candle, &Candle)> {
    match candles {
        [.., prev, cur] => Some((prev, cur)),
        _ => None,
    }
}

fn last_three(candles: &[Candle]) -> Option<(&Candle, &Candle, &Candle)> {
    match candles {
        [.., c1, c2, c3] => Some((c1, c2, c3)),
        _ => None,
    }
}

/// Hammer (long lower wick) or shooting star (long upper wick).
pub fn detect_pin_bar(candle: &Candle) -> Option<PatternMatch> {
    if candle.range() <= 0.0 {
        return None;
    }
    let body_pct = pct_of_range(candle.body(), candle);
    if body_pct >= PIN_BAR_MAX_BODY_PCT {
        return None;
    }
    let upper_pct = pct_of_range(candle.upper_wick(), candle);
    let lower_pct = pct_of_range(candle.lower_wick(), candle);

    if lower_pct > PIN_BAR_MIN_WICK_PCT && upper_pct < PIN_BAR_MAX_OPPOSING_WICK_PCT {
        Some(PatternMatch::new(
            PatternKind::PinBar,
            "Hammer",
            Direction::Bullish,
            lower_pct / 100.0,
        ))
    } else if upper_pct > PIN_BAR_MIN_WICK_PCT && lower_pct < PIN_BAR_MAX_OPPOSING_WICK_PCT {
        Some(PatternMatch::new(
            PatternKind::PinBar,
            "Shooting Star",
            Direction::Bearish,
            upper_pct / 100.0,
        ))
    } else {
        None
    }
}

/// Opposite-coloured body that swallows the prior body. Strength is the body
/// ratio mapped so that 2x or more saturates at 1.0.
pub fn detect_engulfing(candles: &[Candle]) -> Option<PatternMatch> {
    let (prev, cur) = last_two(candles)?;
    if cur.body() <= prev.body() {
        return None;
    }
    let strength = (cur.body() / prev.body()).min(2.0) / 2.0;

    if prev.is_bearish()
        && cur.is_bullish()
        && cur.open_price <= prev.close_price
        && cur.close_price >= prev.open_price
    {
        return Some(PatternMatch::new(
            PatternKind::Engulfing,
            "Bullish Engulfing",
            Direction::Bullish,
            strength,
        ));
    }
    if prev.is_bullish()
        && cur.is_bearish()
        && cur.open_price >= prev.close_price
        && cur.close_price <= prev.open_price
    {
        return Some(PatternMatch::new(
            PatternKind::Engulfing,
            "Bearish Engulfing",
            Direction::Bearish,
            strength,
        ));
    }
    None
}

pub fn detect_doji(candle: &Candle) -> Option<PatternMatch> {
    if candle.range() <= 0.0 {
        return None;
    }
    let body_pct = pct_of_range(candle.body(), candle);
    (body_pct < DOJI_MAX_BODY_PCT).then(|| {
        PatternMatch::new(
            PatternKind::Doji,
            "Doji",
            Direction::Neutral,
            1.0 - body_pct / DOJI_MAX_BODY_PCT,
        )
    })
}

pub fn detect_inside_bar(candles: &[Candle]) -> Option<PatternMatch> {
    let (prev, cur) = last_two(candles)?;
    if prev.range() <= 0.0 {
        return None;
    }
    let inside = cur.high_price <= prev.high_price && cur.low_price >= prev.low_price;
    inside.then(|| {
        PatternMatch::new(
            PatternKind::InsideBar,
            "Inside Bar",
            Direction::Neutral,
            1.0 - cur.range() / prev.range(),
        )
    })
}

/// Bearish candle, small star, bullish candle closing above the first body's midpoint.
pub fn detect_morning_star(candles: &[Candle]) -> Option<PatternMatch> {
    let (c1, c2, c3) = last_three(candles)?;
    if !(c1.is_bearish() && c3.is_bullish()) {
        return None;
    }
    if c2.body() >= c1.body() * STAR_MAX_BODY_RATIO || c3.close_price <= c1.body_midpoint() {
        return None;
    }
    let gapped = c2.high_price < c1.close_price;
    let base = if gapped { 0.9 } else { 0.7 };
    Some(PatternMatch::new(
        PatternKind::MorningStar,
        "Morning Star",
        Direction::Bullish,
        base * c3.body() / c1.body(),
    ))
}

pub fn detect_evening_star(candles: &[Candle]) -> Option<PatternMatch> {
    let (c1, c2, c3) = last_three(candles)?;
    if !(c1.is_bullish() && c3.is_bearish()) {
        return None;
    }
    if c2.body() >= c1.body() * STAR_MAX_BODY_RATIO || c3.close_price >= c1.body_midpoint() {
        return None;
    }
    let gapped = c2.low_price > c1.close_price;
    let base = if gapped { 0.9 } else { 0.7 };
    Some(PatternMatch::new(
        PatternKind::EveningStar,
        "Evening Star",
        Direction::Bearish,
        base * c3.body() / c1.body(),
    ))
}

/// Small opposite-coloured body inside the prior body.
pub fn detect_harami(candles: &[Candle]) -> Option<PatternMatch> {
    let (prev, cur) = last_two(candles)?;
    if prev.body() <= 0.0 {
        return None;
    }
    let (prev_lo, prev_hi) = prev.body_range();
    let (cur_lo, cur_hi) = cur.body_range();
    let inside = cur_lo >= prev_lo && cur_hi <= prev_hi;
    if !inside || cur.body() >= prev.body() * HARAMI_MAX_BODY_RATIO {
        return None;
    }
    let strength = 0.8 * (1.0 - cur.body() / prev.body());

    if prev.is_bearish() && cur.is_bullish() {
        Some(PatternMatch::new(
            PatternKind::Harami,
            "Bullish Harami",
            Direction::Bullish,
            strength,
        ))
    } else if prev.is_bullish() && cur.is_bearish() {
        Some(PatternMatch::new(
            PatternKind::Harami,
            "Bearish Harami",
            Direction::Bearish,
            strength,
        ))
    } else {
        None
    }
}

fn bodies_balanced(c1: &Candle, c2: &Candle, c3: &Candle) -> bool {
    let bodies = [c1.body(), c2.body(), c3.body()];
    let avg = bodies.iter().sum::<f64>() / 3.0;
    let min = bodies.iter().copied().fold(f64::INFINITY, f64::min);
    min >= avg * SOLDIERS_MIN_BODY_RATIO
}

fn opens_inside_body(cur: &Candle, prev: &Candle) -> bool {
    let (lo, hi) = prev.body_range();
    cur.open_price >= lo && cur.open_price <= hi
}

pub fn detect_three_white_soldiers(candles: &[Candle]) -> Option<PatternMatch> {
    let (c1, c2, c3) = last_three(candles)?;
    let matched = c1.is_bullish()
        && c2.is_bullish()
        && c3.is_bullish()
        && c2.close_price > c1.close_price
        && c3.close_price > c2.close_price
        && opens_inside_body(c2, c1)
        && opens_inside_body(c3, c2)
        && bodies_balanced(c1, c2, c3);
    matched.then(|| {
        PatternMatch::new(
            PatternKind::ThreeWhiteSoldiers,
            "Three White Soldiers",
            Direction::Bullish,
            0.85,
        )
    })
}

pub fn detect_three_black_crows(candles: &[Candle]) -> Option<PatternMatch> {
    let (c1, c2, c3) = last_three(candles)?;
    let matched = c1.is_bearish()
        && c2.is_bearish()
        && c3.is_bearish()
        && c2.close_price < c1.close_price
        && c3.close_price < c2.close_price
        && opens_inside_body(c2, c1)
        && opens_inside_body(c3, c2)
        && bodies_balanced(c1, c2, c3);
    matched.then(|| {
        PatternMatch::new(
            PatternKind::ThreeBlackCrows,
            "Three Black Crows",
            Direction::Bearish,
            0.85,
        )
    })
}

/// Matching lows (bottom) or highs (top) within 0.2% and opposite colours.
pub fn detect_tweezer(candles: &[Candle]) -> Option<PatternMatch> {
    let (prev, cur) = last_two(candles)?;
    let tolerance = (cur.close_price + prev.close_price) / 2.0 * TWEEZER_TOLERANCE;

    if (cur.low_price - prev.low_price).abs() <= tolerance && prev.is_bearish() && cur.is_bullish() {
        return Some(PatternMatch::new(
            PatternKind::Tweezer,
            "Tweezer Bottom",
            Direction::Bullish,
            0.75,
        ));
    }
    if (cur.high_price - prev.high_price).abs() <= tolerance && prev.is_bullish() && cur.is_bearish()
    {
        return Some(PatternMatch::new(
            PatternKind::Tweezer,
            "Tweezer Top",
            Direction::Bearish,
            0.75,
        ));
    }
    None
}

type SequenceDetector = fn(&[Candle]) -> Option<PatternMatch>;

fn trailing_pin_bar(candles: &[Candle]) -> Option<PatternMatch> {
    candles.last().and_then(detect_pin_bar)
}

fn trailing_doji(candles: &[Candle]) -> Option<PatternMatch> {
    candles.last().and_then(detect_doji)
}

/// Three-candle shapes first, then two-candle, then single-candle.
const REVERSAL_ORDER: [(PatternKind, SequenceDetector); 10] = [
    (PatternKind::ThreeWhiteSoldiers, detect_three_white_soldiers),
    (PatternKind::ThreeBlackCrows, detect_three_black_crows),
    (PatternKind::MorningStar, detect_morning_star),
    (PatternKind::EveningStar, detect_evening_star),
    (PatternKind::Tweezer, detect_tweezer),
    (PatternKind::Engulfing, detect_engulfing),
    (PatternKind::Harami, detect_harami),
    (PatternKind::InsideBar, detect_inside_bar),
    (PatternKind::PinBar, trailing_pin_bar),
    (PatternKind::Doji, trailing_doji),
];

/// First enabled pattern matching the trailing candles. Needs at least two candles.
pub fn detect_reversal_pattern(candles: &[Candle], toggles: &PatternToggles) -> Option<PatternMatch> {
    if candles.len() < 2 {
        return None;
    }
    REVERSAL_ORDER
        .iter()
        .filter(|(kind, _)| toggles.is_enabled(*kind))
        .find_map(|(_, detect)| detect(candles))
}

/// Shape summary of a single candle used by the scorer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CandleStrength {
    /// Body as a fraction of range.
    pub strength: f64,
    pub direction: Direction,
    /// 0.0 closes on the low, 1.0 on the high.
    pub close_location: f64,
    pub upper_wick_pct: f64,
    pub lower_wick_pct: f64,
    /// Bullish when the lower wick rejects price, bearish for the upper wick.
    pub wick_rejection: Direction,
}

pub fn candle_strength(candle: &Candle) -> CandleStrength {
    if candle.range() <= 0.0 {
        return CandleStrength {
            strength: 0.0,
            direction: Direction::Neutral,
            close_location: 0.5,
            upper_wick_pct: 0.0,
            lower_wick_pct: 0.0,
            wick_rejection: Direction::Neutral,
        };
    }
    let upper_wick_pct = pct_of_range(candle.upper_wick(), candle);
    let lower_wick_pct = pct_of_range(candle.lower_wick(), candle);
    // the upper wick is read first, so two long wicks count as selling pressure
    let wick_rejection = if upper_wick_pct > WICK_REJECTION_PCT {
        Direction::Bearish
    } else if lower_wick_pct > WICK_REJECTION_PCT {
        Direction::Bullish
    } else {
        Direction::Neutral
    };
    let direction = if candle.is_bullish() {
        Direction::Bullish
    } else if candle.is_bearish() {
        Direction::Bearish
    } else {
        Direction::Neutral
    };

    CandleStrength {
        strength: pct_of_range(candle.body(), candle) / 100.0,
        direction,
        close_location: (candle.close_price - candle.low_price) / candle.range(),
        upper_wick_pct,
        lower_wick_pct,
        wick_rejection,
    }
}
