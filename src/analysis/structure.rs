//! Market structure from swing pivots, plus Break-of-Structure (BOS) and
//! Change-of-Character (CHOCH) detection.

use serde::Serialize;
use strum_macros::Display;

use crate::analysis::pivots::{recent_pivot_highs, recent_pivot_lows};
use crate::config::DEBUG_FLAGS;
use crate::domain::{Candle, Direction};

/// Below this many candles structure is always neutral.
pub const MIN_STRUCTURE_CANDLES: usize = 20;

/// Pivots of each kind considered when classifying structure.
const STRUCTURE_PIVOT_COUNT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
pub enum StructureState {
    #[serde(rename = "neutral")]
    #[strum(serialize = "neutral")]
    Neutral,
    #[serde(rename = "HH_HL")]
    #[strum(serialize = "HH_HL")]
    HigherHighHigherLow,
    #[serde(rename = "LH_LL")]
    #[strum(serialize = "LH_LL")]
    LowerHighLowerLow,
    #[serde(rename = "HH_LL")]
    #[strum(serialize = "HH_LL")]
    HigherHighLowerLow,
    #[serde(rename = "LH_HL")]
    #[strum(serialize = "LH_HL")]
    LowerHighHigherLow,
}

impl StructureState {
    fn leans_down(self) -> bool {
        matches!(self, Self::LowerHighLowerLow | Self::HigherHighLowerLow)
    }

    fn leans_up(self) -> bool {
        matches!(self, Self::HigherHighHigherLow | Self::LowerHighHigherLow)
    }
}

/// The swing prices whose break defines BOS/CHOCH.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SwingLevels {
    pub last_high: f64,
    pub prev_high: f64,
    pub last_low: f64,
    pub prev_low: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MarketStructure {
    pub state: StructureState,
    /// Absent when the state is neutral for lack of pivots.
    pub swings: Option<SwingLevels>,
}

impl MarketStructure {
    const NEUTRAL: MarketStructure = MarketStructure {
        state: StructureState::Neutral,
        swings: None,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum StructureEventKind {
    Bos,
    Choch,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StructureEvent {
    pub kind: StructureEventKind,
    pub direction: Direction,
    /// Close of the breaking candle.
    pub price: f64,
    pub broken_level: f64,
    pub candle_index: usize,
    pub timestamp: i64,
    pub prev_state: StructureState,
}

/// Most recent BOS and CHOCH found by a windowed scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StructureEvents {
    pub bos: Option<StructureEvent>,
    pub choch: Option<StructureEvent>,
}

fn last_two_prices(prices: &[f64]) -> Option<(f64, f64)> {
    match prices {
        [.., prev, last] => Some((*prev, *last)),
        _ => None,
    }
}

fn swing_levels(candles: &[Candle], window: usize) -> Option<SwingLevels> {
    let highs: Vec<f64> = recent_pivot_highs(candles, window, STRUCTURE_PIVOT_COUNT)
        .iter()
        .map(|p| p.price)
        .collect();
    let lows: Vec<f64> = recent_pivot_lows(candles, window, STRUCTURE_PIVOT_COUNT)
        .iter()
        .map(|p| p.price)
        .collect();
    let (prev_high, last_high) = last_two_prices(&highs)?;
    let (prev_low, last_low) = last_two_prices(&lows)?;
    Some(SwingLevels {
        last_high,
        prev_high,
        last_low,
        prev_low,
    })
}

/// Coarse trend: up on HH+HL, down on LH+LL, otherwise neutral.
pub fn analyze_market_structure(candles: &[Candle], window: usize) -> Trend {
    if candles.len() < MIN_STRUCTURE_CANDLES {
        return Trend::Neutral;
    }
    let Some(s) = swing_levels(candles, window) else {
        return Trend::Neutral;
    };
    if s.last_high > s.prev_high && s.last_low > s.prev_low {
        Trend::Up
    } else if s.last_high < s.prev_high && s.last_low < s.prev_low {
        Trend::Down
    } else {
        Trend::Neutral
    }
}

/// Classify the two latest pivots of each kind. Only strict moves count, so
/// an equal high or low leaves the state neutral.
pub fn market_structure_state(candles: &[Candle], window: usize) -> MarketStructure {
    if candles.len() < MIN_STRUCTURE_CANDLES {
        return MarketStructure::NEUTRAL;
    }
    let Some(swings) = swing_levels(candles, window) else {
        return MarketStructure::NEUTRAL;
    };
    let higher_high = swings.last_high > swings.prev_high;
    let lower_high = swings.last_high < swings.prev_high;
    let higher_low = swings.last_low > swings.prev_low;
    let lower_low = swings.last_low < swings.prev_low;
    let state = if higher_high && higher_low {
        StructureState::HigherHighHigherLow
    } else if lower_high && lower_low {
        StructureState::LowerHighLowerLow
    } else if higher_high && lower_low {
        StructureState::HigherHighLowerLow
    } else if lower_high && higher_low {
        StructureState::LowerHighHigherLow
    } else {
        StructureState::Neutral
    };
    MarketStructure {
        state,
        swings: Some(swings),
    }
}

fn event(
    kind: StructureEventKind,
    direction: Direction,
    candles: &[Candle],
    broken_level: f64,
    prev_state: StructureState,
) -> Option<StructureEvent> {
    let candle = candles.last()?;
    Some(StructureEvent {
        kind,
        direction,
        price: candle.close_price,
        broken_level,
        candle_index: candles.len() - 1,
        timestamp: candle.close_time,
        prev_state,
    })
}

/// Trend-following break by the latest close.
pub fn detect_bos(candles: &[Candle], structure: &MarketStructure) -> Option<StructureEvent> {
    let swings = structure.swings?;
    let close = candles.last()?.close_price;
    match structure.state {
        StructureState::HigherHighHigherLow if close > swings.last_high => event(
            StructureEventKind::Bos,
            Direction::Bullish,
            candles,
            swings.last_high,
            structure.state,
        ),
        StructureState::LowerHighLowerLow if close < swings.last_low => event(
            StructureEventKind::Bos,
            Direction::Bearish,
            candles,
            swings.last_low,
            structure.state,
        ),
        _ => None,
    }
}

/// Counter-trend break: the latest close crosses the opposite swing while the
/// previous close had not.
pub fn detect_choch(candles: &[Candle], structure: &MarketStructure) -> Option<StructureEvent> {
    let swings = structure.swings?;
    let [.., prev, cur] = candles else {
        return None;
    };
    if structure.state.leans_down()
        && cur.close_price > swings.last_high
        && prev.close_price <= swings.last_high
    {
        return event(
            StructureEventKind::Choch,
            Direction::Bullish,
            candles,
            swings.last_high,
            structure.state,
        );
    }
    if structure.state.leans_up()
        && cur.close_price < swings.last_low
        && prev.close_price >= swings.last_low
    {
        return event(
            StructureEventKind::Choch,
            Direction::Bearish,
            candles,
            swings.last_low,
            structure.state,
        );
    }
    None
}

/// Recompute structure on each growing prefix ending in the last `lookback`
/// candles and keep the latest BOS and CHOCH seen.
pub fn detect_recent_structure_events(
    candles: &[Candle],
    window: usize,
    lookback: usize,
) -> StructureEvents {
    let n = candles.len();
    let mut events = StructureEvents::default();
    if n < MIN_STRUCTURE_CANDLES {
        return events;
    }

    let start = n.saturating_sub(lookback).max(MIN_STRUCTURE_CANDLES);
    for end in start..n {
        let prefix = &candles[..=end];
        let structure = market_structure_state(prefix, window);
        if let Some(bos) = detect_bos(prefix, &structure) {
            events.bos = Some(bos);
        }
        if let Some(choch) = detect_choch(prefix, &structure) {
            events.choch = Some(choch);
        }
    }

    #[cfg(debug_assertions)]
    if DEBUG_FLAGS.print_structure_events && (events.bos.is_some() || events.choch.is_some()) {
        log::debug!("Structure events: {:?}", events);
    }

    events
}
