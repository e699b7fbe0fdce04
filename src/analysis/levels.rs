//! Entry, stop and target levels for a setup.

use serde::Serialize;

use crate::domain::Side;
use crate::models::setup::Setup;
use crate::models::zone::Zone;

/// Stop distance, in percent of entry, when no zone sits behind the entry.
pub const DEFAULT_FALLBACK_STOP_PCT: f64 = 1.0;

/// Risk multiples used for targets no zone provides.
const TARGET_MULTIPLES: [f64; 3] = [1.5, 3.0, 4.5];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Levels {
    pub entry: f64,
    pub stop_loss: f64,
    pub take_profit1: f64,
    pub take_profit2: f64,
    pub take_profit3: f64,
    pub risk_reward1: f64,
    pub risk_reward2: f64,
    pub risk_reward3: f64,
    pub sl_zone: Option<Zone>,
    pub tp_zones: Vec<Zone>,
}

pub fn calculate_levels(setup: &Setup, sl_buffer_pct: f64) -> Levels {
    calculate_levels_with(setup, sl_buffer_pct, DEFAULT_FALLBACK_STOP_PCT)
}

/// Stop just beyond the nearest zone behind the entry, targets at the next
/// zones ahead of it, topped up with risk multiples.
pub fn calculate_levels_with(setup: &Setup, sl_buffer_pct: f64, fallback_stop_pct: f64) -> Levels {
    let entry = setup.price;
    let sign = match setup.side {
        Side::Long => 1.0,
        Side::Short => -1.0,
    };

    let sl_zone = stop_zone(setup);
    let stop_loss = match (&sl_zone, setup.side) {
        (Some(z), Side::Long) => z.lower * (1.0 - sl_buffer_pct / 100.0),
        (Some(z), Side::Short) => z.upper * (1.0 + sl_buffer_pct / 100.0),
        (None, _) => entry * (1.0 - sign * fallback_stop_pct / 100.0),
    };
    let risk = (entry - stop_loss).abs();

    let tp_zones = target_zones(setup);
    let mut targets = [0.0; 3];
    for i in 0..TARGET_MULTIPLES.len() {
        targets[i] = match tp_zones.get(i) {
            Some(zone) => zone.center,
            None => {
                let candidate = entry + sign * TARGET_MULTIPLES[i] * risk;
                match i.checked_sub(1).map(|p| (targets[p], TARGET_MULTIPLES[p])) {
                    Some((prev, prev_mult)) if sign * (candidate - prev) <= 0.0 => {
                        prev + sign * (TARGET_MULTIPLES[i] - prev_mult) * risk
                    }
                    _ => candidate,
                }
            }
        };
    }

    let rr = |target: f64| {
        if risk > 0.0 {
            (target - entry).abs() / risk
        } else {
            0.0
        }
    };

    Levels {
        entry,
        stop_loss,
        take_profit1: targets[0],
        take_profit2: targets[1],
        take_profit3: targets[2],
        risk_reward1: rr(targets[0]),
        risk_reward2: rr(targets[1]),
        risk_reward3: rr(targets[2]),
        sl_zone,
        tp_zones,
    }
}

/// Nearest protecting zone: highest lower bound below a long entry, lowest
/// upper bound above a short entry. The setup's own zone always qualifies.
fn stop_zone(setup: &Setup) -> Option<Zone> {
    let entry = setup.price;
    let own = setup.zone.iter();
    match setup.side {
        Side::Long => setup
            .zones
            .support
            .iter()
            .chain(own)
            .filter(|z| z.lower < entry)
            .max_by(|a, b| a.lower.total_cmp(&b.lower))
            .cloned(),
        Side::Short => setup
            .zones
            .resistance
            .iter()
            .chain(own)
            .filter(|z| z.upper > entry)
            .min_by(|a, b| a.upper.total_cmp(&b.upper))
            .cloned(),
    }
}

/// Up to three opposing zones beyond the entry, nearest first.
fn target_zones(setup: &Setup) -> Vec<Zone> {
    let entry = setup.price;
    let mut zones: Vec<Zone> = match setup.side {
        Side::Long => setup
            .zones
            .resistance
            .iter()
            .filter(|z| z.center > entry)
            .cloned()
            .collect(),
        Side::Short => setup
            .zones
            .support
            .iter()
            .filter(|z| z.center < entry)
            .cloned()
            .collect(),
    };
    zones.sort_by(|a, b| (a.center - entry).abs().total_cmp(&(b.center - entry).abs()));
    zones.truncate(TARGET_MULTIPLES.len());
    zones
}
