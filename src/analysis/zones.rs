//! Support/resistance zones from clustered pivots.

use crate::analysis::pivots::{Pivot, detect_pivot_highs, detect_pivot_lows};
use crate::config::DEBUG_FLAGS;
use crate::domain::Candle;
use crate::models::zone::{Zone, ZoneKind, ZoneSet};
use crate::utils::maths_utils::{get_min_max, mean, pct_distance};

/// Build zones from the last `lookback` candles.
///
/// 1. Pivot highs feed resistance, pivot lows feed support.
/// 2. Prices are sorted and walked in order. A price joins the open cluster
///    while it sits within `tolerance_pct`% of the cluster's running center.
/// 3. Each side is returned oldest-pivot-first.
pub fn build_zones(
    candles: &[Candle],
    lookback: usize,
    window: usize,
    tolerance_pct: f64,
) -> ZoneSet {
    let start = candles.len().saturating_sub(lookback);
    let recent = &candles[start..];

    let zones = ZoneSet {
        support: cluster_pivots(&detect_pivot_lows(recent, window), ZoneKind::Support, tolerance_pct),
        resistance: cluster_pivots(
            &detect_pivot_highs(recent, window),
            ZoneKind::Resistance,
            tolerance_pct,
        ),
    };

    #[cfg(debug_assertions)]
    if DEBUG_FLAGS.print_zone_build {
        log::debug!(
            "Zones rebuilt over {} candles: {} support, {} resistance",
            recent.len(),
            zones.support.len(),
            zones.resistance.len()
        );
    }

    zones
}

/// Cluster pivot prices of one kind into non-overlapping zones.
pub fn cluster_pivots(pivots: &[Pivot], kind: ZoneKind, tolerance_pct: f64) -> Vec<Zone> {
    if pivots.is_empty() {
        return Vec::new();
    }

    let mut sorted: Vec<Pivot> = pivots.to_vec();
    sorted.sort_by(|a, b| a.price.total_cmp(&b.price));

    let mut zones = Vec::new();
    let mut members: Vec<Pivot> = Vec::new();

    let finalize_cluster = |members: &[Pivot]| -> Zone {
        let prices: Vec<f64> = members.iter().map(|p| p.price).collect();
        let (lower, upper) = get_min_max(&prices);
        Zone {
            kind,
            lower,
            upper,
            center: mean(&prices).clamp(lower, upper),
            touch_count: members.len(),
            first_index: members.iter().map(|p| p.index).min().unwrap_or(0),
        }
    };

    for pivot in sorted {
        if !members.is_empty() {
            let center = members.iter().map(|p| p.price).sum::<f64>() / members.len() as f64;
            if pct_distance(pivot.price, center) > tolerance_pct {
                zones.push(finalize_cluster(&members));
                members.clear();
            }
        }
        members.push(pivot);
    }
    zones.push(finalize_cluster(&members));

    zones.sort_by_key(|z| z.first_index);
    zones
}

/// Closest zone by center within `max_distance_pct` percent of `price`.
pub fn nearest_zone(price: f64, zones: &[Zone], max_distance_pct: f64) -> Option<&Zone> {
    zones
        .iter()
        .filter(|z| pct_distance(z.center, price) <= max_distance_pct)
        .min_by(|a, b| a.distance_to(price).total_cmp(&b.distance_to(price)))
}
