use serde::Serialize;
use strum_macros::{Display, EnumString};

use crate::utils::maths_utils::format_price;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ZoneKind {
    Support,
    Resistance,
}

/// A support or resistance band built from clustered pivot prices.
/// Bounds and center are fixed at construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Zone {
    pub kind: ZoneKind,
    pub lower: f64,
    pub upper: f64,
    pub center: f64,
    pub touch_count: usize,
    /// Index (within the analysed window) of the oldest pivot in the cluster.
    pub first_index: usize,
}

impl Zone {
    /// Check if a price is within this zone
    pub fn contains(&self, price: f64) -> bool {
        price >= self.lower && price <= self.upper
    }

    /// Distance from price to zone center
    pub fn distance_to(&self, price: f64) -> f64 {
        (self.center - price).abs()
    }

    /// Inside the band widened by `tolerance_pct` percent on each side.
    /// Single-pivot zones have zero width, so touching always needs some slack.
    pub fn is_touching(&self, price: f64, tolerance_pct: f64) -> bool {
        let slack = tolerance_pct / 100.0;
        price >= self.lower * (1.0 - slack) && price <= self.upper * (1.0 + slack)
    }

    /// Stable identifier used in cooldown keys, e.g. `support_43250`.
    pub fn key(&self) -> String {
        format!("{}_{}", self.kind, format_price(self.center))
    }

    pub fn overlaps(&self, other: &Zone) -> bool {
        self.lower <= other.upper && other.lower <= self.upper
    }
}

/// Zones produced by one build, recomputed fresh per evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ZoneSet {
    pub support: Vec<Zone>,
    pub resistance: Vec<Zone>,
}

impl ZoneSet {
    pub fn len(&self) -> usize {
        self.support.len() + self.resistance.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn of_kind(&self, kind: ZoneKind) -> &[Zone] {
        match kind {
            ZoneKind::Support => &self.support,
            ZoneKind::Resistance => &self.resistance,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Zone> {
        self.support.iter().chain(self.resistance.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[test]
    fn test_touching_uses_tolerance() {
        let z = zone(ZoneKind::Support, 100.0, 100.0);
        assert!(!z.contains(100.3));
        assert!(z.is_touching(100.3, 0.5));
        assert!(!z.is_touching(100.6, 0.5));
        assert!(z.is_touching(99.6, 0.5));
    }

    #[test]
    fn test_key_format() {
        let z = zone(ZoneKind::Support, 43200.0, 43300.0);
        assert_eq!(z.key(), "support_43250");
        let r = zone(ZoneKind::Resistance, 1.2, 1.3);
        assert_eq!(r.key(), "resistance_1.2500");
    }

    #[test]
    fn test_zone_set_counts_both_sides() {
        let set = ZoneSet {
            support: vec![zone(ZoneKind::Support, 1.0, 2.0)],
            resistance: vec![zone(ZoneKind::Resistance, 3.0, 4.0), zone(ZoneKind::Resistance, 5.0, 6.0)],
        };
        assert_eq!(set.len(), 3);
        assert_eq!(set.of_kind(ZoneKind::Resistance).len(), 2);
        assert!(!set.support[0].overlaps(&set.resistance[0]));
    }
}
