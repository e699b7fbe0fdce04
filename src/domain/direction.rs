use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Trade direction of a setup or signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    /// The directional lean a side needs from patterns, structure and bias.
    pub fn direction(self) -> Direction {
        match self {
            Side::Long => Direction::Bullish,
            Side::Short => Direction::Bearish,
        }
    }

    pub fn opposite(self) -> Side {
        match self {
            Side::Long => Side::Short,
            Side::Short => Side::Long,
        }
    }
}

/// Lean of a pattern, event or bias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
    Bullish,
    Bearish,
    Neutral,
}

impl Direction {
    pub fn matches(self, side: Side) -> bool {
        self == side.direction()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_display_matches_wire_format() {
        assert_eq!(Side::Long.to_string(), "LONG");
        assert_eq!(serde_json::to_string(&Side::Short).unwrap(), "\"SHORT\"");
        assert!(Direction::Bullish.matches(Side::Long));
        assert!(!Direction::Neutral.matches(Side::Short));
    }
}
