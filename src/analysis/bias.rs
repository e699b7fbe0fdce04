//! Higher-timeframe bias from per-timeframe trends.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::analysis::structure::Trend;
use crate::domain::{Direction, Side};

const FULL_AGREEMENT_SCORE: f64 = 1.0;
const MAJORITY_SCORE: f64 = 0.6;
const NEUTRAL_SCORE: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HtfBias {
    pub bias: Direction,
    /// Confidence in `0.0..=1.0`.
    pub score: f64,
    /// True when every contributing timeframe agrees.
    pub alignment: bool,
    pub trends: BTreeMap<String, Trend>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HtfAlignment {
    pub aligned: bool,
    pub score: f64,
    pub bias: Direction,
}

/// Combine the trend of each higher timeframe.
///
/// All up (or all down) gives full confidence; a strict majority gives 0.6;
/// ties, neutral-only and empty input give a neutral bias.
pub fn determine_htf_bias(trends: &BTreeMap<String, Trend>) -> HtfBias {
    let ups = trends.values().filter(|t| **t == Trend::Up).count();
    let downs = trends.values().filter(|t| **t == Trend::Down).count();
    let total = trends.len();

    let (bias, score, alignment) = if total > 0 && ups == total {
        (Direction::Bullish, FULL_AGREEMENT_SCORE, true)
    } else if total > 0 && downs == total {
        (Direction::Bearish, FULL_AGREEMENT_SCORE, true)
    } else if ups > downs {
        (Direction::Bullish, MAJORITY_SCORE, false)
    } else if downs > ups {
        (Direction::Bearish, MAJORITY_SCORE, false)
    } else {
        (Direction::Neutral, NEUTRAL_SCORE, false)
    };

    HtfBias {
        bias,
        score,
        alignment,
        trends: trends.clone(),
    }
}

/// Does `side` trade with the bias? Confidence flips to `1 - score` against it.
pub fn check_htf_alignment(side: Side, bias: &HtfBias) -> HtfAlignment {
    if bias.bias == Direction::Neutral {
        return HtfAlignment {
            aligned: false,
            score: NEUTRAL_SCORE,
            bias: bias.bias,
        };
    }
    let aligned = bias.bias.matches(side);
    HtfAlignment {
        aligned,
        score: if aligned { bias.score } else { 1.0 - bias.score },
        bias: bias.bias,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trends(pairs: &[(&str, Trend)]) -> BTreeMap<String, Trend> {
        pairs.iter().map(|(tf, t)| (tf.to_string(), *t)).collect()
    }

    #[test]
    fn test_full_agreement() {
        let bias = determine_htf_bias(&trends(&[("1d", Trend::Up), ("4h", Trend::Up)]));
        assert_eq!(bias.bias, Direction::Bullish);
        assert!(bias.alignment);
        assert!((bias.score - 1.0).abs() < 1e-12);

        let long = check_htf_alignment(Side::Long, &bias);
        assert!(long.aligned);
        let short = check_htf_alignment(Side::Short, &bias);
        assert!(!short.aligned);
        assert!(short.score.abs() < 1e-12);
    }

    #[test]
    fn test_partial_and_conflicting() {
        let partial = determine_htf_bias(&trends(&[("1d", Trend::Down), ("4h", Trend::Neutral)]));
        assert_eq!(partial.bias, Direction::Bearish);
        assert!(!partial.alignment);
        assert!((partial.score - 0.6).abs() < 1e-12);
        let short = check_htf_alignment(Side::Short, &partial);
        assert!(short.aligned);
        assert!((short.score - 0.6).abs() < 1e-12);

        let conflict = determine_htf_bias(&trends(&[("1d", Trend::Up), ("4h", Trend::Down)]));
        assert_eq!(conflict.bias, Direction::Neutral);
        let a = check_htf_alignment(Side::Long, &conflict);
        assert!(!a.aligned);
        assert!((a.score - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_empty_is_neutral() {
        let bias = determine_htf_bias(&BTreeMap::new());
        assert_eq!(bias.bias, Direction::Neutral);
        assert!(!bias.alignment);
    }
}
