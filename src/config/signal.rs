//! Detection, scoring and cooldown tunables.
//!
//! `SIGNAL_DEFAULTS` is the master copy. Per-instrument overrides are layered
//! over it by [`crate::config::markets::MarketConfigs`].

use serde::{Deserialize, Serialize};

use super::error::ConfigError;
use crate::analysis::patterns::PatternKind;

/// Per-pattern enable switches consulted by `detect_reversal_pattern`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternToggles {
    pub pin_bar: bool,
    pub engulfing: bool,
    pub doji: bool,
    pub inside_bar: bool,
    pub morning_star: bool,
    pub evening_star: bool,
    pub harami: bool,
    pub three_white_soldiers: bool,
    pub three_black_crows: bool,
    pub tweezer: bool,
}

impl PatternToggles {
    pub const ALL: PatternToggles = PatternToggles {
        pin_bar: true,
        engulfing: true,
        doji: true,
        inside_bar: true,
        morning_star: true,
        evening_star: true,
        harami: true,
        three_white_soldiers: true,
        three_black_crows: true,
        tweezer: true,
    };

    pub fn is_enabled(&self, kind: PatternKind) -> bool {
        match kind {
            PatternKind::PinBar => self.pin_bar,
            PatternKind::Engulfing => self.engulfing,
            PatternKind::Doji => self.doji,
            PatternKind::InsideBar => self.inside_bar,
            PatternKind::MorningStar => self.morning_star,
            PatternKind::EveningStar => self.evening_star,
            PatternKind::Harami => self.harami,
            PatternKind::ThreeWhiteSoldiers => self.three_white_soldiers,
            PatternKind::ThreeBlackCrows => self.three_black_crows,
            PatternKind::Tweezer => self.tweezer,
        }
    }
}

impl Default for PatternToggles {
    fn default() -> Self {
        Self::ALL
    }
}

/// Multipliers applied to the reversal bonus in setup-quality scoring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternWeights {
    pub pin_bar: f64,
    pub engulfing: f64,
    pub doji: f64,
    pub inside_bar: f64,
    pub morning_star: f64,
    pub evening_star: f64,
    pub harami: f64,
    pub three_white_soldiers: f64,
    pub three_black_crows: f64,
    pub tweezer: f64,
}

impl PatternWeights {
    pub const STANDARD: PatternWeights = PatternWeights {
        pin_bar: 1.0,
        engulfing: 1.1,
        doji: 0.5,
        inside_bar: 0.6,
        morning_star: 1.2,
        evening_star: 1.2,
        harami: 0.8,
        three_white_soldiers: 1.0,
        three_black_crows: 1.0,
        tweezer: 0.9,
    };

    pub fn weight(&self, kind: PatternKind) -> f64 {
        match kind {
            PatternKind::PinBar => self.pin_bar,
            PatternKind::Engulfing => self.engulfing,
            PatternKind::Doji => self.doji,
            PatternKind::InsideBar => self.inside_bar,
            PatternKind::MorningStar => self.morning_star,
            PatternKind::EveningStar => self.evening_star,
            PatternKind::Harami => self.harami,
            PatternKind::ThreeWhiteSoldiers => self.three_white_soldiers,
            PatternKind::ThreeBlackCrows => self.three_black_crows,
            PatternKind::Tweezer => self.tweezer,
        }
    }
}

impl Default for PatternWeights {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// The flat record of tunables every detector, the scorer and the cooldown
/// engine read from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    // Pivots and zones
    pub pivot_window: usize,
    pub zone_lookback: usize,
    pub zone_tolerance_pct: f64,
    pub min_zones_required: usize,
    // Max distance (percent of price) for the legacy reversal's nearest-zone lookup
    pub nearest_zone_max_distance_pct: f64,

    // Volume context
    pub volume_period: usize,
    pub volume_spike_threshold: f64,
    // When set, a liquidity sweep also needs a volume spike
    pub require_volume_confirmation: bool,

    // Liquidity sweep and trap
    pub sweep_pct: f64,
    pub reclaim_pct: f64,
    pub wick_rejection_min: f64,

    // Breakout -> retest -> confirmation chain
    pub breakout_lookback: usize,
    pub retest_max_bars: usize,
    pub confirmation_window: usize,

    // Structure, volatility and momentum
    pub structure_lookback: usize,
    pub atr_period: usize,
    pub atr_spike_ratio: f64,
    pub rsi_period: usize,
    pub rsi_divergence_bonus: f64,
    pub require_htf_alignment: bool,

    // Acceptance
    pub entry_score_threshold: f64,
    pub min_rr: f64,
    pub zone_sl_buffer_pct: f64,
    pub fallback_stop_pct: f64,

    // Cooldown
    pub cooldown_minutes: i64,
    pub cooldown_bypass_on_choch: bool,
    pub strong_setup_bypass_strength: f64,

    pub patterns: PatternToggles,
    pub pattern_weights: PatternWeights,
}

pub const SIGNAL_DEFAULTS: SignalConfig = SignalConfig {
    pivot_window: 5,
    zone_lookback: 100,
    zone_tolerance_pct: 0.5,
    min_zones_required: 2,
    nearest_zone_max_distance_pct: 1.0,

    volume_period: 20,
    volume_spike_threshold: 1.5,
    require_volume_confirmation: false,

    sweep_pct: 0.3,
    reclaim_pct: 0.2,
    wick_rejection_min: 0.5,

    breakout_lookback: 10,
    retest_max_bars: 4,
    confirmation_window: 2,

    structure_lookback: 10,
    atr_period: 14,
    atr_spike_ratio: 1.5,
    rsi_period: 14,
    rsi_divergence_bonus: 10.0,
    require_htf_alignment: true,

    entry_score_threshold: 70.0,
    min_rr: 1.5,
    zone_sl_buffer_pct: 0.2,
    fallback_stop_pct: 1.0,

    cooldown_minutes: 90,
    cooldown_bypass_on_choch: true,
    strong_setup_bypass_strength: 0.6,

    patterns: PatternToggles::ALL,
    pattern_weights: PatternWeights::STANDARD,
};

impl Default for SignalConfig {
    fn default() -> Self {
        SIGNAL_DEFAULTS
    }
}

impl SignalConfig {
    /// Reject values that would make detection meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pivot_window == 0 {
            return Err(ConfigError::invalid("pivot_window", "must be at least 1"));
        }
        if self.zone_lookback < 2 * self.pivot_window + 1 {
            return Err(ConfigError::invalid(
                "zone_lookback",
                format!("must cover at least {} candles", 2 * self.pivot_window + 1),
            ));
        }
        for (field, value) in [
            ("zone_tolerance_pct", self.zone_tolerance_pct),
            ("sweep_pct", self.sweep_pct),
            ("reclaim_pct", self.reclaim_pct),
            ("zone_sl_buffer_pct", self.zone_sl_buffer_pct),
            ("rsi_divergence_bonus", self.rsi_divergence_bonus),
            ("entry_score_threshold", self.entry_score_threshold),
            ("nearest_zone_max_distance_pct", self.nearest_zone_max_distance_pct),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::invalid(field, format!("{value} is not >= 0")));
            }
        }
        if !(0.0..=1.0).contains(&self.wick_rejection_min) {
            return Err(ConfigError::invalid("wick_rejection_min", "must be within 0..=1"));
        }
        if !(self.fallback_stop_pct > 0.0 && self.fallback_stop_pct < 100.0) {
            return Err(ConfigError::invalid("fallback_stop_pct", "must be within (0, 100)"));
        }
        if self.min_rr <= 0.0 {
            return Err(ConfigError::invalid("min_rr", "must be positive"));
        }
        if self.cooldown_minutes <= 0 {
            return Err(ConfigError::invalid("cooldown_minutes", "must be positive"));
        }
        if self.atr_period == 0 || self.rsi_period == 0 || self.volume_period == 0 {
            return Err(ConfigError::invalid(
                "atr_period/rsi_period/volume_period",
                "periods must be at least 1",
            ));
        }
        if self.retest_max_bars == 0 || self.breakout_lookback == 0 {
            return Err(ConfigError::invalid(
                "retest_max_bars/breakout_lookback",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert_eq!(SignalConfig::default(), SIGNAL_DEFAULTS);
        assert!(SIGNAL_DEFAULTS.validate().is_ok());
    }

    #[test]
    fn test_missing_fields_fall_back_to_defaults() {
        let cfg: SignalConfig = serde_json::from_str(r#"{"pivot_window": 3}"#).unwrap();
        assert_eq!(cfg.pivot_window, 3);
        assert_eq!(cfg.cooldown_minutes, 90);
        assert!(cfg.patterns.tweezer);
    }

    #[test]
    fn test_rejects_short_lookback() {
        let cfg = SignalConfig {
            pivot_window: 10,
            zone_lookback: 15,
            ..SIGNAL_DEFAULTS
        };
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { field: "zone_lookback", .. }));
    }

    #[test]
    fn test_toggles_gate_by_kind() {
        let toggles = PatternToggles {
            doji: false,
            ..PatternToggles::ALL
        };
        assert!(!toggles.is_enabled(PatternKind::Doji));
        assert!(toggles.is_enabled(PatternKind::Harami));
        assert!((PatternWeights::STANDARD.weight(PatternKind::MorningStar) - 1.2).abs() < 1e-12);
    }

    #[test]
    fn test_every_pattern_enabled_and_weighted_by_default() {
        use strum::IntoEnumIterator;
        for kind in PatternKind::iter() {
            assert!(PatternToggles::default().is_enabled(kind), "{kind} disabled");
            assert!(PatternWeights::STANDARD.weight(kind) > 0.0, "{kind} unweighted");
        }
    }
}
