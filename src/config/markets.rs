//! Per-instrument overrides layered over the global tunables.
//!
//! Document shape (JSON):
//! ```json
//! { "_defaults": { "cooldown_minutes": 60 },
//!   "BTCUSDT":   { "zone_tolerance_pct": 0.3 } }
//! ```
//! Resolution order is `global <- _defaults <- instrument`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::error::ConfigError;
use super::signal::{PatternToggles, PatternWeights, SignalConfig};

/// A sparse copy of [`SignalConfig`]. Absent fields leave the layer below untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalOverrides {
    pub pivot_window: Option<usize>,
    pub zone_lookback: Option<usize>,
    pub zone_tolerance_pct: Option<f64>,
    pub min_zones_required: Option<usize>,
    pub nearest_zone_max_distance_pct: Option<f64>,
    pub volume_period: Option<usize>,
    pub volume_spike_threshold: Option<f64>,
    pub require_volume_confirmation: Option<bool>,
    pub sweep_pct: Option<f64>,
    pub reclaim_pct: Option<f64>,
    pub wick_rejection_min: Option<f64>,
    pub breakout_lookback: Option<usize>,
    pub retest_max_bars: Option<usize>,
    pub confirmation_window: Option<usize>,
    pub structure_lookback: Option<usize>,
    pub atr_period: Option<usize>,
    pub atr_spike_ratio: Option<f64>,
    pub rsi_period: Option<usize>,
    pub rsi_divergence_bonus: Option<f64>,
    pub require_htf_alignment: Option<bool>,
    pub entry_score_threshold: Option<f64>,
    pub min_rr: Option<f64>,
    pub zone_sl_buffer_pct: Option<f64>,
    pub fallback_stop_pct: Option<f64>,
    pub cooldown_minutes: Option<i64>,
    pub cooldown_bypass_on_choch: Option<bool>,
    pub strong_setup_bypass_strength: Option<f64>,
    pub patterns: Option<PatternToggles>,
    pub pattern_weights: Option<PatternWeights>,
}

macro_rules! apply_overrides {
    ($base:expr, $layer:expr, $($field:ident),+ $(,)?) => {
        $(
            if let Some(value) = $layer.$field {
                $base.$field = value;
            }
        )+
    };
}

impl SignalOverrides {
    /// Write every present field over `base`.
    pub fn apply(&self, base: &mut SignalConfig) {
        apply_overrides!(
            base,
            self,
            pivot_window,
            zone_lookback,
            zone_tolerance_pct,
            min_zones_required,
            nearest_zone_max_distance_pct,
            volume_period,
            volume_spike_threshold,
            require_volume_confirmation,
            sweep_pct,
            reclaim_pct,
            wick_rejection_min,
            breakout_lookback,
            retest_max_bars,
            confirmation_window,
            structure_lookback,
            atr_period,
            atr_spike_ratio,
            rsi_period,
            rsi_divergence_bonus,
            require_htf_alignment,
            entry_score_threshold,
            min_rr,
            zone_sl_buffer_pct,
            fallback_stop_pct,
            cooldown_minutes,
            cooldown_bypass_on_choch,
            strong_setup_bypass_strength,
            patterns,
            pattern_weights,
        );
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketConfigs {
    #[serde(rename = "_defaults", default)]
    pub defaults: SignalOverrides,
    #[serde(flatten)]
    pub markets: HashMap<String, SignalOverrides>,
}

impl MarketConfigs {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Layered merge: `global <- _defaults <- instrument`.
    pub fn resolve(&self, global: &SignalConfig, instrument: &str) -> SignalConfig {
        let mut resolved = *global;
        self.defaults.apply(&mut resolved);
        if let Some(layer) = self.markets.get(instrument) {
            layer.apply(&mut resolved);
        }
        resolved
    }

    /// Every layer combination must still validate.
    pub fn validate(&self, global: &SignalConfig) -> Result<(), ConfigError> {
        self.resolve(global, "").validate()?;
        for instrument in self.markets.keys() {
            self.resolve(global, instrument).validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SIGNAL_DEFAULTS;

    const DOC: &str = r#"{
        "_defaults": { "cooldown_minutes": 60, "min_rr": 2.0 },
        "BTCUSDT": { "cooldown_minutes": 30, "zone_tolerance_pct": 0.3 },
        "ETHUSDT": { "patterns": { "doji": false } }
    }"#;

    #[test]
    fn test_layered_merge_order() {
        let markets = MarketConfigs::from_json(DOC).unwrap();

        let btc = markets.resolve(&SIGNAL_DEFAULTS, "BTCUSDT");
        assert_eq!(btc.cooldown_minutes, 30);
        assert!((btc.min_rr - 2.0).abs() < 1e-12);
        assert!((btc.zone_tolerance_pct - 0.3).abs() < 1e-12);
        assert_eq!(btc.pivot_window, 5);

        let sol = markets.resolve(&SIGNAL_DEFAULTS, "SOLUSDT");
        assert_eq!(sol.cooldown_minutes, 60);
        assert!((sol.zone_tolerance_pct - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_nested_toggles_default_missing_keys() {
        let markets = MarketConfigs::from_json(DOC).unwrap();
        let eth = markets.resolve(&SIGNAL_DEFAULTS, "ETHUSDT");
        assert!(!eth.patterns.doji);
        assert!(eth.patterns.engulfing);
        assert!(markets.validate(&SIGNAL_DEFAULTS).is_ok());
    }

    #[test]
    fn test_invalid_override_is_reported() {
        let markets = MarketConfigs::from_json(r#"{"XRPUSDT": {"cooldown_minutes": 0}}"#).unwrap();
        assert!(markets.validate(&SIGNAL_DEFAULTS).is_err());
        assert!(MarketConfigs::from_json("not json").is_err());
    }
}
