use serde::{Deserialize, Serialize};

use crate::analysis::bias::{HtfAlignment, HtfBias};
use crate::analysis::levels::Levels;
use crate::analysis::scoring::ScoreResult;
use crate::analysis::structure::StructureEvents;
use crate::domain::{Direction, Side};
use crate::engine::cooldown::CooldownKey;
use crate::indicators::{AtrSpike, Divergence};
use crate::models::setup::Setup;
use crate::utils::maths_utils::format_price;

/// An accepted setup with everything needed to deliver and store it.
/// Built once per accepted candle close and never mutated after hand-off.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Signal {
    pub instrument: String,
    pub timeframe: String,
    pub side: Side,
    pub setup: Setup,
    pub score: ScoreResult,
    pub levels: Levels,
    pub htf_bias: Option<HtfBias>,
    pub htf_alignment: Option<HtfAlignment>,
    pub divergence: Divergence,
    pub structure: StructureEvents,
    pub atr_spike: AtrSpike,
    pub volume_ratio: f64,
    pub zone_key: String,
    pub cooldown_bypassed: bool,
    pub bypass_reason: Option<String>,
    /// Close time of the candle that triggered the signal.
    pub timestamp: i64,
    pub created_at: i64,
}

impl Signal {
    pub fn cooldown_key(&self) -> CooldownKey {
        CooldownKey::new(&self.instrument, &self.timeframe, self.side, &self.zone_key)
    }

    pub fn with_bypass(self, reason: impl Into<String>) -> Self {
        Self {
            cooldown_bypassed: true,
            bypass_reason: Some(reason.into()),
            ..self
        }
    }

    /// One-line description for logs.
    pub fn summary(&self) -> String {
        format!(
            "{} {} {} {} | score {}/{} | entry {} SL {} TP1 {} (RR {:.2})",
            self.instrument,
            self.timeframe,
            self.side,
            self.setup.name,
            self.score.score,
            self.score.max_score,
            format_price(self.levels.entry),
            format_price(self.levels.stop_loss),
            format_price(self.levels.take_profit1),
            self.levels.risk_reward1,
        )
    }
}

/// Flat row handed to persistence collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRecord {
    pub instrument: String,
    pub timeframe: String,
    pub side: Side,
    pub setup_type: String,
    pub setup_name: String,
    pub score: f64,
    pub entry: f64,
    pub stop_loss: f64,
    pub take_profit1: f64,
    pub take_profit2: f64,
    pub take_profit3: f64,
    pub risk_reward: f64,
    pub zone_key: String,
    pub htf_bias: Option<Direction>,
    pub has_divergence: bool,
    pub has_bos: bool,
    pub has_choch: bool,
    pub cooldown_bypassed: bool,
    pub bypass_reason: Option<String>,
    pub timestamp: i64,
    pub created_at: i64,
}

impl From<&Signal> for SignalRecord {
    fn from(signal: &Signal) -> Self {
        Self {
            instrument: signal.instrument.clone(),
            timeframe: signal.timeframe.clone(),
            side: signal.side,
            setup_type: signal.setup.setup_type().to_string(),
            setup_name: signal.setup.name.clone(),
            score: signal.score.score,
            entry: signal.levels.entry,
            stop_loss: signal.levels.stop_loss,
            take_profit1: signal.levels.take_profit1,
            take_profit2: signal.levels.take_profit2,
            take_profit3: signal.levels.take_profit3,
            risk_reward: signal.levels.risk_reward1,
            zone_key: signal.zone_key.clone(),
            htf_bias: signal.htf_bias.as_ref().map(|b| b.bias),
            has_divergence: signal.divergence.direction().is_some(),
            has_bos: signal.structure.bos.is_some(),
            has_choch: signal.structure.choch.is_some(),
            cooldown_bypassed: signal.cooldown_bypassed,
            bypass_reason: signal.bypass_reason.clone(),
            timestamp: signal.timestamp,
            created_at: signal.created_at,
        }
    }
}
