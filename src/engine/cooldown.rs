//! Per-(instrument, timeframe, side, zone) suppression windows and the rules
//! that let a signal through an active window.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::config::SignalConfig;
use crate::domain::Side;
use crate::models::signal::Signal;
use crate::utils::TimeUtils;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CooldownKey {
    pub instrument: String,
    pub timeframe: String,
    pub side: Side,
    pub zone_key: String,
}

impl CooldownKey {
    pub fn new(instrument: &str, timeframe: &str, side: Side, zone_key: &str) -> Self {
        let zone_key = if zone_key.is_empty() { "none" } else { zone_key };
        Self {
            instrument: instrument.to_string(),
            timeframe: timeframe.to_string(),
            side,
            zone_key: zone_key.to_string(),
        }
    }
}

impl fmt::Display for CooldownKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}_{}",
            self.instrument, self.timeframe, self.side, self.zone_key
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CooldownRecord {
    pub key: CooldownKey,
    pub expires_at_ms: i64,
    pub created_at_ms: i64,
}

impl CooldownRecord {
    pub fn is_active(&self, now_ms: i64) -> bool {
        self.expires_at_ms > now_ms
    }
}

/// Cooldown store. Expired records stay until [`CooldownBook::purge_expired`]
/// or an overwrite; every query compares against `now_ms`.
#[derive(Debug, Default)]
pub struct CooldownBook {
    records: HashMap<CooldownKey, CooldownRecord>,
}

impl CooldownBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_on_cooldown(&self, key: &CooldownKey, now_ms: i64) -> bool {
        self.records.get(key).is_some_and(|r| r.is_active(now_ms))
    }

    /// Write or overwrite the record for `key`.
    pub fn add_cooldown(&mut self, key: CooldownKey, minutes: i64, now_ms: i64) -> &CooldownRecord {
        let expires_at_ms = now_ms + minutes * TimeUtils::MS_IN_MIN;
        log::info!(
            "Cooldown set for {} until {}",
            key,
            crate::utils::time_utils::epoch_ms_to_utc(expires_at_ms)
        );
        let record = CooldownRecord {
            key: key.clone(),
            expires_at_ms,
            created_at_ms: now_ms,
        };
        self.records.insert(key.clone(), record);
        &self.records[&key]
    }

    /// Whole minutes left, rounded up. Zero when not on cooldown.
    pub fn remaining_minutes(&self, key: &CooldownKey, now_ms: i64) -> i64 {
        match self.records.get(key) {
            Some(r) if r.is_active(now_ms) => {
                let remaining = r.expires_at_ms - now_ms;
                (remaining + TimeUtils::MS_IN_MIN - 1) / TimeUtils::MS_IN_MIN
            }
            _ => 0,
        }
    }

    pub fn remove(&mut self, key: &CooldownKey) -> Option<CooldownRecord> {
        self.records.remove(key)
    }

    /// Active records, soonest expiry first.
    pub fn active(&self, now_ms: i64) -> Vec<&CooldownRecord> {
        let mut active: Vec<&CooldownRecord> =
            self.records.values().filter(|r| r.is_active(now_ms)).collect();
        active.sort_by_key(|r| r.expires_at_ms);
        active
    }

    /// Drop expired records and return how many went.
    pub fn purge_expired(&mut self, now_ms: i64) -> usize {
        let before = self.records.len();
        self.records.retain(|_, r| r.is_active(now_ms));
        before - self.records.len()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BypassReason {
    Choch,
    AtrSpike { ratio: f64 },
    StrongSetup { setup_type: String, strength: f64 },
}

impl fmt::Display for BypassReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BypassReason::Choch => write!(f, "CHOCH detected - strong reversal signal"),
            BypassReason::AtrSpike { ratio } => write!(f, "ATR spike detected ({ratio:.2}x avg)"),
            BypassReason::StrongSetup {
                setup_type,
                strength,
            } => write!(
                f,
                "Strong {setup_type} detected (strength: {:.0}%)",
                strength * 100.0
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BypassDecision {
    pub bypass: bool,
    pub reason: Option<BypassReason>,
}

impl BypassDecision {
    const NONE: BypassDecision = BypassDecision {
        bypass: false,
        reason: None,
    };

    fn because(reason: BypassReason) -> Self {
        Self {
            bypass: true,
            reason: Some(reason),
        }
    }
}

/// CHOCH (when enabled), then ATR spike, then a strong sweep or trap.
pub fn evaluate_cooldown_bypass(signal: &Signal, config: &SignalConfig) -> BypassDecision {
    if config.cooldown_bypass_on_choch && signal.structure.choch.is_some() {
        return BypassDecision::because(BypassReason::Choch);
    }
    if signal.atr_spike.has_spike {
        return BypassDecision::because(BypassReason::AtrSpike {
            ratio: signal.atr_spike.ratio,
        });
    }
    if signal.setup.is_sweep_or_trap() && signal.setup.strength >= config.strong_setup_bypass_strength {
        return BypassDecision::because(BypassReason::StrongSetup {
            setup_type: signal.setup.setup_type().to_string(),
            strength: signal.setup.strength,
        });
    }
    BypassDecision::NONE
}
