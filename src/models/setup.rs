use serde::Serialize;
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::analysis::patterns::PatternMatch;
use crate::analysis::pivots::Pivot;
use crate::domain::Side;
use crate::models::zone::{Zone, ZoneSet};

/// Discriminator of [`SetupKind`], used in cooldown reasons, logs and storage.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString, EnumIter, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SetupType {
    Reversal,
    Breakout,
    Breakdown,
    FalseBreakout,
    FalseBreakdown,
    Retest,
    LiquiditySweepBull,
    LiquiditySweepBear,
    TrapBull,
    TrapBear,
    BreakoutRetest,
    FalseBreakConfirmed,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SweepEvidence {
    /// The swept pivot, indexed into the evaluated candle sequence.
    pub pivot: Pivot,
    pub sweep_level: f64,
    pub reclaim_level: f64,
    pub wick_ratio: f64,
    pub volume_ratio: f64,
    pub has_volume: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrapEvidence {
    pub wick_ratio: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BreakoutRetestEvidence {
    pub breakout_index: usize,
    pub breakout_close: f64,
    pub retest_index: usize,
    pub confirmation: PatternMatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BreakoutEvidence {
    /// False when the break lacked volume and is traded as a fade.
    pub is_true: bool,
    pub volume_ratio: f64,
    pub volume_spike: bool,
}

/// Kind-specific evidence. Exhaustively matched by the selector and scorer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SetupKind {
    LiquiditySweepBull(SweepEvidence),
    LiquiditySweepBear(SweepEvidence),
    TrapBull(TrapEvidence),
    TrapBear(TrapEvidence),
    BreakoutRetest(BreakoutRetestEvidence),
    FalseBreakConfirmed { pattern: PatternMatch },
    Reversal { pattern: PatternMatch },
    Breakout(BreakoutEvidence),
    Breakdown(BreakoutEvidence),
    FalseBreakout { wick_ratio: f64, volume_ratio: f64 },
    FalseBreakdown { wick_ratio: f64, volume_ratio: f64 },
    Retest { pattern: PatternMatch },
}

impl SetupKind {
    pub fn setup_type(&self) -> SetupType {
        match self {
            SetupKind::LiquiditySweepBull(_) => SetupType::LiquiditySweepBull,
            SetupKind::LiquiditySweepBear(_) => SetupType::LiquiditySweepBear,
            SetupKind::TrapBull(_) => SetupType::TrapBull,
            SetupKind::TrapBear(_) => SetupType::TrapBear,
            SetupKind::BreakoutRetest(_) => SetupType::BreakoutRetest,
            SetupKind::FalseBreakConfirmed { .. } => SetupType::FalseBreakConfirmed,
            SetupKind::Reversal { .. } => SetupType::Reversal,
            SetupKind::Breakout(_) => SetupType::Breakout,
            SetupKind::Breakdown(_) => SetupType::Breakdown,
            SetupKind::FalseBreakout { .. } => SetupType::FalseBreakout,
            SetupKind::FalseBreakdown { .. } => SetupType::FalseBreakdown,
            SetupKind::Retest { .. } => SetupType::Retest,
        }
    }

    /// The pattern behind the setup, if any.
    pub fn pattern(&self) -> Option<&PatternMatch> {
        match self {
            SetupKind::FalseBreakConfirmed { pattern }
            | SetupKind::Reversal { pattern }
            | SetupKind::Retest { pattern } => Some(pattern),
            SetupKind::BreakoutRetest(e) => Some(&e.confirmation),
            _ => None,
        }
    }

    /// Did the detector observe a volume spike on the trigger candle?
    pub fn has_volume_spike(&self) -> bool {
        match self {
            SetupKind::LiquiditySweepBull(e) | SetupKind::LiquiditySweepBear(e) => e.has_volume,
            SetupKind::Breakout(e) | SetupKind::Breakdown(e) => e.volume_spike,
            _ => false,
        }
    }
}

/// A classified price-action candidate. Built fresh per evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Setup {
    pub kind: SetupKind,
    pub side: Side,
    pub name: String,
    /// Close of the trigger candle, used as entry.
    pub price: f64,
    pub strength: f64,
    /// Zone the setup formed at. Sweeps reference a pivot instead.
    pub zone: Option<Zone>,
    /// All zones of the build the selector ran against.
    pub zones: ZoneSet,
    pub candle_index: usize,
}

impl Setup {
    pub fn new(
        kind: SetupKind,
        side: Side,
        name: impl Into<String>,
        price: f64,
        strength: f64,
        zone: Option<Zone>,
        candle_index: usize,
    ) -> Self {
        Self {
            kind,
            side,
            name: name.into(),
            price,
            strength: strength.clamp(0.0, 1.0),
            zone,
            zones: ZoneSet::default(),
            candle_index,
        }
    }

    pub fn with_zones(self, zones: ZoneSet) -> Self {
        Self { zones, ..self }
    }

    pub fn setup_type(&self) -> SetupType {
        self.kind.setup_type()
    }

    pub fn is_sweep_or_trap(&self) -> bool {
        matches!(
            self.kind,
            SetupKind::LiquiditySweepBull(_)
                | SetupKind::LiquiditySweepBear(_)
                | SetupKind::TrapBull(_)
                | SetupKind::TrapBear(_)
        )
    }

    /// Zone part of the cooldown key, `none` for zone-less setups.
    pub fn zone_key(&self) -> String {
        self.zone
            .as_ref()
            .map(Zone::key)
            .unwrap_or_else(|| "none".to_string())
    }
}
