use std::fmt;

use serde::Deserialize;

use crate::domain::{Candle, Direction};
use crate::models::signal::Signal;

/// One closed candle from the upstream feed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CandleClosed {
    #[serde(alias = "symbol")]
    pub instrument: String,
    pub timeframe: String,
    pub candle: Candle,
}

/// Outcome of one candle-close evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    Signal(Box<Signal>),
    Rejected(Rejection),
}

impl Evaluation {
    pub fn signal(&self) -> Option<&Signal> {
        match self {
            Evaluation::Signal(signal) => Some(signal),
            Evaluation::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Evaluation::Signal(_) => None,
            Evaluation::Rejected(reason) => Some(reason),
        }
    }
}

/// Normal "no signal" outcomes. None of these are errors.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    NotEntryTimeframe,
    InsufficientData { have: usize, need: usize },
    NoSetup,
    HtfMisaligned { bias: Direction },
    ScoreBelowThreshold { score: f64, threshold: f64 },
    RiskRewardTooLow { rr: f64, min: f64 },
    CooldownActive { key: String, remaining_minutes: i64 },
    DeliveryFailed,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::NotEntryTimeframe => write!(f, "not an entry timeframe"),
            Rejection::InsufficientData { have, need } => {
                write!(f, "insufficient data ({have} < {need} candles)")
            }
            Rejection::NoSetup => write!(f, "no setup"),
            Rejection::HtfMisaligned { bias } => write!(f, "HTF not aligned (bias {bias})"),
            Rejection::ScoreBelowThreshold { score, threshold } => {
                write!(f, "score too low ({score} < {threshold})")
            }
            Rejection::RiskRewardTooLow { rr, min } => write!(f, "R:R too low ({rr:.2} < {min})"),
            Rejection::CooldownActive {
                key,
                remaining_minutes,
            } => write!(f, "cooldown active for {key} ({remaining_minutes} min left)"),
            Rejection::DeliveryFailed => write!(f, "notification delivery failed"),
        }
    }
}
