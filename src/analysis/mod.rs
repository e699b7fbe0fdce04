// Price-action analysis: pivots, zones, patterns, structure and the setup pipeline
pub mod bias;
pub mod legacy;
pub mod levels;
pub mod liquidity;
pub mod patterns;
pub mod pivots;
pub mod retest;
pub mod scoring;
pub mod selector;
pub mod structure;
pub mod zones;

// Re-export commonly used types
pub use bias::{HtfAlignment, HtfBias, check_htf_alignment, determine_htf_bias};
pub use levels::{Levels, calculate_levels};
pub use patterns::{PatternKind, PatternMatch, detect_reversal_pattern};
pub use scoring::{ScoreBreakdown, ScoreResult, calculate_score};
pub use selector::detect_setup;
pub use structure::{StructureEvents, Trend, analyze_market_structure, detect_recent_structure_events};
pub use zones::build_zones;
