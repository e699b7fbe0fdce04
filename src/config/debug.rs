//! Debugging feature flags.
//!
//! Keep them `false` by default. Each is additionally gated by
//! `cfg(debug_assertions)` at the call site, so release builds stay quiet.

pub struct DebugFlags {
    /// Emit support/resistance counts each time zones are rebuilt.
    pub print_zone_build: bool,
    /// Emit the full score breakdown for every scored setup.
    pub print_score_breakdown: bool,
    /// Emit BOS/CHOCH events found during structure scans.
    pub print_structure_events: bool,
    /// Emit cache inserts and evictions.
    pub print_cache_updates: bool,
}

pub const DEBUG_FLAGS: DebugFlags = DebugFlags {
    print_zone_build: false,
    print_score_breakdown: false,
    print_structure_events: false,
    print_cache_updates: false,
};
