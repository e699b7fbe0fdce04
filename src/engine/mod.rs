pub mod cooldown;
pub mod core;
pub mod messages;
pub mod sinks;

// Re-export key components
pub use cooldown::{BypassDecision, BypassReason, CooldownBook, CooldownKey, evaluate_cooldown_bypass};
pub use core::SignalEngine;
pub use messages::{CandleClosed, Evaluation, Rejection};
pub use sinks::{JsonLinesSignalStore, LogNotifier, MemorySignalStore, SignalNotifier, SignalStore};
