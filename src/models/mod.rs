// Domain models produced by the analysis pipeline
pub mod setup;
pub mod signal;
pub mod zone;

// Re-export key types for convenience
pub use setup::{Setup, SetupKind, SetupType};
pub use signal::{Signal, SignalRecord};
pub use zone::{Zone, ZoneKind, ZoneSet};
