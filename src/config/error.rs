use thiserror::Error;

/// Startup configuration problems. Raised once when the config is built,
/// never from inside detection.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("unknown timeframe shorthand: {0}")]
    UnknownTimeframe(String),

    #[error("at least one entry timeframe is required")]
    NoEntryTimeframes,

    #[error("failed to parse configuration document: {0}")]
    Parse(String),
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}
