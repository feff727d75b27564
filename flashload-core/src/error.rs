use thiserror::Error;

/// Errors rejecting a run before any virtual user is spawned.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Stage list is empty")]
    NoStages,

    #[error("Reconcile interval must be greater than zero")]
    ZeroReconcileInterval,

    #[error("Invalid base URL `{url}`: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Unknown pattern profile: {0}")]
    UnknownProfile(String),

    #[error("Pattern profile `{0}` is declared more than once")]
    DuplicateProfile(&'static str),

    #[error("Identity profiles `{0}` and `{1}` cannot be combined")]
    ConflictingIdentity(&'static str, &'static str),

    #[error("Period of `{0}` must be greater than zero")]
    ZeroPeriod(&'static str),

    #[error("Identity range [{min}, {max}) of `{profile}` is empty")]
    EmptyRange {
        profile: &'static str,
        min: u64,
        max: u64,
    },

    #[error("Field `{0}` must not be empty")]
    EmptyField(&'static str),

    #[error("Unknown threshold metric: {0}")]
    UnknownMetric(String),

    #[error("Malformed threshold expression `{expr}`: {reason}")]
    MalformedThreshold { expr: String, reason: String },

    #[error("Aggregation `{aggregation}` is not supported for metric `{metric}`")]
    UnsupportedAggregation { metric: String, aggregation: String },

    #[error("Unknown preset: {0}")]
    UnknownPreset(String),

    #[error("Error parsing run configuration: {0}")]
    Parse(#[from] serde_json::Error),
}
