use crate::{
    CheckSpec, ConfigError, HumanDuration, Pacing, PatternConfig, Predicate, ProfileConfig,
    RampPolicy, Stage, Threshold, ThresholdSpec, DEFAULT_RECONCILE_INTERVAL,
    DEFAULT_REQUEST_TIMEOUT, PRECHECK_PATH,
};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use std::num::NonZeroU32;
use std::time::Duration;

/// Complete description of one run. Immutable once the run starts.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub name: String,
    pub base_url: String,
    pub stages: Vec<Stage>,
    #[serde(default)]
    pub ramp: RampPolicy,
    #[serde(default)]
    pub thresholds: Vec<ThresholdSpec>,
    #[serde(default)]
    pub pattern: PatternConfig,
    #[serde(default)]
    pub checks: Vec<CheckSpec>,
    #[serde(default)]
    pub pacing: Pacing,
    /// Run-wide request rate cap, shared by every virtual user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_rps: Option<NonZeroU32>,
    #[serde_as(as = "HumanDuration")]
    #[serde(default = "default_request_timeout")]
    pub request_timeout: Duration,
    #[serde_as(as = "HumanDuration")]
    #[serde(default = "default_reconcile_interval")]
    pub reconcile_interval: Duration,
    /// Seed of every random choice in the run. Drawn at start when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

fn default_request_timeout() -> Duration {
    DEFAULT_REQUEST_TIMEOUT
}

fn default_reconcile_interval() -> Duration {
    DEFAULT_RECONCILE_INTERVAL
}

impl RunConfig {
    pub fn new(name: &str, base_url: &str) -> Self {
        Self {
            name: name.to_string(),
            base_url: base_url.to_string(),
            stages: vec![],
            ramp: RampPolicy::default(),
            thresholds: vec![],
            pattern: PatternConfig::default(),
            checks: vec![],
            pacing: Pacing::default(),
            max_rps: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            reconcile_interval: DEFAULT_RECONCILE_INTERVAL,
            seed: None,
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn stage(mut self, duration: Duration, target: usize) -> Self {
        self.stages.push(Stage::new(duration, target));
        self
    }

    /// Single stage holding `vus` virtual users for `duration`.
    pub fn constant(self, vus: usize, duration: Duration) -> Self {
        self.stage(duration, vus)
    }

    pub fn ramp(mut self, ramp: RampPolicy) -> Self {
        self.ramp = ramp;
        self
    }

    pub fn threshold(mut self, threshold: ThresholdSpec) -> Self {
        self.thresholds.push(threshold);
        self
    }

    pub fn profile(mut self, profile: ProfileConfig) -> Self {
        self.pattern.profiles.push(profile);
        self
    }

    pub fn pattern(mut self, pattern: PatternConfig) -> Self {
        self.pattern = pattern;
        self
    }

    pub fn check(mut self, name: &str, predicate: Predicate) -> Self {
        self.checks.push(CheckSpec::new(name, predicate));
        self
    }

    pub fn pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn max_rps(mut self, max_rps: NonZeroU32) -> Self {
        self.max_rps = Some(max_rps);
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn reconcile_interval(mut self, interval: Duration) -> Self {
        self.reconcile_interval = interval;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }

    pub fn total_duration(&self) -> Duration {
        self.stages.iter().map(|s| s.duration).sum()
    }

    pub fn precheck_url(&self) -> String {
        format!("{}{PRECHECK_PATH}", self.base_url.trim_end_matches('/'))
    }

    pub fn compile_thresholds(&self) -> Result<Vec<Threshold>, ConfigError> {
        self.thresholds.iter().map(ThresholdSpec::compile).collect()
    }

    /// Reject anything a run could not safely interpret.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stages.is_empty() {
            return Err(ConfigError::NoStages);
        }

        if self.reconcile_interval.is_zero() {
            return Err(ConfigError::ZeroReconcileInterval);
        }

        let invalid_url = |reason: String| ConfigError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason,
        };
        let url = url::Url::parse(&self.base_url).map_err(|e| invalid_url(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid_url(format!("unsupported scheme `{}`", url.scheme())));
        }
        if url.host().is_none() {
            return Err(invalid_url("missing host".to_string()));
        }

        self.pattern.validate()?;
        self.compile_thresholds()?;

        Ok(())
    }
}
