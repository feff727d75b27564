use crate::HumanDuration;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use std::time::Duration;

/// A window of the run timeline with a target virtual-user concurrency.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    #[serde_as(as = "HumanDuration")]
    pub duration: Duration,
    pub target: usize,
}

impl Stage {
    pub fn new(duration: Duration, target: usize) -> Self {
        Self { duration, target }
    }
}

/// How concurrency moves between consecutive stage boundaries.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RampPolicy {
    /// Hold each stage's target for the whole stage (discrete plateaus).
    #[default]
    Step,
    /// Interpolate from the previous stage's target to the current one.
    Linear,
}
