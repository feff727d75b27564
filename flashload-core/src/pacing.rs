use crate::HumanDuration;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use std::time::Duration;

/// Delay a virtual user waits between two of its iterations.
#[serde_as]
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Pacing {
    #[default]
    None,
    Fixed {
        #[serde_as(as = "HumanDuration")]
        delay: Duration,
    },
    /// `base + uniform[0, spread)`
    Jittered {
        #[serde_as(as = "HumanDuration")]
        base: Duration,
        #[serde_as(as = "HumanDuration")]
        spread: Duration,
    },
}

impl Pacing {
    pub fn fixed(delay: Duration) -> Self {
        Self::Fixed { delay }
    }

    pub fn jittered(base: Duration, spread: Duration) -> Self {
        Self::Jittered { base, spread }
    }
}
