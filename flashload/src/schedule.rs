use flashload_core::{RampPolicy, Stage};
use std::time::Duration;

/// Maps elapsed run time to a target virtual-user count.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Schedule {
    stages: Vec<Stage>,
    ramp: RampPolicy,
}

impl Schedule {
    pub fn new(stages: Vec<Stage>, ramp: RampPolicy) -> Self {
        Self { stages, ramp }
    }

    pub fn total_duration(&self) -> Duration {
        self.stages.iter().map(|s| s.duration).sum()
    }

    pub fn peak_target(&self) -> usize {
        self.stages.iter().map(|s| s.target).max().unwrap_or(0)
    }

    /// Index of the stage active at `elapsed` and its start offset. Zero-length stages are never
    /// active.
    fn locate(&self, elapsed: Duration) -> Option<(usize, Duration)> {
        let mut start = Duration::ZERO;
        for (i, stage) in self.stages.iter().enumerate() {
            let end = start + stage.duration;
            if elapsed < end {
                return Some((i, start));
            }
            start = end;
        }
        None
    }

    pub fn current_target(&self, elapsed: Duration) -> usize {
        let Some((i, start)) = self.locate(elapsed) else {
            return 0;
        };
        let stage = &self.stages[i];

        match self.ramp {
            RampPolicy::Step => stage.target,
            RampPolicy::Linear => {
                let from = match i {
                    0 => 0.,
                    _ => self.stages[i - 1].target as f64,
                };
                let to = stage.target as f64;
                let progress =
                    (elapsed - start).as_secs_f64() / stage.duration.as_secs_f64();
                (from + (to - from) * progress).round() as usize
            }
        }
    }

    /// True once the timeline is exhausted, or once the target is zero and stays zero.
    pub fn is_complete(&self, elapsed: Duration) -> bool {
        match self.locate(elapsed) {
            None => true,
            Some((i, _)) => {
                self.current_target(elapsed) == 0
                    && self.stages[i..].iter().all(|s| s.target == 0)
            }
        }
    }
}
