use crate::{Comparator, HumanDuration, EXIT_THRESHOLD_BREACH};
use serde::Serialize;
use serde_with::serde_as;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Observed value of one threshold against its bound.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ThresholdOutcome {
    pub expression: String,
    pub observed: f64,
    pub comparator: Comparator,
    pub bound: f64,
    pub passed: bool,
}

/// Run-level pass/fail. `passed` is the conjunction of every threshold.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Verdict {
    pub passed: bool,
    pub thresholds: BTreeMap<String, ThresholdOutcome>,
}

impl Verdict {
    pub fn new(thresholds: BTreeMap<String, ThresholdOutcome>) -> Self {
        Self {
            passed: thresholds.values().all(|t| t.passed),
            thresholds,
        }
    }

    pub fn exit_code(&self) -> u8 {
        if self.passed {
            0
        } else {
            EXIT_THRESHOLD_BREACH
        }
    }
}

#[serde_as]
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct LatencySummary {
    #[serde_as(as = "HumanDuration")]
    pub min: Duration,
    #[serde_as(as = "HumanDuration")]
    pub avg: Duration,
    #[serde_as(as = "HumanDuration")]
    pub med: Duration,
    #[serde_as(as = "HumanDuration")]
    pub p90: Duration,
    #[serde_as(as = "HumanDuration")]
    pub p95: Duration,
    #[serde_as(as = "HumanDuration")]
    pub p99: Duration,
    #[serde_as(as = "HumanDuration")]
    pub max: Duration,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CheckTally {
    pub passes: u64,
    pub fails: u64,
}

impl CheckTally {
    pub fn total(&self) -> u64 {
        self.passes + self.fails
    }

    pub fn rate(&self) -> f64 {
        if self.total() == 0 {
            0.
        } else {
            self.passes as f64 / self.total() as f64
        }
    }
}

/// Point at which the scheduler's target concurrency changed.
#[serde_as]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct StageTransition {
    #[serde_as(as = "HumanDuration")]
    pub elapsed: Duration,
    pub target: usize,
}

/// Everything reported at the end of a run.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RunReport {
    pub name: String,
    pub seed: u64,
    #[serde_as(as = "HumanDuration")]
    pub elapsed: Duration,
    pub iterations: u64,
    pub transport_failures: u64,
    pub statuses: BTreeMap<u16, u64>,
    pub latency: LatencySummary,
    pub checks: BTreeMap<String, CheckTally>,
    pub peak_vus: usize,
    pub timeline: Vec<StageTransition>,
    pub verdict: Verdict,
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} (seed {}) finished in {}",
            self.name,
            self.seed,
            humantime::format_duration(truncate_to_millis(self.elapsed))
        )?;
        writeln!(
            f,
            "  iterations.........: {} ({} transport failures), peak VUs {}",
            self.iterations, self.transport_failures, self.peak_vus
        )?;

        let statuses: Vec<String> = self
            .statuses
            .iter()
            .map(|(status, count)| format!("{status}={count}"))
            .collect();
        writeln!(f, "  statuses...........: {}", statuses.join(" "))?;

        let l = &self.latency;
        writeln!(
            f,
            "  http_req_duration..: min={:?} avg={:?} med={:?} p(90)={:?} p(95)={:?} p(99)={:?} max={:?}",
            l.min, l.avg, l.med, l.p90, l.p95, l.p99, l.max
        )?;

        for (name, tally) in &self.checks {
            let mark = if tally.fails == 0 { "✓" } else { "✗" };
            writeln!(
                f,
                "  {mark} {name}: {:.2}% ({} / {})",
                tally.rate() * 100.,
                tally.passes,
                tally.total()
            )?;
        }

        for (name, outcome) in &self.verdict.thresholds {
            let mark = if outcome.passed { "✓" } else { "✗" };
            writeln!(f, "  {mark} {name} (observed {:.4})", outcome.observed)?;
        }

        write!(
            f,
            "  verdict............: {}",
            if self.verdict.passed { "PASS" } else { "FAIL" }
        )
    }
}

fn truncate_to_millis(d: Duration) -> Duration {
    Duration::from_millis(d.as_millis() as u64)
}
