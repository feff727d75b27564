use crate::sample_log::{MetricSample, Snapshot};
use flashload_core::{
    Aggregation, ConfigError, LatencySummary, Metric, Threshold, ThresholdOutcome, ThresholdSpec,
    Verdict,
};
use std::collections::BTreeMap;
use std::time::Duration;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

/// Renders the run verdict from a sample snapshot. A pure function of the snapshot: evaluating the
/// same samples twice, in any order, yields the same verdict.
#[derive(Clone, Debug, Default)]
pub struct ThresholdEvaluator {
    thresholds: Vec<Threshold>,
}

impl ThresholdEvaluator {
    pub fn new(thresholds: Vec<Threshold>) -> Self {
        Self { thresholds }
    }

    pub fn from_specs(specs: &[ThresholdSpec]) -> Result<Self, ConfigError> {
        let thresholds = specs
            .iter()
            .map(ThresholdSpec::compile)
            .collect::<Result<_, _>>()?;
        Ok(Self::new(thresholds))
    }

    pub fn evaluate(&self, snapshot: &Snapshot) -> Verdict {
        let latencies = sorted_millis(&snapshot.samples);

        let outcomes = self
            .thresholds
            .iter()
            .map(|threshold| {
                let observed = observe(threshold, snapshot, &latencies);
                let condition = &threshold.condition;
                let passed = condition.comparator.holds(observed, condition.bound);
                if !passed {
                    debug!("Threshold {} breached: observed {observed}", threshold.name);
                }

                let outcome = ThresholdOutcome {
                    expression: condition.to_string(),
                    observed,
                    comparator: condition.comparator,
                    bound: condition.bound,
                    passed,
                };
                (threshold.name.clone(), outcome)
            })
            .collect::<BTreeMap<_, _>>();

        Verdict::new(outcomes)
    }
}

fn observe(threshold: &Threshold, snapshot: &Snapshot, latencies: &[f64]) -> f64 {
    match threshold.metric {
        Metric::HttpReqDuration => aggregate(threshold.condition.aggregation, latencies),
        Metric::HttpReqFailed => {
            let failed = snapshot
                .samples
                .iter()
                .filter(|s| s.failed(&threshold.classifier))
                .count();
            ratio(failed, snapshot.samples.len())
        }
        Metric::Checks => {
            let (passed, total) = snapshot
                .checks
                .iter()
                .filter(|c| match &threshold.check {
                    Some(name) => *c.name == **name,
                    None => true,
                })
                .fold((0, 0), |(passed, total), c| {
                    (passed + c.passed as usize, total + 1)
                });
            ratio(passed, total)
        }
        Metric::Iterations => snapshot.samples.len() as f64,
    }
}

fn aggregate(aggregation: Aggregation, sorted: &[f64]) -> f64 {
    if sorted.is_empty() {
        return 0.;
    }
    match aggregation {
        Aggregation::Percentile(p) => percentile(sorted, p),
        Aggregation::Avg => statistical::mean(sorted),
        Aggregation::Med => statistical::median(sorted),
        Aggregation::Min => sorted[0],
        Aggregation::Max => sorted[sorted.len() - 1],
        // Rejected at compile time for latency thresholds.
        Aggregation::Rate | Aggregation::Count => 0.,
    }
}

fn ratio(n: usize, total: usize) -> f64 {
    if total == 0 {
        0.
    } else {
        n as f64 / total as f64
    }
}

/// Latencies in milliseconds, ascending.
fn sorted_millis(samples: &[MetricSample]) -> Vec<f64> {
    let mut latencies: Vec<f64> = samples
        .iter()
        .map(|s| s.latency.as_secs_f64() * 1_000.)
        .collect();
    latencies.sort_by(f64::total_cmp);
    latencies
}

/// Linear interpolation between closest ranks. `sorted` must be ascending and non-empty.
pub(crate) fn percentile(sorted: &[f64], p: f64) -> f64 {
    let rank = (p / 100.).clamp(0., 1.) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    sorted[lower] + (sorted[upper] - sorted[lower]) * (rank - lower as f64)
}

pub(crate) fn latency_summary(samples: &[MetricSample]) -> LatencySummary {
    let sorted = sorted_millis(samples);
    if sorted.is_empty() {
        return LatencySummary::default();
    }

    let ms = |v: f64| Duration::from_secs_f64(v / 1_000.);
    LatencySummary {
        min: ms(sorted[0]),
        avg: ms(statistical::mean(&sorted)),
        med: ms(statistical::median(&sorted)),
        p90: ms(percentile(&sorted, 90.)),
        p95: ms(percentile(&sorted, 95.)),
        p99: ms(percentile(&sorted, 99.)),
        max: ms(sorted[sorted.len() - 1]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample_log::CheckResult;

    fn sample(ms: u64, status: Option<u16>) -> MetricSample {
        MetricSample {
            latency: Duration::from_millis(ms),
            status,
        }
    }

    fn evaluator(specs: &[ThresholdSpec]) -> ThresholdEvaluator {
        ThresholdEvaluator::from_specs(specs).unwrap()
    }

    fn duplicated_sell() -> ThresholdEvaluator {
        evaluator(&[
            ThresholdSpec::new("http_req_duration", "p(95)<300"),
            ThresholdSpec::new("http_req_failed", "rate<0.15").tolerate(&[409, 429]),
        ])
    }

    /// 85% accepted, 10% conflicts, 5% transport failures.
    fn mixed_snapshot() -> Snapshot {
        let mut samples = vec![];
        for i in 0..100u64 {
            let status = match i % 20 {
                0 => None,
                1 | 2 => Some(409),
                _ => Some(200),
            };
            samples.push(sample(10 + i, status));
        }
        Snapshot {
            samples,
            checks: vec![],
        }
    }

    #[test]
    fn tolerated_statuses_are_not_failures() {
        let verdict = duplicated_sell().evaluate(&mixed_snapshot());
        let failed = &verdict.thresholds["http_req_failed{tolerate=409,429}: rate<0.15"];
        assert!((failed.observed - 0.05).abs() < 1e-9);
        assert!(failed.passed);
        assert!(verdict.passed);

        // Without tolerance the same run breaches a strict budget.
        let strict = evaluator(&[ThresholdSpec::new("http_req_failed", "rate<0.1")])
            .evaluate(&mixed_snapshot());
        assert!((strict.thresholds["http_req_failed: rate<0.1"].observed - 0.15).abs() < 1e-9);
        assert!(!strict.passed);
    }

    #[test]
    fn tolerance_lists_keep_thresholds_apart() {
        let snapshot = Snapshot {
            samples: (0..100)
                .map(|i| sample(10, Some(if i % 5 == 0 { 409 } else { 200 })))
                .collect(),
            checks: vec![],
        };
        let verdict = evaluator(&[
            ThresholdSpec::new("http_req_failed", "rate<0.15"),
            ThresholdSpec::new("http_req_failed", "rate<0.15").tolerate(&[409]),
        ])
        .evaluate(&snapshot);

        assert_eq!(verdict.thresholds.len(), 2);
        let strict = &verdict.thresholds["http_req_failed: rate<0.15"];
        assert!((strict.observed - 0.2).abs() < 1e-9);
        assert!(!strict.passed);
        assert!(verdict.thresholds["http_req_failed{tolerate=409}: rate<0.15"].passed);
        assert!(!verdict.passed);
    }

    #[test]
    fn p95_interpolates() {
        let snapshot = Snapshot {
            samples: (1..=100).map(|ms| sample(ms, Some(200))).collect(),
            checks: vec![],
        };
        let verdict = evaluator(&[ThresholdSpec::new("http_req_duration", "p(95)<95")])
            .evaluate(&snapshot);
        let outcome = &verdict.thresholds["http_req_duration: p(95)<95"];
        assert!((outcome.observed - 95.05).abs() < 1e-6);
        assert!(!verdict.passed);
    }

    #[test]
    fn evaluation_is_idempotent_and_order_independent() {
        let evaluator = duplicated_sell();
        let snapshot = mixed_snapshot();
        let first = evaluator.evaluate(&snapshot);
        assert_eq!(first, evaluator.evaluate(&snapshot));

        let mut reversed = snapshot.clone();
        reversed.samples.reverse();
        assert_eq!(first, evaluator.evaluate(&reversed));
    }

    #[test]
    fn empty_run_observes_zero() {
        let verdict = evaluator(&[
            ThresholdSpec::new("http_req_duration", "p(95)<300"),
            ThresholdSpec::new("http_req_failed", "rate<0.01"),
            ThresholdSpec::new("checks", "rate>0.9"),
            ThresholdSpec::new("iterations", "count>0"),
        ])
        .evaluate(&Snapshot::default());

        for outcome in verdict.thresholds.values() {
            assert_eq!(outcome.observed, 0.);
        }
        assert!(!verdict.thresholds["checks: rate>0.9"].passed);
        assert!(!verdict.thresholds["iterations: count>0"].passed);
        assert!(verdict.thresholds["http_req_failed: rate<0.01"].passed);
        assert!(!verdict.passed);
    }

    #[test]
    fn no_thresholds_pass() {
        assert!(ThresholdEvaluator::default()
            .evaluate(&mixed_snapshot())
            .passed);
    }

    #[test]
    fn check_rate_can_target_one_check() {
        let check = |name: &str, passed| CheckResult {
            name: name.into(),
            passed,
        };
        let snapshot = Snapshot {
            samples: vec![],
            checks: vec![
                check("precheck accepted", true),
                check("precheck accepted", false),
                check("is status 200 or 409 or 429", true),
                check("is status 200 or 409 or 429", true),
            ],
        };

        let verdict = evaluator(&[
            ThresholdSpec::new("checks", "rate>0.7"),
            ThresholdSpec::new("checks", "rate==1").for_check("is status 200 or 409 or 429"),
        ])
        .evaluate(&snapshot);

        assert!(verdict.thresholds["checks: rate>0.7"].passed);
        assert!(verdict.thresholds["checks{is status 200 or 409 or 429}: rate==1"].passed);
    }

    #[test]
    fn latency_summary_of_known_samples() {
        let samples: Vec<_> = (1..=100).map(|ms| sample(ms, Some(200))).collect();
        let summary = latency_summary(&samples);
        assert_eq!(summary.min, Duration::from_millis(1));
        assert_eq!(summary.max, Duration::from_millis(100));
        assert!(summary.p90 <= summary.p95 && summary.p95 <= summary.p99);
        assert_eq!(latency_summary(&[]), LatencySummary::default());
    }

    #[test]
    #[ntest::timeout(5000)]
    fn large_sample_sets_evaluate_quickly() {
        let snapshot = Snapshot {
            samples: (0..500_000u64)
                .map(|i| sample(i % 997, Some(if i % 13 == 0 { 409 } else { 200 })))
                .collect(),
            checks: vec![],
        };
        let verdict = duplicated_sell().evaluate(&snapshot);
        assert!(!verdict.thresholds["http_req_duration: p(95)<300"].passed);
        assert!(verdict.thresholds["http_req_failed{tolerate=409,429}: rate<0.15"].passed);
    }
}
