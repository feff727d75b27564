use flashload_core::FailureClassifier;
use metrics_util::AtomicBucket;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Latency and status of one executed request. `status` is `None` for transport failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MetricSample {
    pub latency: Duration,
    pub status: Option<u16>,
}

impl MetricSample {
    pub fn failed(&self, classifier: &FailureClassifier) -> bool {
        classifier.is_failure(self.status)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckResult {
    pub name: Arc<str>,
    pub passed: bool,
}

/// Append-only record of every sample of a run, shared by all virtual users.
#[derive(Clone)]
pub struct SampleLog {
    samples: Arc<AtomicBucket<MetricSample>>,
    checks: Arc<AtomicBucket<CheckResult>>,
    iterations: Arc<AtomicU64>,
}

impl SampleLog {
    pub fn new() -> Self {
        Self {
            samples: Arc::new(AtomicBucket::new()),
            checks: Arc::new(AtomicBucket::new()),
            iterations: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn record(&self, sample: MetricSample, checks: Vec<CheckResult>) {
        self.samples.push(sample);
        for check in checks {
            self.checks.push(check);
        }
        self.iterations.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of completed iterations.
    pub fn len(&self) -> u64 {
        self.iterations.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of everything recorded so far. The log itself is left untouched.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            samples: self.samples.data(),
            checks: self.checks.data(),
        }
    }
}

impl Default for SampleLog {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
    pub samples: Vec<MetricSample>,
    pub checks: Vec<CheckResult>,
}
