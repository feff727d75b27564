use crate::checks::CheckSet;
use crate::context::IterationContext;
use crate::executor::Executor;
use crate::pacing::Pacer;
use crate::pattern::CompositePattern;
use crate::request::Outcome;
use crate::sample_log::{MetricSample, SampleLog};
use governor::DefaultDirectRateLimiter;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

/// Cooperative stop flag of one virtual user.
#[derive(Debug, Default)]
pub(crate) struct StopSignal {
    stopped: AtomicBool,
    notify: Notify,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
        self.notify.notify_waiters();
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Resolves once [`StopSignal::stop`] has been called.
    pub async fn stopped(&self) {
        loop {
            // NOTE: register before checking the flag, so a concurrent `stop` is never missed.
            let notified = self.notify.notified();
            if self.is_stopped() {
                return;
            }
            notified.await;
        }
    }
}

/// Everything a virtual user shares with the rest of the run.
pub(crate) struct VuEnv<E> {
    pub url: String,
    pub seed: u64,
    pub pattern: CompositePattern,
    pub executor: E,
    pub checks: CheckSet,
    pub pacer: Pacer,
    pub limiter: Option<DefaultDirectRateLimiter>,
    pub log: SampleLog,
}

/// Iterate until stopped. An in-flight request is always completed and recorded; waits for the
/// rate cap and pacing sleeps are cut short.
pub(crate) async fn run_virtual_user<E: Executor>(
    vu: u64,
    env: Arc<VuEnv<E>>,
    stop: Arc<StopSignal>,
) {
    trace!("VU {vu} started");
    let mut iteration = 0;

    while !stop.is_stopped() {
        let ctx = IterationContext::new(vu, iteration, env.seed);
        let request = env.pattern.build(&ctx, &env.url);

        if let Some(limiter) = &env.limiter {
            tokio::select! {
                _ = limiter.until_ready() => {}
                _ = stop.stopped() => break,
            }
        }

        let outcome = env.executor.execute(&request).await;
        let checks = env.checks.evaluate(&outcome);

        #[cfg(feature = "metrics")]
        {
            let status = outcome
                .status()
                .map_or_else(|| "transport".to_string(), |s| s.to_string());
            metrics::counter!("flashload_http_reqs", "status" => status).increment(1);
            metrics::histogram!("flashload_http_req_duration")
                .record(outcome.latency().as_secs_f64());
            if checks.iter().any(|c| !c.passed) {
                metrics::counter!("flashload_checks_failed").increment(1);
            }
        }

        if let Outcome::TransportFailure(failure) = &outcome {
            debug!("VU {vu} iteration {iteration}: {} failure: {}", failure.kind, failure.cause);
        }

        env.log.record(
            MetricSample {
                latency: outcome.latency(),
                status: outcome.status(),
            },
            checks,
        );
        iteration += 1;

        match env.pacer.delay(&ctx) {
            Some(delay) => {
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = stop.stopped() => break,
                }
            }
            None => tokio::task::yield_now().await,
        }
    }

    trace!("VU {vu} stopped after {iteration} iterations");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stop_wakes_waiters() {
        let stop = Arc::new(StopSignal::new());
        let waiter = {
            let stop = stop.clone();
            tokio::spawn(async move { stop.stopped().await })
        };
        tokio::task::yield_now().await;
        stop.stop();
        waiter.await.unwrap();

        // Already stopped: resolves immediately.
        stop.stopped().await;
        assert!(stop.is_stopped());
    }
}
