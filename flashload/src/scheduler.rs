

use crate::executor::Executor;
use crate::vu::{run_virtual_user, StopSignal, VuEnv};
use std::sync::Arc;
use tokio::task::JoinHandle;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

struct VirtualUser {
    id: u64,
    stop: Arc<StopSignal>,
    handle: JoinHandle<()>,
}

/// Owns the virtual users of a run and converges their number onto a target.
pub(crate) struct Scheduler<E> {
    env: Arc<VuEnv<E>>,
    active: Vec<VirtualUser>,
    retiring: Vec<VirtualUser>,
    next_id: u64,
}

impl<E: Executor> Scheduler<E> {
    pub fn new(env: Arc<VuEnv<E>>) -> Self {
        Self {
            env,
            active: vec![],
            retiring: vec![],
            next_id: 1,
        }
    }

    /// Spawn or retire virtual users until `target` are active. Excess users are retired newest
    /// first; each finishes its in-flight iteration before exiting.
    pub fn reconcile(&mut self, target: usize) {
        self.reap();

        let live = self.active.len();
        if live < target {
            debug!("Spawning {} virtual users ({live} -> {target})", target - live);
            while self.active.len() < target {
                let id = self.next_id;
                self.next_id += 1;

                let stop = Arc::new(StopSignal::new());
                let handle = tokio::spawn(run_virtual_user(id, self.env.clone(), stop.clone()));
                self.active.push(VirtualUser { id, stop, handle });
            }
        } else if live > target {
            debug!("Retiring {} virtual users ({live} -> {target})", live - target);
            for vu in self.active.drain(target..).rev() {
                vu.stop.stop();
                self.retiring.push(vu);
            }
        }

        #[cfg(feature = "metrics")]
        metrics::gauge!("flashload_vus").set(self.active.len() as f64);
    }

    /// Virtual users not asked to stop.
    pub fn live(&self) -> usize {
        self.active.len()
    }

    /// Stopped virtual users still finishing their last iteration.
    pub fn retiring(&self) -> usize {
        self.retiring.len()
    }

    fn reap(&mut self) {
        self.retiring.retain(|vu| !vu.handle.is_finished());
    }

    /// Stop every virtual user and wait for all of them to exit.
    pub async fn shutdown(mut self) {
        let vus: Vec<_> = self.active.drain(..).chain(self.retiring.drain(..)).collect();
        debug!("Shutting down {} virtual users", vus.len());

        for vu in &vus {
            vu.stop.stop();
        }
        for vu in vus {
            if let Err(e) = vu.handle.await {
                error!("VU {} exited abnormally: {e}", vu.id);
            }
        }

        #[cfg(feature = "metrics")]
        metrics::gauge!("flashload_vus").set(0.);
    }
}
