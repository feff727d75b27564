use crate::context::{IterationContext, RngStream};
use flashload_core::Pacing;
use rand::Rng;
use std::time::Duration;

/// Per-iteration delay derived from [`Pacing`]. Jitter is drawn from the iteration's own random
/// stream, so pacing never shifts the request pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pacer {
    pacing: Pacing,
}

impl Pacer {
    pub fn new(pacing: Pacing) -> Self {
        Self { pacing }
    }

    pub fn delay(&self, ctx: &IterationContext) -> Option<Duration> {
        match self.pacing {
            Pacing::None => None,
            Pacing::Fixed { delay } if delay.is_zero() => None,
            Pacing::Fixed { delay } => Some(delay),
            Pacing::Jittered { base, spread } if spread.is_zero() => {
                (!base.is_zero()).then_some(base)
            }
            Pacing::Jittered { base, spread } => {
                let nanos = spread.as_nanos().min(u64::MAX as u128) as u64;
                let jitter = ctx.rng(RngStream::Pacing).gen_range(0..nanos);
                Some(base + Duration::from_nanos(jitter))
            }
        }
    }
}
