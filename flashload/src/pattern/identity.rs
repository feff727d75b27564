use super::{Pattern, RequestDraft};
use crate::context::{IterationContext, RngStream};
use flashload_core::IdentityFormat;
use rand::Rng;

/// `prefix + n` with `n` drawn uniformly from `[min, max)`.
pub(crate) struct UniformRandomIdentity {
    prefix: String,
    min: u64,
    max: u64,
    bot_user_agent: bool,
}

impl UniformRandomIdentity {
    pub fn new(prefix: String, min: u64, max: u64, bot_user_agent: bool) -> Self {
        Self {
            prefix,
            min,
            max,
            bot_user_agent,
        }
    }
}

impl Pattern for UniformRandomIdentity {
    fn apply(&self, ctx: &IterationContext, draft: &mut RequestDraft) {
        let n = ctx.rng(RngStream::Identity).gen_range(self.min..self.max);
        draft.identity = format!("{}{n}", self.prefix);
        if self.bot_user_agent {
            draft.set_header("User-Agent", format!("Bot-{n}"));
        }
    }
}

pub(crate) struct FixedSingleIdentity {
    identity: String,
}

impl FixedSingleIdentity {
    pub fn new(identity: String) -> Self {
        Self { identity }
    }
}

impl Pattern for FixedSingleIdentity {
    fn apply(&self, _ctx: &IterationContext, draft: &mut RequestDraft) {
        draft.identity.clone_from(&self.identity);
    }
}

/// Every `period`-th iteration of a virtual user reuses its fixed identity; all others keep
/// the unique per-iteration identity.
pub(crate) struct DuplicateInjection {
    period: u64,
    format: IdentityFormat,
}

impl DuplicateInjection {
    pub fn new(period: u64, format: IdentityFormat) -> Self {
        Self { period, format }
    }
}

impl Pattern for DuplicateInjection {
    fn apply(&self, ctx: &IterationContext, draft: &mut RequestDraft) {
        if ctx.iteration % self.period == 0 {
            draft.identity = self.format.fixed(ctx.vu);
        }
    }
}
