use super::{Pattern, RequestDraft};
use crate::context::IterationContext;
use flashload_core::FailureScope;

/// Swaps the identity for a sentinel the target answers with a server error.
pub(crate) struct ForcedFailureInjection {
    period: u64,
    sentinel: String,
    scope: FailureScope,
}

impl ForcedFailureInjection {
    pub fn new(period: u64, sentinel: String, scope: FailureScope) -> Self {
        Self {
            period,
            sentinel,
            scope,
        }
    }

    fn selects(&self, ctx: &IterationContext) -> bool {
        let n = match self.scope {
            FailureScope::Iteration => ctx.iteration,
            FailureScope::VirtualUser => ctx.vu,
        };
        n % self.period == 0
    }
}

impl Pattern for ForcedFailureInjection {
    fn apply(&self, ctx: &IterationContext, draft: &mut RequestDraft) {
        if self.selects(ctx) {
            draft.identity.clone_from(&self.sentinel);
        }
    }
}
