use super::{Pattern, RequestDraft};
use crate::context::{IterationContext, RngStream};
use flashload_core::SpoofMode;
use rand::Rng;

/// Claims an identity through a client-supplied header. Applied last, so `Mirror` sees the
/// final body identity.
pub(crate) struct SpoofedIdentityHeaders {
    pub header: String,
    pub prefix: String,
    pub max: u64,
    pub mode: SpoofMode,
    pub user_agent: Option<String>,
    pub strip_body_identity: bool,
}

impl Pattern for SpoofedIdentityHeaders {
    fn apply(&self, ctx: &IterationContext, draft: &mut RequestDraft) {
        let claimed = match self.mode {
            SpoofMode::Independent => {
                let n = ctx.rng(RngStream::Spoof).gen_range(0..self.max);
                format!("{}{n}", self.prefix)
            }
            SpoofMode::Mirror => draft.identity.clone(),
        };
        draft.set_header(&self.header, claimed);

        if let Some(user_agent) = &self.user_agent {
            draft.set_header("User-Agent", user_agent.clone());
        }
        if self.strip_body_identity {
            draft.body_identity = false;
        }
    }
}
