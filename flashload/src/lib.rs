#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod checks;
pub mod context;
mod error;
pub mod evaluator;
pub mod executor;
pub mod pacing;
pub mod pattern;
pub mod request;
pub mod sample_log;
pub mod schedule;

pub(crate) mod scheduler;
pub(crate) mod vu;

pub use error::Error;
pub use load_test::LoadTest;

pub mod prelude {
    pub use crate::checks::CheckSet;
    pub use crate::executor::{Executor, HttpExecutor};
    pub use crate::load_test::LoadTest;
    pub use crate::request::{Outcome, Request, Response};
    pub use flashload_core::{
        FailureScope, Pacing, Predicate, Preset, ProfileConfig, RampPolicy, RunConfig, RunReport,
        SpoofMode, ThresholdSpec, Verdict,
    };
}
