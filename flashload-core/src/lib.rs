mod checks;
mod config;
mod constants;
mod duration;
mod error;
mod pacing;
mod pattern;
pub mod presets;
mod stage;
mod stats;
mod threshold;

pub use checks::*;
pub use config::*;
pub use constants::*;
pub use duration::HumanDuration;
pub use error::ConfigError;
pub use pacing::*;
pub use pattern::*;
pub use presets::Preset;
pub use stage::*;
pub use stats::*;
pub use threshold::*;
