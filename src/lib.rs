//! learn-unknown - learn answers for utterances an assistant did not understand
//!
//! A fallback skill that:
//! - records every utterance no intent matched, per language
//! - asks the user how such utterances should be answered
//! - writes answered utterances out as `.intent` / `.dialog` files and
//!   registers them with the host's intent matcher
//!
//! The host runtime is reached only through [`host::SkillHost`] and the
//! settings through [`settings::SettingsBackend`].
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use learn_unknown::{Config, JsonSettings, LearnUnknownSkill, Message};
//!
//! let config = Config::load_from(&learn_unknown::config::config_path()?)?;
//! let settings = Arc::new(JsonSettings::new(config.skill.settings_path()));
//! let skill = LearnUnknownSkill::new(&config, settings, host)?;
//! skill.initialize()?;
//! skill.handle_fallback(&Message::new("what time is sunset"))?;
//! ```

// Core modules
pub mod error;
pub mod types;
pub mod settings;
pub mod normalize;
pub mod random;
pub mod host;
pub mod dialog;
pub mod learning;
pub mod skill;

// Application modules
pub mod config;
pub mod console;
pub mod cli;

pub use error::{LearnError, Result, ValidationError};
pub use types::{FallbackOutcome, Message, OneOrMany, Partition, UtteranceDb};
pub use settings::{JsonSettings, MemorySettings, SettingsBackend};
pub use normalize::{Normalizer, TextNormalizer};
pub use random::{RandomSource, StdRandom};
pub use host::{FallbackChain, FallbackFn, LearnedIntent, SkillHost};
pub use dialog::DialogRenderer;
pub use learning::{
    FallbackHandler, IntentMaterializer, LearnOutcome, LearnPrompt, MaterializeReport,
    UnknownUtteranceStore,
};
pub use skill::LearnUnknownSkill;
pub use config::Config;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
