//! Unknown-utterance learning loop
//!
//! Captures utterances nothing else understood, asks the user for answers,
//! and writes answered utterances out as intent and dialog files for the
//! intent matcher to pick up.

pub mod store;
pub mod fallback;
pub mod prompt;
pub mod materializer;

pub use store::UnknownUtteranceStore;
pub use fallback::{FallbackHandler, FALLBACK_PRIORITY};
pub use prompt::{LearnPrompt, LearnOutcome, ANSWER_THRESHOLD};
pub use materializer::{IntentMaterializer, MaterializeReport, file_stem};
