//! Fallback handler - records every utterance nothing else understood
//!
//! Runs at the front of the fallback chain and never consumes the message,
//! so the usual "I don't understand" fallbacks still answer the user.

use std::sync::Arc;
use tracing::{debug, warn};

use super::store::UnknownUtteranceStore;
use crate::error::Result;
use crate::normalize::Normalizer;
use crate::types::{FallbackOutcome, Message};

/// Priority the fallback is registered with (lower = earlier)
pub const FALLBACK_PRIORITY: i32 = 1;

/// Stores unknown utterances as they fall through the intent matcher
pub struct FallbackHandler {
    store: Arc<UnknownUtteranceStore>,
    normalizer: Arc<dyn Normalizer>,
}

impl FallbackHandler {
    pub fn new(store: Arc<UnknownUtteranceStore>, normalizer: Arc<dyn Normalizer>) -> Self {
        Self { store, normalizer }
    }

    /// Record the utterance without answers
    ///
    /// Always returns [`FallbackOutcome::NotConsumed`] on success. Errors come
    /// from an unusable language tag or the settings flush.
    pub fn handle(&self, message: &Message) -> Result<FallbackOutcome> {
        let lang = message
            .lang
            .as_deref()
            .filter(|lang| !lang.trim().is_empty())
            .unwrap_or_else(|| self.store.default_lang());
        let utterance = self.normalizer.normalize(&message.utterance, lang);

        if utterance.is_empty() {
            warn!(
                "Ignoring utterance with no words left after normalizing: {:?}",
                message.utterance
            );
            return Ok(FallbackOutcome::NotConsumed);
        }

        debug!("Unknown utterance '{}' [{}]", utterance, lang);
        self.store.add_utterances(utterance, None, Some(lang))?;

        Ok(FallbackOutcome::NotConsumed)
    }
}
