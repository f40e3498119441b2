//! The learn-unknown skill
//!
//! Owns the utterance store and the three learning components, and plugs
//! them into the host: a fallback at priority 1, a learn prompt, and one
//! intent per answered utterance.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{Result, ValidationError};
use crate::host::{FallbackFn, LearnedIntent, SkillHost};
use crate::learning::{
    FallbackHandler, IntentMaterializer, LearnOutcome, LearnPrompt, MaterializeReport,
    UnknownUtteranceStore,
};
use crate::normalize::{Normalizer, TextNormalizer};
use crate::random::{RandomSource, StdRandom};
use crate::settings::SettingsBackend;
use crate::types::{FallbackOutcome, Message};

/// Name the fallback is registered under
pub const SKILL_NAME: &str = "learn-unknown";

pub struct LearnUnknownSkill {
    lang: String,
    fallback_priority: i32,
    host: Arc<dyn SkillHost>,
    store: Arc<UnknownUtteranceStore>,
    normalizer: Arc<dyn Normalizer>,
    fallback: Arc<FallbackHandler>,
    prompt: LearnPrompt,
    materializer: IntentMaterializer,
    /// Learned intents by registered name
    intents: Mutex<HashMap<String, LearnedIntent>>,
}

impl LearnUnknownSkill {
    /// Build the skill with the default normalizer and randomness
    pub fn new(
        config: &Config,
        settings: Arc<dyn SettingsBackend>,
        host: Arc<dyn SkillHost>,
    ) -> Result<Self> {
        Self::with_collaborators(
            config,
            settings,
            host,
            Arc::new(TextNormalizer::new()),
            Arc::new(StdRandom::new()),
        )
    }

    /// Build the skill with explicit normalizer and randomness
    pub fn with_collaborators(
        config: &Config,
        settings: Arc<dyn SettingsBackend>,
        host: Arc<dyn SkillHost>,
        normalizer: Arc<dyn Normalizer>,
        random: Arc<dyn RandomSource>,
    ) -> Result<Self> {
        let store = Arc::new(UnknownUtteranceStore::load(settings, &config.skill.lang)?);
        let fallback = Arc::new(FallbackHandler::new(store.clone(), normalizer.clone()));
        let prompt = LearnPrompt::new(store.clone(), random)
            .with_threshold(config.learning.answer_threshold);
        let materializer = IntentMaterializer::new(store.clone(), config.skill.skill_dir.clone());

        Ok(Self {
            lang: store.default_lang().to_string(),
            fallback_priority: config.learning.fallback_priority,
            host,
            store,
            normalizer,
            fallback,
            prompt,
            materializer,
            intents: Mutex::new(HashMap::new()),
        })
    }

    /// Register the fallback and the intents learned so far
    pub fn initialize(&self) -> Result<MaterializeReport> {
        let fallback = self.fallback.clone();
        let handler: FallbackFn = Arc::new(move |message: &Message| fallback.handle(message));
        self.host.register_fallback(SKILL_NAME, self.fallback_priority, handler);

        let report = self.create_learned_intents()?;
        info!(
            "Initialized {}: {} learned intent(s), {} utterance(s) awaiting answers",
            SKILL_NAME,
            report.materialized.len(),
            report.skipped
        );
        Ok(report)
    }

    /// Write and register an intent for every answered utterance
    pub fn create_learned_intents(&self) -> Result<MaterializeReport> {
        let report = self.materializer.materialize(self.host.as_ref(), &self.lang)?;

        let mut intents = self.intents();
        for intent in &report.materialized {
            intents.insert(intent.name(), intent.clone());
        }
        Ok(report)
    }

    /// Record an utterance no other intent matched
    pub fn handle_fallback(&self, message: &Message) -> Result<FallbackOutcome> {
        self.fallback.handle(message)
    }

    /// Ask the user to answer one recorded utterance
    pub fn handle_learn(&self, lang: Option<&str>) -> Result<LearnOutcome> {
        self.prompt.run(self.host.as_ref(), lang.or(Some(self.lang.as_str())))
    }

    /// Store an answer for an utterance directly
    ///
    /// The utterance is normalized the same way fallbacks are, so it lands on
    /// the entry a later fallback would have created. An utterance with no
    /// words left after normalizing is a [`ValidationError::EmptyUtterance`].
    pub fn teach(&self, utterance: &str, answer: &str, lang: Option<&str>) -> Result<()> {
        let lang = lang.unwrap_or(&self.lang);
        let utterance = self.normalizer.normalize(utterance, lang);
        if utterance.is_empty() {
            return Err(ValidationError::EmptyUtterance.into());
        }
        let answer = answer.split_whitespace().collect::<Vec<_>>().join(" ");
        let answers = (!answer.is_empty()).then(|| answer.into());

        self.store.add_utterances(utterance, answers, Some(lang))
    }

    /// Speak the learned answer for a matched intent
    ///
    /// Returns false for intents this skill did not register.
    pub fn dispatch(&self, intent_name: &str) -> bool {
        let intent = self.intents().get(intent_name).cloned();
        match intent {
            Some(intent) => {
                self.host.speak_dialog(&intent.answer_key);
                true
            }
            None => {
                warn!("No learned intent named '{}'", intent_name);
                false
            }
        }
    }

    /// Intents registered by the last materialization runs
    pub fn learned_intents(&self) -> Vec<LearnedIntent> {
        let mut intents: Vec<LearnedIntent> = self.intents().values().cloned().collect();
        intents.sort_by(|a, b| a.utterance_key.cmp(&b.utterance_key));
        intents
    }

    pub fn store(&self) -> &Arc<UnknownUtteranceStore> {
        &self.store
    }

    pub fn lang(&self) -> &str {
        &self.lang
    }

    fn intents(&self) -> MutexGuard<'_, HashMap<String, LearnedIntent>> {
        self.intents.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
