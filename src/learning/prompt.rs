//! Learn prompt - asks the user how to answer a recorded utterance
//!
//! Picks one utterance that still lacks answers, renders the `what.answer`
//! question and feeds the reply back into the store. No reply is a normal
//! outcome; the utterance stays pending for next time.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use super::store::UnknownUtteranceStore;
use crate::dialog::WHAT_ANSWER;
use crate::error::Result;
use crate::host::SkillHost;
use crate::random::{self, RandomSource};

/// Utterances with fewer answers than this are asked about
pub const ANSWER_THRESHOLD: usize = 2;

/// What a learn prompt did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LearnOutcome {
    /// The user answered and the answer was stored
    Learned { utterance: String, answer: String },
    /// The user was asked but gave no answer
    NoResponse { utterance: String },
    /// No utterance needs answers
    NothingToLearn,
}

/// Collects answers for unknown utterances
pub struct LearnPrompt {
    store: Arc<UnknownUtteranceStore>,
    random: Arc<dyn RandomSource>,
    threshold: usize,
}

impl LearnPrompt {
    pub fn new(store: Arc<UnknownUtteranceStore>, random: Arc<dyn RandomSource>) -> Self {
        Self {
            store,
            random,
            threshold: ANSWER_THRESHOLD,
        }
    }

    /// Ask about utterances with fewer than `threshold` answers
    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Ask the user for one answer
    pub fn run(&self, host: &dyn SkillHost, lang: Option<&str>) -> Result<LearnOutcome> {
        let lang = lang.unwrap_or_else(|| self.store.default_lang());

        let candidates = self.store.pending(lang, self.threshold);
        let Some(utterance) = random::choose(self.random.as_ref(), &candidates).cloned() else {
            debug!("Nothing to learn for {} ({} utterance(s) known)", lang, self.store.len(lang));
            return Ok(LearnOutcome::NothingToLearn);
        };

        let mut params = HashMap::new();
        params.insert("question".to_string(), utterance.clone());
        let question = host.render_dialog(WHAT_ANSWER, &params);

        let answer = host
            .get_response(&question)
            .map(|reply| reply.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|reply| !reply.is_empty());

        match answer {
            Some(answer) => {
                self.store
                    .add_utterances(utterance.clone(), Some(answer.clone().into()), Some(lang))?;
                info!("Learned answer for '{}': '{}'", utterance, answer);
                Ok(LearnOutcome::Learned { utterance, answer })
            }
            None => {
                debug!("No answer given for '{}'", utterance);
                Ok(LearnOutcome::NoResponse { utterance })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MockSkillHost;
    use crate::random::StdRandom;
    use crate::settings::MemorySettings;

    fn store() -> Arc<UnknownUtteranceStore> {
        Arc::new(UnknownUtteranceStore::load(Arc::new(MemorySettings::new()), "en-us").unwrap())
    }

    fn prompt(store: &Arc<UnknownUtteranceStore>) -> LearnPrompt {
        LearnPrompt::new(store.clone(), Arc::new(StdRandom::seeded(3)))
    }

    #[test]
    fn test_empty_store_asks_nothing() {
        let store = store();
        let mut host = MockSkillHost::new();
        host.expect_render_dialog().never();
        host.expect_get_response().never();

        assert_eq!(prompt(&store).run(&host, None).unwrap(), LearnOutcome::NothingToLearn);
    }

    #[test]
    fn test_answer_is_stored() {
        let store = store();
        store.add_utterances("what time is sunset", None, None).unwrap();

        let mut host = MockSkillHost::new();
        host.expect_render_dialog()
            .withf(|key, params| key == WHAT_ANSWER && params["question"] == "what time is sunset")
            .times(1)
            .returning(|_, params| format!("How do I answer {}?", params["question"]));
        host.expect_get_response()
            .withf(|prompt| prompt == "How do I answer what time is sunset?")
            .times(1)
            .returning(|_| Some("  sunset is at seven ".to_string()));

        let outcome = prompt(&store).run(&host, None).unwrap();
        assert_eq!(
            outcome,
            LearnOutcome::Learned {
                utterance: "what time is sunset".to_string(),
                answer: "sunset is at seven".to_string(),
            }
        );
        assert_eq!(
            store.answers("en-us", "what time is sunset").unwrap(),
            vec!["sunset is at seven"]
        );
    }

    #[test]
    fn test_no_response_leaves_store_untouched() {
        let store = store();
        store.add_utterances("tell me a riddle", None, None).unwrap();

        let mut host = MockSkillHost::new();
        host.expect_render_dialog().returning(|_, _| "question".to_string());
        host.expect_get_response().times(1).returning(|_| None);

        let outcome = prompt(&store).run(&host, None).unwrap();
        assert_eq!(outcome, LearnOutcome::NoResponse { utterance: "tell me a riddle".to_string() });
        assert_eq!(store.answers("en-us", "tell me a riddle"), Some(vec![]));
    }

    #[test]
    fn test_blank_response_counts_as_none() {
        let store = store();
        store.add_utterances("tell me a riddle", None, None).unwrap();

        let mut host = MockSkillHost::new();
        host.expect_render_dialog().returning(|_, _| "question".to_string());
        host.expect_get_response().returning(|_| Some("   ".to_string()));

        let outcome = prompt(&store).run(&host, None).unwrap();
        assert!(matches!(outcome, LearnOutcome::NoResponse { .. }));
        assert_eq!(store.answers("en-us", "tell me a riddle"), Some(vec![]));
    }

    #[test]
    fn test_fully_answered_never_prompted() {
        let store = store();
        store.add_utterances("hello", Some(vec!["hi", "hey"].into()), None).unwrap();
        store.add_utterances("goodbye", Some(vec!["bye", "see you"].into()), None).unwrap();

        let mut host = MockSkillHost::new();
        host.expect_render_dialog().never();
        host.expect_get_response().never();

        for _ in 0..10 {
            assert_eq!(prompt(&store).run(&host, None).unwrap(), LearnOutcome::NothingToLearn);
        }
    }

    #[test]
    fn test_only_pending_utterances_selected() {
        let store = store();
        store.add_utterances("answered", Some(vec!["a", "b"].into()), None).unwrap();
        store.add_utterances("half answered", Some("a".into()), None).unwrap();

        let mut host = MockSkillHost::new();
        host.expect_render_dialog()
            .withf(|_, params| params["question"] == "half answered")
            .times(5)
            .returning(|_, _| "question".to_string());
        host.expect_get_response().times(5).returning(|_| None);

        let learn = LearnPrompt::new(store.clone(), Arc::new(StdRandom::new()));
        for _ in 0..5 {
            learn.run(&host, None).unwrap();
        }
    }

    #[test]
    fn test_custom_threshold() {
        let store = store();
        store.add_utterances("hello", Some(vec!["hi", "hey"].into()), None).unwrap();

        let mut host = MockSkillHost::new();
        host.expect_render_dialog().returning(|_, _| "question".to_string());
        host.expect_get_response().returning(|_| Some("howdy".to_string()));

        let learn = prompt(&store).with_threshold(3);
        assert_eq!(learn.threshold(), 3);
        assert!(matches!(learn.run(&host, None).unwrap(), LearnOutcome::Learned { .. }));
        assert_eq!(store.answers("en-us", "hello").unwrap(), vec!["hi", "hey", "howdy"]);
    }

    #[test]
    fn test_other_language() {
        let store = store();
        store.add_utterances("wie spät ist es", None, Some("de-de")).unwrap();

        let mut host = MockSkillHost::new();
        host.expect_render_dialog().returning(|_, _| "Frage".to_string());
        host.expect_get_response().returning(|_| Some("zu spät".to_string()));

        let outcome = prompt(&store).run(&host, Some("de-de")).unwrap();
        assert!(matches!(outcome, LearnOutcome::Learned { .. }));
        assert_eq!(store.answers("de-de", "wie spät ist es").unwrap(), vec!["zu spät"]);
    }
}
