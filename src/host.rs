//! Host runtime seams
//!
//! The skill never talks to the speech stack, the intent matcher or the
//! dialog engine directly. It goes through [`SkillHost`], which the host
//! application implements. [`FallbackChain`] is a ready-made priority-ordered
//! fallback registry for hosts that do not bring their own.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::Result;
use crate::types::{FallbackOutcome, Message};

/// Type alias for fallback handler functions
pub type FallbackFn = Arc<dyn Fn(&Message) -> Result<FallbackOutcome> + Send + Sync>;

/// A learned intent as registered with the matcher
///
/// One entry per materialized utterance. The host calls back with the
/// intent name and [`crate::skill::LearnUnknownSkill::dispatch`] speaks the
/// dialog named by `answer_key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LearnedIntent {
    /// Utterance the intent was learned from
    pub utterance_key: String,
    /// Dialog key holding the learned answers
    pub answer_key: String,
}

impl LearnedIntent {
    /// Name the intent is registered under
    pub fn name(&self) -> String {
        format!("{}.intent", self.utterance_key)
    }
}

/// Services the host runtime provides to the skill
#[cfg_attr(test, mockall::automock)]
pub trait SkillHost: Send + Sync {
    /// Add a fallback handler; lower priority values run first
    fn register_fallback(&self, name: &str, priority: i32, handler: FallbackFn);

    /// Register an intent file from the skill's vocab directory
    fn register_intent_file(&self, filename: &str, intent: &LearnedIntent) -> Result<()>;

    /// Ask the user something and wait for a reply; `None` on timeout or decline
    fn get_response(&self, prompt: &str) -> Option<String>;

    /// Speak a random line of the named dialog
    fn speak_dialog(&self, key: &str);

    /// Render a dialog template with parameters
    fn render_dialog(&self, key: &str, params: &HashMap<String, String>) -> String;
}

/// A registered fallback with metadata
struct RegisteredFallback {
    name: String,
    priority: i32,
    handler: FallbackFn,
}

/// Priority-ordered fallback handlers
#[derive(Default)]
pub struct FallbackChain {
    fallbacks: Vec<RegisteredFallback>,
}

impl FallbackChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fallback; handlers with equal priority keep insertion order
    pub fn register(&mut self, name: &str, priority: i32, handler: FallbackFn) {
        self.fallbacks.push(RegisteredFallback {
            name: name.to_string(),
            priority,
            handler,
        });
        // Stable sort (lower = earlier)
        self.fallbacks.sort_by_key(|f| f.priority);

        debug!("Registered fallback '{}' with priority {}", name, priority);
    }

    /// Remove a fallback by name
    pub fn unregister(&mut self, name: &str) -> bool {
        let before = self.fallbacks.len();
        self.fallbacks.retain(|f| f.name != name);
        self.fallbacks.len() < before
    }

    /// Run fallbacks in priority order until one consumes the message
    ///
    /// Returns the name of the consuming fallback. A failing handler is
    /// logged and treated as not consumed.
    pub fn handle(&self, message: &Message) -> Option<String> {
        for fallback in &self.fallbacks {
            match (fallback.handler)(message) {
                Ok(FallbackOutcome::Consumed) => {
                    debug!("Fallback '{}' consumed '{}'", fallback.name, message.utterance);
                    return Some(fallback.name.clone());
                }
                Ok(FallbackOutcome::NotConsumed) => {}
                Err(e) => {
                    warn!("Fallback '{}' failed: {}", fallback.name, e);
                }
            }
        }
        None
    }

    pub fn len(&self) -> usize {
        self.fallbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fallbacks.is_empty()
    }

    /// Registered fallbacks as (name, priority), in run order
    pub fn list(&self) -> Vec<(String, i32)> {
        self.fallbacks
            .iter()
            .map(|f| (f.name.clone(), f.priority))
            .collect()
    }
}
