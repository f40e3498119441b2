//! Console host - runs the skill in a terminal
//!
//! Stands in for the voice runtime: typed lines play the role of
//! transcribed utterances, spoken dialog is printed, and learned intents are
//! matched by exact normalized text.

use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

use crate::dialog::DialogRenderer;
use crate::error::Result;
use crate::host::{FallbackChain, FallbackFn, LearnedIntent, SkillHost};
use crate::types::Message;

/// Prompt shown when waiting for an answer
const ANSWER_PROMPT: &str = "answer> ";

pub struct ConsoleHost {
    renderer: DialogRenderer,
    fallbacks: Mutex<FallbackChain>,
    /// Intent name by trigger utterance
    intents: Mutex<HashMap<String, String>>,
}

impl ConsoleHost {
    pub fn new(renderer: DialogRenderer) -> Self {
        Self {
            renderer,
            fallbacks: Mutex::new(FallbackChain::new()),
            intents: Mutex::new(HashMap::new()),
        }
    }

    /// Intent name registered for a normalized utterance
    pub fn match_intent(&self, utterance: &str) -> Option<String> {
        self.intents
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(utterance)
            .cloned()
    }

    /// Run the fallback chain; returns the consuming fallback, if any
    pub fn run_fallbacks(&self, message: &Message) -> Option<String> {
        self.fallbacks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .handle(message)
    }

    /// Fallbacks registered so far, in run order
    pub fn fallbacks(&self) -> Vec<(String, i32)> {
        self.fallbacks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .list()
    }

    /// Read one trimmed line from the terminal; `None` on EOF or Ctrl-C
    pub fn read_line(&self, prompt: &str) -> Option<String> {
        let mut rl = match rustyline::DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                debug!("Terminal input unavailable: {}", e);
                return None;
            }
        };

        match rl.readline(prompt) {
            Ok(line) => Some(line.trim().to_string()),
            Err(rustyline::error::ReadlineError::Interrupted)
            | Err(rustyline::error::ReadlineError::Eof) => None,
            Err(e) => {
                debug!("Read failed: {}", e);
                None
            }
        }
    }
}

impl SkillHost for ConsoleHost {
    fn register_fallback(&self, name: &str, priority: i32, handler: FallbackFn) {
        self.fallbacks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .register(name, priority, handler);
    }

    fn register_intent_file(&self, filename: &str, intent: &LearnedIntent) -> Result<()> {
        debug!("Registered intent file {} as {}", filename, intent.name());
        self.intents
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(intent.utterance_key.clone(), intent.name());
        Ok(())
    }

    fn get_response(&self, prompt: &str) -> Option<String> {
        println!("{}", prompt);
        self.read_line(ANSWER_PROMPT).filter(|line| !line.is_empty())
    }

    fn speak_dialog(&self, key: &str) {
        println!("{}", self.renderer.render(key, &HashMap::new()));
    }

    fn render_dialog(&self, key: &str, params: &HashMap<String, String>) -> String {
        self.renderer.render(key, params)
    }
}
