//! Unknown utterance store - per-language utterance → answers database
//!
//! Utterances the assistant could not handle are recorded here with an
//! append-only answer list. Every insertion batch is flushed to the
//! settings backend. The map sits behind a mutex so a batch is a single
//! read-modify-write even when the host dispatches from several threads.

use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

use crate::error::{Result, ValidationError};
use crate::settings::SettingsBackend;
use crate::types::{OneOrMany, Partition, UtteranceDb};

/// Persistent store of unknown utterances and their learned answers
pub struct UnknownUtteranceStore {
    db: Mutex<UtteranceDb>,
    settings: Arc<dyn SettingsBackend>,
    default_lang: String,
}

impl UnknownUtteranceStore {
    /// Load the store from the settings backend
    ///
    /// A backend with nothing stored yet starts an empty database. The
    /// default language partition always exists afterwards.
    pub fn load(settings: Arc<dyn SettingsBackend>, default_lang: &str) -> Result<Self> {
        let default_lang = validate_lang(default_lang)?;
        let mut db = settings.load()?.unwrap_or_default();
        db.entry(default_lang.clone()).or_default();

        info!(
            "Loaded utterance store: {} language(s), {} utterance(s) for {}",
            db.len(),
            db.get(&default_lang).map(|p| p.len()).unwrap_or(0),
            default_lang
        );

        Ok(Self {
            db: Mutex::new(db),
            settings,
            default_lang,
        })
    }

    /// Language used when callers do not name one
    pub fn default_lang(&self) -> &str {
        &self.default_lang
    }

    /// Make sure a partition exists for `lang`
    pub fn ensure_language(&self, lang: &str) -> Result<()> {
        let lang = validate_lang(lang)?;
        let mut db = self.lock();
        if !db.contains_key(&lang) {
            debug!("Created utterance partition for {}", lang);
            db.insert(lang, Partition::new());
        }
        Ok(())
    }

    /// Record utterances, optionally with answers
    ///
    /// New utterances are inserted with `answers` (or an empty list); known
    /// utterances get `answers` appended, duplicates included. The settings
    /// backend is flushed once after the whole batch, even an empty one.
    pub fn add_utterances(
        &self,
        utterances: impl Into<OneOrMany>,
        answers: Option<OneOrMany>,
        lang: Option<&str>,
    ) -> Result<()> {
        let utterances = utterances.into().into_vec();
        let answers = answers.map(OneOrMany::into_vec).unwrap_or_default();
        let lang = match lang {
            Some(lang) => validate_lang(lang)?,
            None => self.default_lang.clone(),
        };

        for utterance in &utterances {
            if utterance.trim().is_empty() {
                return Err(ValidationError::EmptyUtterance.into());
            }
            ensure_single_line("utterance", utterance)?;
        }
        for answer in &answers {
            ensure_single_line("answer", answer)?;
        }

        let mut db = self.lock();
        let partition = db.entry(lang.clone()).or_default();

        for utterance in &utterances {
            match partition.get_mut(utterance) {
                Some(existing) => {
                    existing.extend(answers.iter().cloned());
                    debug!(
                        "Appended {} answer(s) to '{}' ({} total)",
                        answers.len(),
                        utterance,
                        existing.len()
                    );
                }
                None => {
                    partition.insert(utterance.clone(), answers.clone());
                    info!("Stored unknown utterance '{}' [{}]", utterance, lang);
                }
            }
        }

        self.settings.store(&db)
    }

    /// Copy of one language partition, empty if the language is unknown
    pub fn partition(&self, lang: &str) -> Partition {
        self.lock().get(lang).cloned().unwrap_or_default()
    }

    /// Answers recorded for an utterance
    pub fn answers(&self, lang: &str, utterance: &str) -> Option<Vec<String>> {
        self.lock()
            .get(lang)
            .and_then(|partition| partition.get(utterance))
            .cloned()
    }

    /// Utterances with fewer than `threshold` answers
    pub fn pending(&self, lang: &str, threshold: usize) -> Vec<String> {
        self.lock()
            .get(lang)
            .map(|partition| {
                partition
                    .iter()
                    .filter(|(_, answers)| answers.len() < threshold)
                    .map(|(utterance, _)| utterance.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Known language codes
    pub fn languages(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    /// Number of utterances stored for `lang`
    pub fn len(&self, lang: &str) -> usize {
        self.lock().get(lang).map(|p| p.len()).unwrap_or(0)
    }

    pub fn is_empty(&self, lang: &str) -> bool {
        self.len(lang) == 0
    }

    /// Copy of the whole database
    pub fn snapshot(&self) -> UtteranceDb {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, UtteranceDb> {
        // A panic mid-batch leaves a consistent map: each utterance update is a
        // single insert or extend.
        self.db.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Trimmed language code, usable as a single path component
///
/// Only ASCII letters, digits, `-` and `_` are accepted, so codes such as
/// `../x` or `/tmp` cannot leave the skill directory.
pub(crate) fn validate_lang(lang: &str) -> Result<String> {
    let lang = lang.trim();
    if lang.is_empty() {
        return Err(ValidationError::EmptyLanguage.into());
    }
    if !lang.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        return Err(ValidationError::InvalidLanguage(lang.to_string()).into());
    }
    Ok(lang.to_string())
}

fn ensure_single_line(kind: &'static str, value: &str) -> Result<()> {
    if value.contains('\n') || value.contains('\r') {
        return Err(ValidationError::MultiLine {
            kind,
            value: value.to_string(),
        }
        .into());
    }
    Ok(())
}
