//! Intent materializer - turns answered utterances into intent files
//!
//! For every utterance with at least one answer, writes
//! `vocab/<lang>/<utterance>.intent` (the utterance as the single training
//! line) and `dialog/<lang>/<utterance>.dialog` (one answer per line), then
//! registers the intent with the host. Files are overwritten on every run;
//! a failed write aborts the run with the files written so far left in place.
//!
//! File names come from [`file_stem`]: utterances that are not already safe
//! file names get a digest suffix, so no two utterances share a file.

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use super::store::{validate_lang, UnknownUtteranceStore};
use crate::error::{LearnError, Result};
use crate::host::{LearnedIntent, SkillHost};

/// Characters that cannot appear in a file name on common platforms
const RESERVED: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|', '\0'];

/// Longest stem kept before the digest suffix, well under the usual 255-byte
/// file name limit once `-<digest>.intent` is added
const MAX_STEM_BYTES: usize = 200;

/// Hex digits of the utterance digest used in suffixed stems
const DIGEST_LEN: usize = 12;

/// Counts from one materialization run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterializeReport {
    /// Intents written and registered
    pub materialized: Vec<LearnedIntent>,
    /// Utterances left out because they have no answers yet
    pub skipped: usize,
}

/// Writes learned intents under a skill directory
pub struct IntentMaterializer {
    store: Arc<UnknownUtteranceStore>,
    skill_dir: PathBuf,
}

impl IntentMaterializer {
    pub fn new(store: Arc<UnknownUtteranceStore>, skill_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            skill_dir: skill_dir.into(),
        }
    }

    pub fn skill_dir(&self) -> &Path {
        &self.skill_dir
    }

    /// `<skill_dir>/vocab/<lang>/<stem>.intent`
    pub fn intent_path(&self, lang: &str, utterance: &str) -> Result<PathBuf> {
        let lang = validate_lang(lang)?;
        let file = format!("{}.intent", file_stem(utterance));
        Ok(self.skill_dir.join("vocab").join(lang).join(file))
    }

    /// `<skill_dir>/dialog/<lang>/<stem>.dialog`
    pub fn dialog_path(&self, lang: &str, utterance: &str) -> Result<PathBuf> {
        let lang = validate_lang(lang)?;
        let file = format!("{}.dialog", file_stem(utterance));
        Ok(self.skill_dir.join("dialog").join(lang).join(file))
    }

    /// Materialize every answered utterance of `lang`
    pub fn materialize(&self, host: &dyn SkillHost, lang: &str) -> Result<MaterializeReport> {
        let lang = validate_lang(lang)?;
        let lang = lang.as_str();
        // Work from a copy so concurrent inserts cannot change answers mid-write
        let partition = self.store.partition(lang);
        let mut report = MaterializeReport::default();

        for (utterance, answers) in &partition {
            if answers.is_empty() {
                debug!("Skipping '{}': no answers yet", utterance);
                report.skipped += 1;
                continue;
            }

            let stem = file_stem(utterance);

            let intent_path = self.intent_path(lang, utterance)?;
            write_file(&intent_path, utterance)?;

            let dialog_path = self.dialog_path(lang, utterance)?;
            write_file(&dialog_path, &answers.join("\n"))?;

            let intent = LearnedIntent {
                utterance_key: utterance.clone(),
                answer_key: stem.clone(),
            };
            host.register_intent_file(&format!("{}.intent", stem), &intent)?;

            debug!(
                "Materialized '{}' with {} answer(s) at {}",
                utterance,
                answers.len(),
                intent_path.display()
            );
            report.materialized.push(intent);
        }

        info!(
            "Materialized {} learned intent(s) for {} ({} pending)",
            report.materialized.len(),
            lang,
            report.skipped
        );
        Ok(report)
    }
}

/// File-name-safe form of an utterance
///
/// An utterance that is already a safe, short file name is used as is.
/// Otherwise reserved and control characters become `_`, leading dots and
/// surrounding whitespace are dropped, the result is cut to
/// [`MAX_STEM_BYTES`] on a char boundary, and `-<digest>` of the full
/// utterance is appended. Nothing usable left gives `utterance-<digest>`.
pub fn file_stem(utterance: &str) -> String {
    let replaced: String = utterance
        .chars()
        .map(|c| if RESERVED.contains(&c) || c.is_control() { '_' } else { c })
        .collect();
    let cleaned = replaced.trim().trim_start_matches('.').trim();

    if cleaned.chars().all(|c| c == '_') {
        return format!("utterance-{}", digest(utterance));
    }
    if cleaned == utterance && cleaned.len() <= MAX_STEM_BYTES {
        return cleaned.to_string();
    }

    let mut end = cleaned.len().min(MAX_STEM_BYTES);
    while !cleaned.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}-{}", cleaned[..end].trim_end(), digest(utterance))
}

fn digest(utterance: &str) -> String {
    let hash = Sha256::digest(utterance.as_bytes());
    let mut hex = hex::encode(hash);
    hex.truncate(DIGEST_LEN);
    hex
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| LearnError::io(parent, e))?;
    }
    std::fs::write(path, content).map_err(|e| LearnError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MockSkillHost;
    use crate::settings::MemorySettings;

    fn store() -> Arc<UnknownUtteranceStore> {
        Arc::new(UnknownUtteranceStore::load(Arc::new(MemorySettings::new()), "en-us").unwrap())
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("what time is sunset"), "what time is sunset");

        let slashed = file_stem("is 1/2 a half");
        assert!(slashed.starts_with("is 1_2 a half-"), "got {}", slashed);
        assert_eq!(slashed.len(), "is 1_2 a half-".len() + DIGEST_LEN);

        assert!(file_stem("..hidden").starts_with("hidden-"));
        assert!(file_stem(" ../ ").starts_with("utterance-"));
        assert!(file_stem("").starts_with("utterance-"));
        assert_eq!(file_stem("is 1/2 a half"), slashed);
    }

    #[test]
    fn test_file_stem_distinguishes_lookalikes() {
        assert_ne!(file_stem("a/b"), file_stem("a_b"));
        assert_ne!(file_stem("..x"), file_stem("x"));
        assert_ne!(file_stem("???"), file_stem("***"));
    }

    #[test]
    fn test_file_stem_bounded_length() {
        let long = "please tell me ".repeat(20);
        let other = format!("{}again", long);
        let stem = file_stem(&long);

        assert!(stem.len() <= MAX_STEM_BYTES + 1 + DIGEST_LEN, "{} bytes", stem.len());
        assert!(stem.starts_with("please tell me"));
        assert_ne!(stem, file_stem(&other));

        // Multi-byte characters are never split
        let accented = "é".repeat(150);
        let stem = file_stem(&accented);
        assert!(stem.len() <= MAX_STEM_BYTES + 1 + DIGEST_LEN);
        assert!(stem.trim_end_matches(|c: char| c.is_ascii_hexdigit()).ends_with("é-"));
    }

    #[test]
    fn test_materialize_writes_files_and_registers() {
        let dir = tempfile::tempdir().unwrap();
        let store = store();
        store
            .add_utterances("what time is sunset", Some("sunset is at seven".into()), None)
            .unwrap();

        let mut host = MockSkillHost::new();
        host.expect_register_intent_file()
            .withf(|filename, intent| {
                filename == "what time is sunset.intent"
                    && intent.utterance_key == "what time is sunset"
                    && intent.answer_key == "what time is sunset"
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let materializer = IntentMaterializer::new(store, dir.path());
        let report = materializer.materialize(&host, "en-us").unwrap();

        assert_eq!(report.materialized.len(), 1);
        assert_eq!(report.skipped, 0);
        let intent_path = dir.path().join("vocab/en-us/what time is sunset.intent");
        let dialog_path = dir.path().join("dialog/en-us/what time is sunset.dialog");
        let intent = std::fs::read_to_string(intent_path).unwrap();
        let dialog = std::fs::read_to_string(dialog_path).unwrap();
        assert_eq!(intent, "what time is sunset");
        assert_eq!(dialog, "sunset is at seven");
    }

    #[test]
    fn test_unanswered_utterances_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let store = store();
        store.add_utterances(vec!["no answer", "also nothing"], None, None).unwrap();

        let mut host = MockSkillHost::new();
        host.expect_register_intent_file().never();

        let report = IntentMaterializer::new(store, dir.path())
            .materialize(&host, "en-us")
            .unwrap();
        assert!(report.materialized.is_empty());
        assert_eq!(report.skipped, 2);
        assert!(!dir.path().join("vocab").exists());
        assert!(!dir.path().join("dialog").exists());
    }

    #[test]
    fn test_registration_failure_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let store = store();
        store.add_utterances("hello", Some("hi".into()), None).unwrap();

        let mut host = MockSkillHost::new();
        host.expect_register_intent_file()
            .returning(|_, _| Err(LearnError::Settings("matcher offline".to_string())));

        let err = IntentMaterializer::new(store, dir.path())
            .materialize(&host, "en-us")
            .unwrap_err();
        assert!(matches!(err, LearnError::Settings(_)));
        // Files written before the failure stay
        assert!(dir.path().join("vocab/en-us/hello.intent").exists());
    }

    #[test]
    fn test_long_and_lookalike_utterances_materialize() {
        let dir = tempfile::tempdir().unwrap();
        let store = store();
        let long = "please tell me the time ".repeat(13).trim_end().to_string();
        assert!(long.len() > 300);
        store.add_utterances(long.clone(), Some("sure".into()), None).unwrap();
        store.add_utterances(vec!["a/b", "a_b"], Some("split".into()), None).unwrap();
        store.add_utterances("hello robot", Some("hi human".into()), None).unwrap();

        let mut host = MockSkillHost::new();
        host.expect_register_intent_file().times(4).returning(|_, _| Ok(()));

        let materializer = IntentMaterializer::new(store, dir.path());
        let report = materializer.materialize(&host, "en-us").unwrap();
        assert_eq!(report.materialized.len(), 4);

        let mut keys: Vec<&str> =
            report.materialized.iter().map(|i| i.answer_key.as_str()).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), 4);

        let long_intent = materializer.intent_path("en-us", &long).unwrap();
        assert_eq!(std::fs::read_to_string(long_intent).unwrap(), long);
        for utterance in ["a/b", "a_b"] {
            let intent = materializer.intent_path("en-us", utterance).unwrap();
            assert_eq!(std::fs::read_to_string(intent).unwrap(), utterance);
        }
        assert!(dir.path().join("vocab/en-us/hello robot.intent").exists());
    }

    #[test]
    fn test_path_like_language_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let materializer = IntentMaterializer::new(store(), dir.path().join("skill"));

        let host = MockSkillHost::new();
        assert!(materializer.materialize(&host, "../outside").is_err());
        assert!(materializer.intent_path("/tmp", "hello").is_err());
        assert!(!dir.path().join("outside").exists());
    }

    #[test]
    fn test_write_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        // A file where the vocab directory should go
        std::fs::write(dir.path().join("vocab"), "not a directory").unwrap();

        let store = store();
        store.add_utterances("hello", Some("hi".into()), None).unwrap();

        let host = MockSkillHost::new();
        let err = IntentMaterializer::new(store, dir.path())
            .materialize(&host, "en-us")
            .unwrap_err();
        assert!(matches!(err, LearnError::Io { .. }));
    }
}
