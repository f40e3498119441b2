//! Settings persistence for the utterance database
//!
//! The store keeps its data under the `db` key of the skill settings and asks
//! the backend to flush after every insertion batch. Other keys in the
//! settings document belong to the host and are left untouched.

use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

use crate::error::{LearnError, Result};
use crate::types::UtteranceDb;

/// Settings key holding the utterance database
pub const DB_KEY: &str = "db";

/// Backend that owns the persisted copy of the utterance database
pub trait SettingsBackend: Send + Sync {
    /// Read the stored database, `None` when nothing has been stored yet
    fn load(&self) -> Result<Option<UtteranceDb>>;

    /// Flush the database
    fn store(&self, db: &UtteranceDb) -> Result<()>;
}

/// `settings.json` file, shared with whatever else the host keeps there
pub struct JsonSettings {
    path: PathBuf,
}

impl JsonSettings {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the settings file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }

        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| LearnError::io(&self.path, e))?;
        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&content)? {
            Value::Object(map) => Ok(map),
            other => Err(LearnError::Settings(format!(
                "{} holds {} instead of an object",
                self.path.display(),
                json_kind(&other)
            ))),
        }
    }
}

impl SettingsBackend for JsonSettings {
    fn load(&self) -> Result<Option<UtteranceDb>> {
        let mut doc = self.read_document()?;
        match doc.remove(DB_KEY) {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    fn store(&self, db: &UtteranceDb) -> Result<()> {
        let mut doc = self.read_document()?;
        doc.insert(DB_KEY.to_string(), serde_json::to_value(db)?);

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| LearnError::io(parent, e))?;
        }
        let content = serde_json::to_string_pretty(&Value::Object(doc))?;
        std::fs::write(&self.path, content).map_err(|e| LearnError::io(&self.path, e))?;

        debug!("Stored settings to {}", self.path.display());
        Ok(())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// In-memory backend that counts flushes
#[derive(Default)]
pub struct MemorySettings {
    db: Mutex<Option<UtteranceDb>>,
    flushes: AtomicUsize,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an already-populated database
    pub fn with_db(db: UtteranceDb) -> Self {
        Self {
            db: Mutex::new(Some(db)),
            flushes: AtomicUsize::new(0),
        }
    }

    /// Number of times `store` has been called
    pub fn flush_count(&self) -> usize {
        self.flushes.load(Ordering::SeqCst)
    }

    /// Last flushed copy
    pub fn snapshot(&self) -> Option<UtteranceDb> {
        self.db.lock().ok().and_then(|db| db.clone())
    }
}

impl SettingsBackend for MemorySettings {
    fn load(&self) -> Result<Option<UtteranceDb>> {
        let db = self
            .db
            .lock()
            .map_err(|_| LearnError::Settings("settings lock poisoned".to_string()))?;
        Ok(db.clone())
    }

    fn store(&self, db: &UtteranceDb) -> Result<()> {
        let mut stored = self
            .db
            .lock()
            .map_err(|_| LearnError::Settings("settings lock poisoned".to_string()))?;
        *stored = Some(db.clone());
        self.flushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Partition;

    fn sample_db() -> UtteranceDb {
        let mut partition = Partition::new();
        partition.insert("what is love".to_string(), vec!["baby don't hurt me".to_string()]);
        let mut db = UtteranceDb::new();
        db.insert("en-us".to_string(), partition);
        db
    }

    #[test]
    fn test_json_settings_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let settings = JsonSettings::new(dir.path().join("settings.json"));
        assert!(settings.load().unwrap().is_none());
    }

    #[test]
    fn test_json_settings_round_trip_keeps_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"__mycroft_skill_firstrun": false}"#).unwrap();

        let settings = JsonSettings::new(&path);
        settings.store(&sample_db()).unwrap();

        assert_eq!(settings.load().unwrap(), Some(sample_db()));
        let raw: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["__mycroft_skill_firstrun"], Value::Bool(false));
        assert_eq!(raw["db"]["en-us"]["what is love"][0], "baby don't hurt me");
    }

    #[test]
    fn test_json_settings_rejects_non_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();

        let err = JsonSettings::new(&path).load().unwrap_err();
        assert!(matches!(err, LearnError::Settings(_)));
    }

    #[test]
    fn test_memory_settings_counts_flushes() {
        let settings = MemorySettings::new();
        assert!(settings.load().unwrap().is_none());

        settings.store(&sample_db()).unwrap();
        settings.store(&sample_db()).unwrap();

        assert_eq!(settings.flush_count(), 2);
        assert_eq!(settings.snapshot(), Some(sample_db()));
    }
}
