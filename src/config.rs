//! Configuration management
//!
//! Manages skill placement (language, skill directory, settings file) and
//! learning behavior (answer threshold, fallback priority).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::learning::{ANSWER_THRESHOLD, FALLBACK_PRIORITY};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Where the skill lives and which language it speaks
    #[serde(default)]
    pub skill: SkillConfig,
    /// Learning loop tuning
    #[serde(default)]
    pub learning: LearningConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillConfig {
    /// Default language code
    #[serde(default = "default_lang")]
    pub lang: String,
    /// Skill directory holding vocab/, dialog/ and the settings file
    #[serde(default = "default_skill_dir")]
    pub skill_dir: PathBuf,
    /// Settings file name, relative to `skill_dir`
    #[serde(default = "default_settings_file")]
    pub settings_file: String,
}

fn default_lang() -> String {
    "en-us".to_string()
}

fn default_skill_dir() -> PathBuf {
    data_dir().unwrap_or_else(|_| PathBuf::from("."))
}

fn default_settings_file() -> String {
    "settings.json".to_string()
}

impl Default for SkillConfig {
    fn default() -> Self {
        Self {
            lang: default_lang(),
            skill_dir: default_skill_dir(),
            settings_file: default_settings_file(),
        }
    }
}

impl SkillConfig {
    /// Full path of the settings file
    pub fn settings_path(&self) -> PathBuf {
        self.skill_dir.join(&self.settings_file)
    }

    /// Directory holding `<lang>/<key>.dialog` files
    pub fn dialog_dir(&self) -> PathBuf {
        self.skill_dir.join("dialog")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningConfig {
    /// Utterances with fewer answers than this are asked about
    #[serde(default = "default_answer_threshold")]
    pub answer_threshold: usize,
    /// Fallback priority (lower runs earlier)
    #[serde(default = "default_fallback_priority")]
    pub fallback_priority: i32,
}

fn default_answer_threshold() -> usize {
    ANSWER_THRESHOLD
}

fn default_fallback_priority() -> i32 {
    FALLBACK_PRIORITY
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            answer_threshold: default_answer_threshold(),
            fallback_priority: default_fallback_priority(),
        }
    }
}

impl Config {
    /// Load configuration from a specific file, creating it if absent
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            let config: Config = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        let parent = path.parent()
            .context("Config path has no parent")?;

        std::fs::create_dir_all(parent)
            .context("Failed to create config directory")?;

        let contents = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        std::fs::write(path, contents)
            .context("Failed to write config file")?;

        Ok(())
    }
}

/// Get the configuration file path
pub fn config_path() -> Result<PathBuf> {
    let base = directories::ProjectDirs::from("com", "learn-unknown", "learn-unknown")
        .context("Failed to get project directories")?;
    Ok(base.config_dir().join("config.toml"))
}

/// Get the data directory path
pub fn data_dir() -> Result<PathBuf> {
    let base = directories::ProjectDirs::from("com", "learn-unknown", "learn-unknown")
        .context("Failed to get project directories")?;
    Ok(base.data_dir().to_path_buf())
}
