//! Dialog rendering from `.dialog` files
//!
//! A dialog file holds one phrasing per line. Rendering picks one line at
//! random and fills `{{name}}` placeholders from the parameters. Every line
//! of a file is a phrasing, since learned answers may start with `#`; only
//! the bundled templates carry `#` comments.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::learning::store::validate_lang;
use crate::random::{self, RandomSource, StdRandom};

/// Key of the template used to ask for an answer
pub const WHAT_ANSWER: &str = "what.answer";

/// Templates shipped with the crate, used when the skill directory has none
const BUNDLED: &[(&str, &str, &str)] = &[(
    "en-us",
    WHAT_ANSWER,
    include_str!("../dialog/en-us/what.answer.dialog"),
)];

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*([A-Za-z0-9_]+)\s*\}\}").expect("static regex"));

/// Renders dialogs from `<dialog_dir>/<lang>/<key>.dialog`
pub struct DialogRenderer {
    dialog_dir: PathBuf,
    lang: String,
    random: Arc<dyn RandomSource>,
}

impl DialogRenderer {
    pub fn new(dialog_dir: impl Into<PathBuf>, lang: &str) -> Self {
        Self::with_random(dialog_dir, lang, Arc::new(StdRandom::new()))
    }

    pub fn with_random(
        dialog_dir: impl Into<PathBuf>,
        lang: &str,
        random: Arc<dyn RandomSource>,
    ) -> Self {
        Self {
            dialog_dir: dialog_dir.into(),
            lang: lang.to_string(),
            random,
        }
    }

    /// Path of a dialog file for this renderer's language
    pub fn dialog_path(&self, key: &str) -> PathBuf {
        self.dialog_dir.join(&self.lang).join(format!("{}.dialog", key))
    }

    /// Phrasings available for `key`
    ///
    /// Reads the dialog file, then the bundled templates. Unreadable files are
    /// treated as missing, and so are files for a language code that is not a
    /// plain directory name.
    pub fn lines(&self, key: &str) -> Vec<String> {
        if validate_lang(&self.lang).is_ok() {
            let lines = read_lines(&self.dialog_path(key)).unwrap_or_default();
            if !lines.is_empty() {
                return lines;
            }
        } else {
            debug!("Not reading dialog files for language {:?}", self.lang);
        }

        BUNDLED
            .iter()
            .find(|(lang, name, _)| *lang == self.lang && *name == key)
            .map(|(_, _, content)| {
                split_lines(content)
                    .into_iter()
                    .filter(|line| !line.starts_with('#'))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Render one phrasing of `key`
    ///
    /// With no phrasings available the key itself is spoken, dots read as
    /// spaces, so a missing file is audible rather than silent.
    pub fn render(&self, key: &str, params: &HashMap<String, String>) -> String {
        let lines = self.lines(key);
        let template = match random::choose(self.random.as_ref(), &lines) {
            Some(line) => line.clone(),
            None => {
                debug!("No dialog for '{}' in {}, speaking the key", key, self.lang);
                key.replace('.', " ")
            }
        };
        fill(&template, params)
    }
}

fn read_lines(path: &Path) -> Option<Vec<String>> {
    std::fs::read_to_string(path).ok().map(|content| split_lines(&content))
}

fn split_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Replace `{{name}}` with `params[name]`; unknown names become empty
pub fn fill(template: &str, params: &HashMap<String, String>) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            params.get(&caps[1]).cloned().unwrap_or_default()
        })
        .into_owned()
}
