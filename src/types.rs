//! Shared types used across modules
//!
//! This module contains types that are used by multiple modules
//! to avoid circular dependencies.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Utterance → answers, for a single language
pub type Partition = BTreeMap<String, Vec<String>>;

/// Language code → partition. This is the `db` settings entry.
pub type UtteranceDb = BTreeMap<String, Partition>;

/// A message delivered by the host when no intent matched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Raw utterance as transcribed
    pub utterance: String,
    /// Language tag, if the host knows it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
}

impl Message {
    pub fn new(utterance: impl Into<String>) -> Self {
        Self {
            utterance: utterance.into(),
            lang: None,
        }
    }

    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }
}

/// Whether a fallback handler consumed the message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackOutcome {
    /// Stop the fallback chain here
    Consumed,
    /// Let lower-priority fallbacks see the message too
    NotConsumed,
}

impl FallbackOutcome {
    pub fn is_consumed(&self) -> bool {
        matches!(self, FallbackOutcome::Consumed)
    }
}

impl std::fmt::Display for FallbackOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FallbackOutcome::Consumed => write!(f, "consumed"),
            FallbackOutcome::NotConsumed => write!(f, "not consumed"),
        }
    }
}

/// One value or a list of values, normalized with [`OneOrMany::into_vec`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    /// Flatten into a sequence; a single value becomes a one-element list
    pub fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            OneOrMany::One(_) => false,
            OneOrMany::Many(values) => values.is_empty(),
        }
    }
}

impl From<String> for OneOrMany {
    fn from(value: String) -> Self {
        OneOrMany::One(value)
    }
}

impl From<&str> for OneOrMany {
    fn from(value: &str) -> Self {
        OneOrMany::One(value.to_string())
    }
}

impl From<&String> for OneOrMany {
    fn from(value: &String) -> Self {
        OneOrMany::One(value.clone())
    }
}

impl From<Vec<String>> for OneOrMany {
    fn from(values: Vec<String>) -> Self {
        OneOrMany::Many(values)
    }
}

impl From<Vec<&str>> for OneOrMany {
    fn from(values: Vec<&str>) -> Self {
        OneOrMany::Many(values.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for OneOrMany {
    fn from(values: &[&str]) -> Self {
        OneOrMany::Many(values.iter().map(|s| s.to_string()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_or_many_into_vec() {
        assert_eq!(OneOrMany::from("hello").into_vec(), vec!["hello".to_string()]);
        assert_eq!(
            OneOrMany::from(vec!["a", "b"]).into_vec(),
            vec!["a".to_string(), "b".to_string()]
        );
        assert!(OneOrMany::from(Vec::<String>::new()).is_empty());
        assert!(!OneOrMany::from("").is_empty());
    }

    #[test]
    fn test_message_deserialize_without_lang() {
        let msg: Message = serde_json::from_str(r#"{"utterance": "what is love"}"#).unwrap();
        assert_eq!(msg, Message::new("what is love"));
        assert!(msg.lang.is_none());
    }

    #[test]
    fn test_fallback_outcome_display() {
        assert_eq!(FallbackOutcome::NotConsumed.to_string(), "not consumed");
        assert!(FallbackOutcome::Consumed.is_consumed());
    }
}
