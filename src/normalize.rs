//! Utterance normalization
//!
//! Utterances are keyed by their normalized text, so "What's the time?" and
//! "what is the time" land on the same entry.

use once_cell::sync::Lazy;
use regex::Regex;

/// Language-aware text normalization used before storing utterances
pub trait Normalizer: Send + Sync {
    fn normalize(&self, text: &str, lang: &str) -> String;
}

/// Anything that is not a letter, digit, whitespace or apostrophe
static PUNCTUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\p{L}\p{N}\s']").expect("static regex"));

/// English contractions and their expansions
const EN_CONTRACTIONS: &[(&str, &str)] = &[
    ("ain't", "is not"),
    ("aren't", "are not"),
    ("can't", "can not"),
    ("could've", "could have"),
    ("couldn't", "could not"),
    ("didn't", "did not"),
    ("doesn't", "does not"),
    ("don't", "do not"),
    ("gonna", "going to"),
    ("gotta", "got to"),
    ("hadn't", "had not"),
    ("hasn't", "has not"),
    ("haven't", "have not"),
    ("he'd", "he would"),
    ("he'll", "he will"),
    ("he's", "he is"),
    ("how'd", "how did"),
    ("how'll", "how will"),
    ("how's", "how is"),
    ("i'd", "i would"),
    ("i'll", "i will"),
    ("i'm", "i am"),
    ("i've", "i have"),
    ("isn't", "is not"),
    ("it'd", "it would"),
    ("it'll", "it will"),
    ("it's", "it is"),
    ("let's", "let us"),
    ("mightn't", "might not"),
    ("might've", "might have"),
    ("mustn't", "must not"),
    ("must've", "must have"),
    ("needn't", "need not"),
    ("shan't", "shall not"),
    ("she'd", "she would"),
    ("she'll", "she will"),
    ("she's", "she is"),
    ("should've", "should have"),
    ("shouldn't", "should not"),
    ("that'll", "that will"),
    ("that's", "that is"),
    ("there's", "there is"),
    ("they'd", "they would"),
    ("they'll", "they will"),
    ("they're", "they are"),
    ("they've", "they have"),
    ("wanna", "want to"),
    ("wasn't", "was not"),
    ("we'd", "we would"),
    ("we'll", "we will"),
    ("we're", "we are"),
    ("we've", "we have"),
    ("weren't", "were not"),
    ("what'd", "what did"),
    ("what'll", "what will"),
    ("what're", "what are"),
    ("what's", "what is"),
    ("what've", "what have"),
    ("when's", "when is"),
    ("where'd", "where did"),
    ("where's", "where is"),
    ("who'd", "who would"),
    ("who'll", "who will"),
    ("who's", "who is"),
    ("why's", "why is"),
    ("won't", "will not"),
    ("would've", "would have"),
    ("wouldn't", "would not"),
    ("y'all", "you all"),
    ("you'd", "you would"),
    ("you'll", "you will"),
    ("you're", "you are"),
    ("you've", "you have"),
];

const EN_ARTICLES: &[&str] = &["a", "an", "the"];

const EN_NUMBERS: &[(&str, &str)] = &[
    ("zero", "0"),
    ("one", "1"),
    ("two", "2"),
    ("three", "3"),
    ("four", "4"),
    ("five", "5"),
    ("six", "6"),
    ("seven", "7"),
    ("eight", "8"),
    ("nine", "9"),
    ("ten", "10"),
    ("eleven", "11"),
    ("twelve", "12"),
    ("thirteen", "13"),
    ("fourteen", "14"),
    ("fifteen", "15"),
    ("sixteen", "16"),
    ("seventeen", "17"),
    ("eighteen", "18"),
    ("nineteen", "19"),
    ("twenty", "20"),
];

/// Default normalizer
///
/// Every language gets case folding, punctuation removal and whitespace
/// collapsing. English additionally expands contractions, drops articles and
/// turns small number words into digits.
#[derive(Debug, Clone)]
pub struct TextNormalizer {
    remove_articles: bool,
    numbers_to_digits: bool,
}

impl TextNormalizer {
    pub fn new() -> Self {
        Self {
            remove_articles: true,
            numbers_to_digits: true,
        }
    }

    /// Keep "a", "an" and "the"
    pub fn keep_articles(mut self) -> Self {
        self.remove_articles = false;
        self
    }

    /// Leave number words spelled out
    pub fn keep_number_words(mut self) -> Self {
        self.numbers_to_digits = false;
        self
    }

    fn normalize_en_word<'a>(&self, word: &'a str, out: &mut Vec<&'a str>) {
        if let Some(&(_, expansion)) = EN_CONTRACTIONS.iter().find(|(c, _)| *c == word) {
            out.extend(expansion.split(' '));
            return;
        }

        let word = word.trim_matches('\'');
        if word.is_empty() {
            return;
        }
        if self.remove_articles && EN_ARTICLES.contains(&word) {
            return;
        }
        if self.numbers_to_digits {
            if let Some(&(_, digits)) = EN_NUMBERS.iter().find(|(n, _)| *n == word) {
                out.push(digits);
                return;
            }
        }
        out.push(word);
    }
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer for TextNormalizer {
    fn normalize(&self, text: &str, lang: &str) -> String {
        let folded = text.to_lowercase().replace(['\u{2019}', '\u{2018}'], "'");
        let cleaned = PUNCTUATION.replace_all(&folded, " ");
        let english = lang.to_lowercase().starts_with("en");

        let mut words: Vec<&str> = Vec::new();
        for word in cleaned.split_whitespace() {
            if english {
                self.normalize_en_word(word, &mut words);
            } else {
                let word = word.trim_matches('\'');
                if !word.is_empty() {
                    words.push(word);
                }
            }
        }

        words.join(" ")
    }
}
