//! Text collaborators: document normalization and lemmatization.
//!
//! The index and the query lexer only ever see these through the
//! [`Normalizer`] and [`Lemmatizer`] traits.

use std::collections::HashMap;

use lazy_static::lazy_static;
use parking_lot::RwLock;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref DIGIT_GAP: Regex = Regex::new(r"(\d)\s+(\d)").expect("valid regex");
}

pub trait Normalizer: Send + Sync {
    /// Splits raw document text into normalized surface tokens.
    fn normalize(&self, text: &str) -> Vec<String>;
}

pub trait Lemmatizer: Send + Sync {
    /// Reduces a surface token to its canonical form.
    fn lemmatize(&self, token: &str) -> String;
}

/// NFKC, digit-group joining ("10 000" → "10000"), punctuation stripping,
/// lower-casing and whitespace splitting.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextNormalizer;

impl TextNormalizer {
    pub fn join_numbers(text: &str) -> String {
        let mut joined = text.to_string();
        loop {
            let next = DIGIT_GAP.replace_all(&joined, "${1}${2}").into_owned();
            if next == joined {
                return joined;
            }
            joined = next;
        }
    }

    pub fn strip_punctuation(text: &str) -> String {
        text.chars()
            .map(|c| if c.is_ascii_punctuation() || c == '«' || c == '»' { ' ' } else { c })
            .collect()
    }
}

impl Normalizer for TextNormalizer {
    fn normalize(&self, text: &str) -> Vec<String> {
        let text = text.nfkc().collect::<String>();
        let text = Self::strip_punctuation(&Self::join_numbers(&text)).to_lowercase();
        text.split_whitespace().map(str::to_string).collect()
    }
}

/// Leaves tokens untouched. Useful for pre-lemmatized corpora and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityLemmatizer;

impl Lemmatizer for IdentityLemmatizer {
    fn lemmatize(&self, token: &str) -> String {
        token.to_string()
    }
}

/// Snowball stemmer with a memo of every token it has already reduced.
pub struct StemLemmatizer {
    stemmer: Stemmer,
    cache: RwLock<HashMap<String, String>>,
}

impl StemLemmatizer {
    pub fn new(algorithm: Algorithm) -> Self {
        StemLemmatizer { stemmer: Stemmer::create(algorithm), cache: RwLock::new(HashMap::new()) }
    }

    pub fn english() -> Self {
        Self::new(Algorithm::English)
    }

    /// Builds a stemmer from a language name such as `english` or `russian`.
    pub fn for_language(language: &str) -> Option<Self> {
        algorithm_for(language).map(Self::new)
    }

    pub fn cached(&self) -> usize {
        self.cache.read().len()
    }
}

impl Default for StemLemmatizer {
    fn default() -> Self {
        Self::english()
    }
}

impl Lemmatizer for StemLemmatizer {
    /// Stems the lower-cased token; the Snowball rules expect lower case.
    fn lemmatize(&self, token: &str) -> String {
        if let Some(lemma) = self.cache.read().get(token) {
            return lemma.clone();
        }
        let lemma = self.stemmer.stem(&token.to_lowercase()).into_owned();
        self.cache.write().insert(token.to_string(), lemma.clone());
        lemma
    }
}

/// Picks the lemmatizer for a language name. `none` disables stemming.
pub fn lemmatizer_for(language: &str) -> Option<Box<dyn Lemmatizer>> {
    if language.eq_ignore_ascii_case("none") {
        return Some(Box::new(IdentityLemmatizer));
    }
    StemLemmatizer::for_language(language).map(|l| Box::new(l) as Box<dyn Lemmatizer>)
}

pub fn algorithm_for(language: &str) -> Option<Algorithm> {
    let algorithm = match language.to_ascii_lowercase().as_str() {
        "danish" => Algorithm::Danish,
        "dutch" => Algorithm::Dutch,
        "english" => Algorithm::English,
        "finnish" => Algorithm::Finnish,
        "french" => Algorithm::French,
        "german" => Algorithm::German,
        "hungarian" => Algorithm::Hungarian,
        "italian" => Algorithm::Italian,
        "norwegian" => Algorithm::Norwegian,
        "portuguese" => Algorithm::Portuguese,
        "romanian" => Algorithm::Romanian,
        "russian" => Algorithm::Russian,
        "spanish" => Algorithm::Spanish,
        "swedish" => Algorithm::Swedish,
        "turkish" => Algorithm::Turkish,
        _ => return None,
    };
    Some(algorithm)
}
