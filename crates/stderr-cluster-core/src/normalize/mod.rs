//! Text normalization for failure messages.
//!
//! Turns a raw stderr message into a space-joined sequence of canonical
//! tokens:
//!
//! ```text
//! raw text ─> lowercase ─> tokenize ─> keep alphabetic ─> drop stop words
//!          ─> lemmatize ─> drop stop words ─> join(" ")
//! ```
//!
//! Tokenization is Treebank-like: text is split on whitespace, brackets,
//! quotes and clause punctuation, and surrounding periods are stripped.
//! Anything still containing a non-alphabetic character (file paths, line
//! numbers, `snake_case` identifiers) is discarded, so two tracebacks that
//! differ only in their paths normalize to the same string.
//!
//! The stop-word set, lemma exceptions and tokenizer pattern are process-wide
//! read-only resources built once on first use (or eagerly via [`warm_up`]).
//!
//! # Example
//!
//! ```
//! use stderr_cluster_core::normalize::normalize;
//!
//! let text = r#"File "/app/run.py", line 12, in main
//! ValueError: The inputs were not valid sequences."#;
//! assert_eq!(normalize(text), "file line main valueerror input valid sequence");
//! assert_eq!(normalize("... 404 !!!"), "");
//! ```

mod lemmatizer;
mod stopwords;

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use regex::Regex;

use lemmatizer::{lemmatize, LEMMA_EXCEPTIONS};
use stopwords::ENGLISH_STOP_WORDS;

/// Shared NLP resources - built once, never mutated.
static NLP_RESOURCES: OnceLock<NlpResources> = OnceLock::new();

/// Read-only dictionaries used by the normalizer.
#[derive(Debug)]
pub struct NlpResources {
    token_pattern: Regex,
    stop_words: HashSet<&'static str>,
    lemma_exceptions: HashMap<&'static str, &'static str>,
}

impl NlpResources {
    fn new() -> Self {
        Self {
            // Runs of characters that are not whitespace, brackets, quotes or
            // clause punctuation. Periods stay inside tokens so paths and
            // dotted identifiers survive as one (non-alphabetic) token.
            token_pattern: Regex::new(r#"[^\s()\[\]{}<>,;:!?"'`]+"#)
                .expect("token regex must compile"),
            stop_words: ENGLISH_STOP_WORDS.iter().copied().collect(),
            lemma_exceptions: LEMMA_EXCEPTIONS.iter().copied().collect(),
        }
    }

    /// Whether `token` is in the stop-word set.
    #[inline]
    pub fn is_stop_word(&self, token: &str) -> bool {
        self.stop_words.contains(token)
    }

    /// Number of stop words loaded.
    pub fn stop_word_count(&self) -> usize {
        self.stop_words.len()
    }
}

/// Get the process-wide NLP resources, building them on first call.
pub fn resources() -> &'static NlpResources {
    NLP_RESOURCES.get_or_init(NlpResources::new)
}

/// Build the shared resources eagerly, typically at process startup.
pub fn warm_up() {
    let res = resources();
    tracing::debug!(
        stop_words = res.stop_word_count(),
        lemma_exceptions = res.lemma_exceptions.len(),
        "NLP resources ready"
    );
}

/// Split lowercased text into raw tokens (punctuation-trimmed, unfiltered).
fn raw_tokens<'a>(res: &'a NlpResources, lowered: &'a str) -> impl Iterator<Item = &'a str> + 'a {
    res.token_pattern
        .find_iter(lowered)
        .map(|m| m.as_str().trim_matches('.'))
        .filter(|t| !t.is_empty())
}

#[inline]
fn is_alphabetic_token(token: &str) -> bool {
    !token.is_empty() && token.chars().all(char::is_alphabetic)
}

/// Lowercase, tokenize and keep alphabetic non-stop-word tokens.
///
/// No lemmatization is applied. Used by metrics that look tokens up in a
/// vocabulary of surface forms.
pub fn content_tokens(raw_text: &str) -> Vec<String> {
    let res = resources();
    let lowered = raw_text.to_lowercase();
    raw_tokens(res, &lowered)
        .filter(|t| is_alphabetic_token(t) && !res.is_stop_word(t))
        .map(str::to_string)
        .collect()
}

/// Normalize a raw message into space-joined canonical tokens.
///
/// Deterministic and idempotent. Empty or punctuation-only input yields an
/// empty string.
pub fn normalize(raw_text: &str) -> String {
    let res = resources();
    let lowered = raw_text.to_lowercase();

    let lemmas: Vec<String> = raw_tokens(res, &lowered)
        .filter(|t| is_alphabetic_token(t) && !res.is_stop_word(t))
        .map(|t| lemmatize(t, &res.lemma_exceptions))
        .filter(|lemma| !res.is_stop_word(lemma))
        .collect();

    lemmas.join(" ")
}
